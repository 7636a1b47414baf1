//! Gateway infrastructure - mock chat completions with usage accounting

mod service;

pub use service::{
    ChatCompletion, ChatCompletionRequest, ChatMessage, FinishReason, GatewayService,
    MAX_COMPLETION_TOKENS,
};
