//! OpenAI-compatible chat completion types

use serde::{Deserialize, Serialize};

use crate::infrastructure::gateway::{self, ChatCompletion, ChatMessage, FinishReason};

/// Chat completion request body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Accepted for compatibility; only `false` is served
    #[serde(default)]
    pub stream: bool,
}

impl From<ChatCompletionRequest> for gateway::ChatCompletionRequest {
    fn from(request: ChatCompletionRequest) -> Self {
        Self {
            model: request.model,
            messages: request.messages,
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChoice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

/// Chat completion response with the estimated request cost
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    pub usage: Usage,
    pub cost_usd: f64,
}

impl From<ChatCompletion> for ChatCompletionResponse {
    fn from(completion: ChatCompletion) -> Self {
        let estimate = completion.estimate;

        Self {
            id: completion.id,
            object: "chat.completion".to_string(),
            created: completion.created_at.timestamp(),
            model: completion.model,
            choices: vec![ChatCompletionChoice {
                index: 0,
                message: ChatMessage::new("assistant", completion.content),
                finish_reason: completion.finish_reason,
            }],
            usage: Usage {
                prompt_tokens: estimate.input_tokens,
                completion_tokens: estimate.output_tokens,
                total_tokens: estimate.total_tokens(),
            },
            cost_usd: estimate.total_cost_usd(),
        }
    }
}
