//! Request and response types shared by the HTTP handlers

pub mod chat;
pub mod error;
pub mod json;
pub mod models;
pub mod query;

pub use chat::{ChatCompletionRequest, ChatCompletionResponse};
pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::{Json, ValidatedJson};
pub use models::{ApiModel, ModelsResponse};
pub use query::Query;
