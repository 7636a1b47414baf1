//! Chat completions endpoint handler

use tracing::debug;

use axum::extract::State;

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, Json};

/// POST /v1/chat/completions
pub async fn create_chat_completion(
    State(state): State<AppState>,
    RequireApiKey(api_key): RequireApiKey,
    Json(request): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, ApiError> {
    debug!(
        api_key_id = %api_key.id(),
        model = %request.model,
        messages = request.messages.len(),
        "Processing chat completion request"
    );

    if request.stream {
        return Err(ApiError::bad_request("Streaming responses are not supported").with_param("stream"));
    }

    let completion = state
        .gateway_service
        .complete(&api_key, request.into())
        .await?;

    Ok(Json(completion.into()))
}
