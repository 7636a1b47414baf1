//! Models endpoint handler

use axum::extract::State;

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiModel, Json, ModelsResponse};

/// GET /v1/models
pub async fn list_models(
    State(state): State<AppState>,
    RequireApiKey(_api_key): RequireApiKey,
) -> Json<ModelsResponse> {
    let models = state
        .gateway_service
        .models()
        .into_iter()
        .map(ApiModel::from)
        .collect();

    Json(ModelsResponse::new(models))
}
