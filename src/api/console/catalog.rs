//! Read-only provider and model catalog endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::model::{Model, ModelProviderInfo, ProviderStatus};

use super::ListResponse;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderResponse {
    pub id: String,
    pub name: String,
    pub website: String,
    pub status: ProviderStatus,
    pub model_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelResponse {
    pub id: String,
    pub provider_id: String,
    pub name: String,
    pub context_window: u32,
    pub input_price_per_million_usd: f64,
    pub output_price_per_million_usd: f64,
    pub enabled: bool,
}

impl From<&Model> for ModelResponse {
    fn from(model: &Model) -> Self {
        Self {
            id: model.id().as_str().to_string(),
            provider_id: model.provider_id().as_str().to_string(),
            name: model.name().to_string(),
            context_window: model.context_window(),
            input_price_per_million_usd: model.input_price_per_million_usd(),
            output_price_per_million_usd: model.output_price_per_million_usd(),
            enabled: model.is_enabled(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelFilter {
    pub provider: Option<String>,
}

/// GET /api/providers
pub async fn list_providers(
    State(state): State<AppState>,
    _user: RequireUser,
) -> Json<ListResponse<ProviderResponse>> {
    let providers = state
        .catalog
        .providers()
        .iter()
        .map(|p: &ModelProviderInfo| ProviderResponse {
            id: p.id().as_str().to_string(),
            name: p.name().to_string(),
            website: p.website().to_string(),
            status: p.status(),
            model_count: state.catalog.models(Some(p.id().as_str())).len(),
        })
        .collect();

    Json(ListResponse::new(providers))
}

/// GET /api/models
pub async fn list_models(
    State(state): State<AppState>,
    _user: RequireUser,
    Query(filter): Query<ModelFilter>,
) -> Result<Json<ListResponse<ModelResponse>>, ApiError> {
    let provider = filter.provider.as_deref().filter(|p| !p.is_empty());

    if let Some(provider) = provider {
        if state.catalog.provider(provider).is_none() {
            return Err(ApiError::not_found(format!("Provider '{}' not found", provider)));
        }
    }

    let models = state
        .catalog
        .models(provider)
        .into_iter()
        .map(ModelResponse::from)
        .collect();

    Ok(Json(ListResponse::new(models)))
}

/// GET /api/models/{model_id}
pub async fn get_model(
    State(state): State<AppState>,
    _user: RequireUser,
    Path(model_id): Path<String>,
) -> Result<Json<ModelResponse>, ApiError> {
    state
        .catalog
        .model(&model_id)
        .map(|model| Json(ModelResponse::from(model)))
        .ok_or_else(|| ApiError::not_found(format!("Model '{}' not found", model_id)))
}
