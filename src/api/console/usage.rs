//! Usage reporting endpoints

use axum::extract::{Path, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::api_key::ApiKeyId;
use crate::domain::project::Permission;
use crate::domain::usage::{UsageQuery, UsageRecord, UsageSummary};

use super::ListResponse;

/// Query string of the usage listing
#[derive(Debug, Default, Deserialize)]
pub struct UsageParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub model_id: Option<String>,
    pub api_key_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl UsageParams {
    fn into_query(self) -> Result<UsageQuery, ApiError> {
        let api_key_id = self
            .api_key_id
            .as_deref()
            .map(ApiKeyId::parse)
            .transpose()
            .map_err(|e| ApiError::from(e).with_param("api_key_id"))?;

        Ok(UsageQuery {
            api_key_id,
            model_id: self.model_id.filter(|m| !m.is_empty()),
            from: self.from,
            to: self.to,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// GET /api/projects/{project_id}/usage
pub async fn list_usage(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    Query(params): Query<UsageParams>,
) -> Result<Json<ListResponse<UsageRecord>>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::UsageRead)
        .await?;

    let query = params.into_query()?;
    let records = state.usage_service.query(project.id(), &query).await?;

    Ok(Json(ListResponse::new(records)))
}

/// GET /api/projects/{project_id}/usage/summary
pub async fn get_summary(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<UsageSummary>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::UsageRead)
        .await?;

    let summary = state
        .usage_service
        .summary(project.id(), params.from, params.to)
        .await?;

    Ok(Json(summary))
}
