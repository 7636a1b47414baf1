//! Project API key endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ValidatedJson};
use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyStatus};
use crate::domain::audit::{AuditAction, AuditLog};
use crate::domain::project::Permission;
use crate::infrastructure::api_key::CreateApiKeyRequest as CreateApiKey;

use super::ListResponse;

/// Request to create a new API key
#[derive(Debug, Deserialize, Validate)]
pub struct CreateApiKeyRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 365, message = "Expiry must be 1-365 days"))]
    pub expires_in_days: Option<u32>,
}

/// API key without its secret
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyResponse {
    pub id: String,
    pub name: String,
    pub project_id: String,
    pub key_prefix: String,
    pub status: ApiKeyStatus,
    pub created_by: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&ApiKey> for ApiKeyResponse {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id().as_str().to_string(),
            name: key.name().to_string(),
            project_id: key.project_id().as_str().to_string(),
            key_prefix: key.key_prefix().to_string(),
            status: key.status(),
            created_by: key.created_by().as_str().to_string(),
            expires_at: key.expires_at(),
            last_used_at: key.last_used_at(),
            revoked_at: key.revoked_at(),
            created_at: key.created_at(),
        }
    }
}

/// API key response with secret (only on creation)
#[derive(Debug, Clone, Serialize)]
pub struct ApiKeyWithSecretResponse {
    #[serde(flatten)]
    pub api_key: ApiKeyResponse,
    pub secret: String,
}

/// GET /api/projects/{project_id}/api-keys
pub async fn list_api_keys(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ListResponse<ApiKeyResponse>>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::ApiKeysRead)
        .await?;

    let keys = state.api_key_service.list(project.id()).await?;

    Ok(Json(ListResponse::new(
        keys.iter().map(ApiKeyResponse::from).collect(),
    )))
}

/// POST /api/projects/{project_id}/api-keys
pub async fn create_api_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateApiKeyRequest>,
) -> Result<(StatusCode, Json<ApiKeyWithSecretResponse>), ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::ApiKeysCreate)
        .await?;

    let created = state
        .api_key_service
        .create(
            project.id(),
            CreateApiKey {
                name: request.name.trim().to_string(),
                expires_in_days: request.expires_in_days,
            },
            user.id(),
        )
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::ApiKeyCreated,
                created.api_key.id().as_str(),
            )
            .with_project(project.id().clone())
            .with_metadata(serde_json::json!({
                "name": created.api_key.name(),
                "key_prefix": created.api_key.key_prefix(),
            })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ApiKeyWithSecretResponse {
            api_key: ApiKeyResponse::from(&created.api_key),
            secret: created.secret,
        }),
    ))
}

/// GET /api/projects/{project_id}/api-keys/{key_id}
pub async fn get_api_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, key_id)): Path<(String, String)>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::ApiKeysRead)
        .await?;
    let key_id = ApiKeyId::parse(&key_id)?;

    let key = state.api_key_service.get(project.id(), &key_id).await?;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// POST /api/projects/{project_id}/api-keys/{key_id}/revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, key_id)): Path<(String, String)>,
) -> Result<Json<ApiKeyResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::ApiKeysRevoke)
        .await?;
    let key_id = ApiKeyId::parse(&key_id)?;

    let key = state.api_key_service.revoke(project.id(), &key_id).await?;

    state
        .audit_service
        .record(
            AuditLog::new(user.id().clone(), AuditAction::ApiKeyRevoked, key_id.as_str())
                .with_project(project.id().clone()),
        )
        .await;

    Ok(Json(ApiKeyResponse::from(&key)))
}

/// DELETE /api/projects/{project_id}/api-keys/{key_id}
pub async fn delete_api_key(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, key_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::ApiKeysRevoke)
        .await?;
    let key_id = ApiKeyId::parse(&key_id)?;

    state.api_key_service.delete(project.id(), &key_id).await?;

    state
        .audit_service
        .record(
            AuditLog::new(user.id().clone(), AuditAction::ApiKeyDeleted, key_id.as_str())
                .with_project(project.id().clone()),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
