//! Audit log endpoints

use axum::extract::{Path, State};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, Query};
use crate::domain::audit::AuditLog;
use crate::domain::project::Permission;
use crate::infrastructure::audit::AuditPage;

use super::{ListResponse, PageParams};

impl From<PageParams> for AuditPage {
    fn from(params: PageParams) -> Self {
        Self {
            limit: params.limit,
            offset: params.offset,
        }
    }
}

/// GET /api/projects/{project_id}/audit-logs
pub async fn list_project_audit_logs(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<AuditLog>>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AuditRead)
        .await?;

    let entries = state
        .audit_service
        .list_for_project(project.id(), params.into())
        .await?;

    Ok(Json(ListResponse::new(entries)))
}

/// GET /api/users/me/audit-logs
pub async fn list_user_audit_logs(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Query(params): Query<PageParams>,
) -> Result<Json<ListResponse<AuditLog>>, ApiError> {
    let entries = state
        .audit_service
        .list_for_user(user.id(), params.into())
        .await?;

    Ok(Json(ListResponse::new(entries)))
}
