//! Project membership endpoints

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
use crate::domain::audit::{AuditAction, AuditLog};
use crate::domain::project::{ProjectId, ProjectMember, ProjectRole};
use crate::domain::user::{normalize_email, UserId};

use super::ListResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct AddMemberRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub role: ProjectRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub role: ProjectRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: ProjectRole,
    pub joined_at: DateTime<Utc>,
}

/// Attach the member's account details when the account still exists
async fn member_response(
    state: &AppState,
    member: &ProjectMember,
) -> Result<MemberResponse, ApiError> {
    let account = state.user_service.get(member.user_id()).await?;

    Ok(MemberResponse {
        user_id: member.user_id().as_str().to_string(),
        name: account.as_ref().map(|u| u.name().to_string()),
        email: account.as_ref().map(|u| u.email().to_string()),
        role: member.role(),
        joined_at: member.joined_at(),
    })
}

/// GET /api/projects/{project_id}/members
pub async fn list_members(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ListResponse<MemberResponse>>, ApiError> {
    let project_id = ProjectId::parse(&project_id)?;
    let members = state
        .project_service
        .list_members(&project_id, user.id())
        .await?;

    let mut data = Vec::with_capacity(members.len());
    for member in &members {
        data.push(member_response(&state, member).await?);
    }

    Ok(Json(ListResponse::new(data)))
}

/// POST /api/projects/{project_id}/members
pub async fn add_member(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    ValidatedJson(request): ValidatedJson<AddMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    let project_id = ProjectId::parse(&project_id)?;

    let member = state
        .project_service
        .add_member(
            &project_id,
            user.id(),
            &normalize_email(&request.email),
            request.role,
        )
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::MemberAdded,
                member.user_id().as_str(),
            )
            .with_project(project_id.clone())
            .with_metadata(serde_json::json!({ "role": member.role() })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(member_response(&state, &member).await?),
    ))
}

/// PATCH /api/projects/{project_id}/members/{user_id}
pub async fn update_member(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, member_id)): Path<(String, String)>,
    Json(request): Json<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, ApiError> {
    let project_id = ProjectId::parse(&project_id)?;
    let member_id = UserId::parse(&member_id)?;

    let member = state
        .project_service
        .update_member_role(&project_id, user.id(), &member_id, request.role)
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::MemberUpdated,
                member_id.as_str(),
            )
            .with_project(project_id.clone())
            .with_metadata(serde_json::json!({ "role": member.role() })),
        )
        .await;

    Ok(Json(member_response(&state, &member).await?))
}

/// DELETE /api/projects/{project_id}/members/{user_id}
pub async fn remove_member(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let project_id = ProjectId::parse(&project_id)?;
    let member_id = UserId::parse(&member_id)?;

    state
        .project_service
        .remove_member(&project_id, user.id(), &member_id)
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::MemberRemoved,
                member_id.as_str(),
            )
            .with_project(project_id.clone()),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
