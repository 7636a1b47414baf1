//! Project endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ValidatedJson};
use crate::domain::audit::{AuditAction, AuditLog};
use crate::domain::project::{Permission, Project, ProjectId, ProjectRole};
use crate::domain::user::UserId;
use crate::infrastructure::project::{
    CreateProjectRequest as CreateProject, ProjectPermissions,
    UpdateProjectRequest as UpdateProject,
};

use super::ListResponse;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

/// Project as seen by one of its members
#[derive(Debug, Clone, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: String,
    /// Caller's role in the project
    pub role: Option<ProjectRole>,
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    pub fn for_member(project: &Project, user_id: &UserId) -> Self {
        Self {
            id: project.id().as_str().to_string(),
            name: project.name().to_string(),
            description: project.description().map(String::from),
            owner_id: project.owner_id().as_str().to_string(),
            role: project.role_of(user_id),
            member_count: project.members().len(),
            created_at: project.created_at(),
            updated_at: project.updated_at(),
        }
    }
}

/// GET /api/projects
pub async fn list_projects(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<ListResponse<ProjectResponse>>, ApiError> {
    let projects = state.project_service.list_for_user(user.id()).await?;

    let data = projects
        .iter()
        .map(|p| ProjectResponse::for_member(p, user.id()))
        .collect();

    Ok(Json(ListResponse::new(data)))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidatedJson(request): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    debug!(user_id = %user.id(), name = %request.name, "Creating project");

    let project = state
        .project_service
        .create(
            user.id(),
            CreateProject {
                name: request.name.trim().to_string(),
                description: request.description,
            },
        )
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::ProjectCreated,
                project.id().as_str(),
            )
            .with_project(project.id().clone())
            .with_metadata(serde_json::json!({ "name": project.name() })),
        )
        .await;

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::for_member(&project, user.id())),
    ))
}

/// GET /api/projects/{project_id}
pub async fn get_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::ProjectRead)
        .await?;

    Ok(Json(ProjectResponse::for_member(&project, user.id())))
}

/// PATCH /api/projects/{project_id}
pub async fn update_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let project_id = ProjectId::parse(&project_id)?;

    let project = state
        .project_service
        .update(
            &project_id,
            user.id(),
            UpdateProject {
                name: request.name.map(|n| n.trim().to_string()),
                description: request.description,
            },
        )
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::ProjectUpdated,
                project.id().as_str(),
            )
            .with_project(project.id().clone()),
        )
        .await;

    Ok(Json(ProjectResponse::for_member(&project, user.id())))
}

/// DELETE /api/projects/{project_id}
pub async fn delete_project(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let project_id = ProjectId::parse(&project_id)?;

    state.project_service.delete(&project_id, user.id()).await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::ProjectDeleted,
                project_id.as_str(),
            )
            .with_project(project_id.clone()),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{project_id}/permissions
pub async fn get_permissions(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectPermissions>, ApiError> {
    let project_id = ProjectId::parse(&project_id)?;
    let permissions = state
        .project_service
        .permissions(&project_id, user.id())
        .await?;

    Ok(Json(permissions))
}
