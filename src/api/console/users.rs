//! Current-user profile endpoints

use axum::extract::State;
use serde::Deserialize;
use validator::Validate;

use crate::api::auth::{MessageResponse, UserResponse};
use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ValidatedJson};
use crate::domain::audit::{AuditAction, AuditLog};
use crate::infrastructure::user::UpdatePasswordRequest;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

/// PATCH /api/users/me
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state
        .user_service
        .update_profile(user.id(), request.name.trim())
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(user.id().clone(), AuditAction::UserUpdated, user.id().as_str())
                .with_metadata(serde_json::json!({ "name": updated.name() })),
        )
        .await;

    Ok(Json(UserResponse::from(&updated)))
}

/// POST /api/users/me/password
pub async fn change_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .change_password(
            user.id(),
            UpdatePasswordRequest {
                current_password: request.current_password,
                new_password: request.new_password,
            },
        )
        .await?;

    state
        .audit_service
        .record(AuditLog::new(
            user.id().clone(),
            AuditAction::UserPasswordChanged,
            user.id().as_str(),
        ))
        .await;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
