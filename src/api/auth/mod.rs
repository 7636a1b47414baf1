//! Account and session endpoints
//!
//! Registration with e-mail verification, login issuing a JWT and the
//! current-user lookup. Logout is client-side since tokens are stateless.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ValidatedJson};
use crate::domain::audit::{AuditAction, AuditLog};
use crate::domain::user::{normalize_email, User};
use crate::infrastructure::user::RegisterUserRequest;

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify", post(verify))
        .route("/resend-code", post(resend_code))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(get_current_user))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Verification code is required"))]
    pub code: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResendCodeRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Account as exposed to clients; never carries the hash or pending code
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub status: String,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().as_str().to_string(),
            name: user.name().to_string(),
            email: user.email().to_string(),
            status: format!("{:?}", user.status()).to_lowercase(),
            email_verified: user.is_verified(),
            created_at: user.created_at(),
            last_login_at: user.last_login_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user = state
        .user_service
        .register(RegisterUserRequest {
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            password: request.password,
        })
        .await?;

    state
        .audit_service
        .record(AuditLog::new(
            user.id().clone(),
            AuditAction::UserRegistered,
            user.id().as_str(),
        ))
        .await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(&user),
            message: "Verification code sent to your email address".to_string(),
        }),
    ))
}

/// POST /auth/verify
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerifyRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .user_service
        .verify(&normalize_email(&request.email), &request.code)
        .await?;

    state
        .audit_service
        .record(AuditLog::new(
            user.id().clone(),
            AuditAction::UserVerified,
            user.id().as_str(),
        ))
        .await;

    Ok(Json(UserResponse::from(&user)))
}

/// POST /auth/resend-code
pub async fn resend_code(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<ResendCodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .user_service
        .resend_code(&normalize_email(&request.email))
        .await?;

    Ok(Json(MessageResponse {
        message: "A new verification code has been sent".to_string(),
    }))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(&normalize_email(&request.email), &request.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let issued = state.jwt_service.generate(&user)?;

    state
        .audit_service
        .record(AuditLog::new(
            user.id().clone(),
            AuditAction::UserLogin,
            user.id().as_str(),
        ))
        .await;

    Ok(Json(LoginResponse {
        token: issued.token,
        user: UserResponse::from(&user),
        expires_at: issued.expires_at,
    }))
}

/// POST /auth/logout
pub async fn logout(_user: RequireUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// GET /auth/me
pub async fn get_current_user(RequireUser(user): RequireUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
