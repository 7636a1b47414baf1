//! Alert and cost alert endpoints

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
use crate::domain::alert::{
    Alert, AlertId, AlertMetric, AlertWindow, CostAlert, CostAlertId, CostAlertPeriod,
    NotificationChannels,
};
use crate::domain::audit::{AuditAction, AuditLog};
use crate::domain::project::{Permission, Project};
use crate::domain::user::User;
use crate::infrastructure::alert::{
    ChannelsRequest, CreateAlertRequest as CreateAlert,
    CreateCostAlertRequest as CreateCostAlert, UpdateAlertRequest as UpdateAlert,
    UpdateCostAlertRequest as UpdateCostAlert,
};

use super::ListResponse;

fn default_enabled() -> bool {
    true
}

/// Notification targets in request format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelsBody {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl From<ChannelsBody> for ChannelsRequest {
    fn from(body: ChannelsBody) -> Self {
        Self {
            emails: body.emails,
            webhook_url: body.webhook_url,
            webhook_secret: body.webhook_secret,
        }
    }
}

/// Notification targets; the webhook secret is never echoed back
#[derive(Debug, Clone, Serialize)]
pub struct ChannelsResponse {
    pub emails: Vec<String>,
    pub webhook_url: Option<String>,
    pub webhook_signed: bool,
}

impl From<&NotificationChannels> for ChannelsResponse {
    fn from(channels: &NotificationChannels) -> Self {
        Self {
            emails: channels.emails.clone(),
            webhook_url: channels.webhook_url.clone(),
            webhook_signed: channels.webhook_secret.is_some(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAlertRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub metric: AlertMetric,
    #[validate(range(min = 0.0, message = "Threshold must not be negative"))]
    pub threshold: f64,
    #[serde(default)]
    pub window: AlertWindow,
    #[serde(default)]
    pub channels: ChannelsBody,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAlertRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[serde(default)]
    pub metric: Option<AlertMetric>,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Threshold must not be negative"))]
    pub threshold: Option<f64>,
    #[serde(default)]
    pub window: Option<AlertWindow>,
    #[serde(default)]
    pub channels: Option<ChannelsBody>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCostAlertRequest {
    #[validate(range(exclusive_min = 0.0, message = "Threshold must be greater than zero"))]
    pub threshold_usd: f64,
    #[serde(default)]
    pub period: CostAlertPeriod,
    #[serde(default)]
    pub channels: ChannelsBody,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCostAlertRequest {
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "Threshold must be greater than zero"))]
    pub threshold_usd: Option<f64>,
    #[serde(default)]
    pub period: Option<CostAlertPeriod>,
    #[serde(default)]
    pub channels: Option<ChannelsBody>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertResponse {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub metric: AlertMetric,
    pub threshold: f64,
    pub window: AlertWindow,
    pub channels: ChannelsResponse,
    pub enabled: bool,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Alert> for AlertResponse {
    fn from(alert: &Alert) -> Self {
        Self {
            id: alert.id().as_str().to_string(),
            project_id: alert.project_id().as_str().to_string(),
            name: alert.name().to_string(),
            metric: alert.metric(),
            threshold: alert.threshold(),
            window: alert.window(),
            channels: ChannelsResponse::from(alert.channels()),
            enabled: alert.is_enabled(),
            last_triggered_at: alert.last_triggered_at(),
            created_by: alert.created_by().as_str().to_string(),
            created_at: alert.created_at(),
            updated_at: alert.updated_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CostAlertResponse {
    pub id: String,
    pub project_id: String,
    pub threshold_usd: f64,
    pub period: CostAlertPeriod,
    pub channels: ChannelsResponse,
    pub enabled: bool,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&CostAlert> for CostAlertResponse {
    fn from(alert: &CostAlert) -> Self {
        Self {
            id: alert.id().as_str().to_string(),
            project_id: alert.project_id().as_str().to_string(),
            threshold_usd: alert.threshold_usd(),
            period: alert.period(),
            channels: ChannelsResponse::from(alert.channels()),
            enabled: alert.is_enabled(),
            last_triggered_at: alert.last_triggered_at(),
            created_by: alert.created_by().as_str().to_string(),
            created_at: alert.created_at(),
            updated_at: alert.updated_at(),
        }
    }
}

async fn audit(state: &AppState, user: &User, project: &Project, action: AuditAction, target: &str) {
    state
        .audit_service
        .record(
            AuditLog::new(user.id().clone(), action, target).with_project(project.id().clone()),
        )
        .await;
}

/// GET /api/projects/{project_id}/alerts
pub async fn list_alerts(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ListResponse<AlertResponse>>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsRead)
        .await?;

    let alerts = state.alert_service.list_alerts(project.id()).await?;

    Ok(Json(ListResponse::new(
        alerts.iter().map(AlertResponse::from).collect(),
    )))
}

/// POST /api/projects/{project_id}/alerts
pub async fn create_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateAlertRequest>,
) -> Result<(StatusCode, Json<AlertResponse>), ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsManage)
        .await?;

    let alert = state
        .alert_service
        .create_alert(
            project.id(),
            CreateAlert {
                name: request.name.trim().to_string(),
                metric: request.metric,
                threshold: request.threshold,
                window: request.window,
                channels: request.channels.into(),
                enabled: request.enabled,
            },
            user.id(),
        )
        .await?;

    audit(&state, &user, &project, AuditAction::AlertCreated, alert.id().as_str()).await;

    Ok((StatusCode::CREATED, Json(AlertResponse::from(&alert))))
}

/// GET /api/projects/{project_id}/alerts/{alert_id}
pub async fn get_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, alert_id)): Path<(String, String)>,
) -> Result<Json<AlertResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsRead)
        .await?;
    let alert_id = AlertId::parse(&alert_id)?;

    let alert = state.alert_service.get_alert(project.id(), &alert_id).await?;

    Ok(Json(AlertResponse::from(&alert)))
}

/// PATCH /api/projects/{project_id}/alerts/{alert_id}
pub async fn update_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, alert_id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<UpdateAlertRequest>,
) -> Result<Json<AlertResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsManage)
        .await?;
    let alert_id = AlertId::parse(&alert_id)?;

    let alert = state
        .alert_service
        .update_alert(
            project.id(),
            &alert_id,
            UpdateAlert {
                name: request.name.map(|n| n.trim().to_string()),
                metric: request.metric,
                threshold: request.threshold,
                window: request.window,
                channels: request.channels.map(Into::into),
                enabled: request.enabled,
            },
        )
        .await?;

    audit(&state, &user, &project, AuditAction::AlertUpdated, alert_id.as_str()).await;

    Ok(Json(AlertResponse::from(&alert)))
}

/// DELETE /api/projects/{project_id}/alerts/{alert_id}
pub async fn delete_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, alert_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsManage)
        .await?;
    let alert_id = AlertId::parse(&alert_id)?;

    state
        .alert_service
        .delete_alert(project.id(), &alert_id)
        .await?;

    audit(&state, &user, &project, AuditAction::AlertDeleted, alert_id.as_str()).await;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/projects/{project_id}/cost-alerts
pub async fn list_cost_alerts(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ListResponse<CostAlertResponse>>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsRead)
        .await?;

    let alerts = state.alert_service.list_cost_alerts(project.id()).await?;

    Ok(Json(ListResponse::new(
        alerts.iter().map(CostAlertResponse::from).collect(),
    )))
}

/// POST /api/projects/{project_id}/cost-alerts
pub async fn create_cost_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    ValidatedJson(request): ValidatedJson<CreateCostAlertRequest>,
) -> Result<(StatusCode, Json<CostAlertResponse>), ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsManage)
        .await?;

    let alert = state
        .alert_service
        .create_cost_alert(
            project.id(),
            CreateCostAlert {
                threshold_usd: request.threshold_usd,
                period: request.period,
                channels: request.channels.into(),
                enabled: request.enabled,
            },
            user.id(),
        )
        .await?;

    audit(&state, &user, &project, AuditAction::CostAlertCreated, alert.id().as_str()).await;

    Ok((StatusCode::CREATED, Json(CostAlertResponse::from(&alert))))
}

/// GET /api/projects/{project_id}/cost-alerts/{alert_id}
pub async fn get_cost_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, alert_id)): Path<(String, String)>,
) -> Result<Json<CostAlertResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsRead)
        .await?;
    let alert_id = CostAlertId::parse(&alert_id)?;

    let alert = state
        .alert_service
        .get_cost_alert(project.id(), &alert_id)
        .await?;

    Ok(Json(CostAlertResponse::from(&alert)))
}

/// PATCH /api/projects/{project_id}/cost-alerts/{alert_id}
pub async fn update_cost_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, alert_id)): Path<(String, String)>,
    ValidatedJson(request): ValidatedJson<UpdateCostAlertRequest>,
) -> Result<Json<CostAlertResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsManage)
        .await?;
    let alert_id = CostAlertId::parse(&alert_id)?;

    let alert = state
        .alert_service
        .update_cost_alert(
            project.id(),
            &alert_id,
            UpdateCostAlert {
                threshold_usd: request.threshold_usd,
                period: request.period,
                channels: request.channels.map(Into::into),
                enabled: request.enabled,
            },
        )
        .await?;

    audit(&state, &user, &project, AuditAction::CostAlertUpdated, alert_id.as_str()).await;

    Ok(Json(CostAlertResponse::from(&alert)))
}

/// DELETE /api/projects/{project_id}/cost-alerts/{alert_id}
pub async fn delete_cost_alert(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, alert_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::AlertsManage)
        .await?;
    let alert_id = CostAlertId::parse(&alert_id)?;

    state
        .alert_service
        .delete_cost_alert(project.id(), &alert_id)
        .await?;

    audit(&state, &user, &project, AuditAction::CostAlertDeleted, alert_id.as_str()).await;

    Ok(StatusCode::NO_CONTENT)
}
