//! Console API endpoints for signed-in users
//!
//! Everything under `/api` requires a session token. Project-scoped routes
//! check the caller's role before touching the resource: non-members get
//! 404 and members without the permission get 403.

pub mod alerts;
pub mod api_keys;
pub mod audit;
pub mod catalog;
pub mod invoices;
pub mod members;
pub mod projects;
pub mod usage;
pub mod users;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};

use super::state::AppState;

/// Create console API router
pub fn create_console_router() -> Router<AppState> {
    Router::new()
        // Current user
        .route("/users/me", patch(users::update_profile))
        .route("/users/me/password", post(users::change_password))
        .route("/users/me/audit-logs", get(audit::list_user_audit_logs))
        // Projects
        .route("/projects", get(projects::list_projects))
        .route("/projects", post(projects::create_project))
        .route("/projects/{project_id}", get(projects::get_project))
        .route("/projects/{project_id}", patch(projects::update_project))
        .route("/projects/{project_id}", delete(projects::delete_project))
        .route(
            "/projects/{project_id}/permissions",
            get(projects::get_permissions),
        )
        // Members
        .route("/projects/{project_id}/members", get(members::list_members))
        .route("/projects/{project_id}/members", post(members::add_member))
        .route(
            "/projects/{project_id}/members/{user_id}",
            patch(members::update_member),
        )
        .route(
            "/projects/{project_id}/members/{user_id}",
            delete(members::remove_member),
        )
        // API keys
        .route("/projects/{project_id}/api-keys", get(api_keys::list_api_keys))
        .route("/projects/{project_id}/api-keys", post(api_keys::create_api_key))
        .route(
            "/projects/{project_id}/api-keys/{key_id}",
            get(api_keys::get_api_key),
        )
        .route(
            "/projects/{project_id}/api-keys/{key_id}",
            delete(api_keys::delete_api_key),
        )
        .route(
            "/projects/{project_id}/api-keys/{key_id}/revoke",
            post(api_keys::revoke_api_key),
        )
        // Usage
        .route("/projects/{project_id}/usage", get(usage::list_usage))
        .route("/projects/{project_id}/usage/summary", get(usage::get_summary))
        // Alerts
        .route("/projects/{project_id}/alerts", get(alerts::list_alerts))
        .route("/projects/{project_id}/alerts", post(alerts::create_alert))
        .route(
            "/projects/{project_id}/alerts/{alert_id}",
            get(alerts::get_alert),
        )
        .route(
            "/projects/{project_id}/alerts/{alert_id}",
            patch(alerts::update_alert),
        )
        .route(
            "/projects/{project_id}/alerts/{alert_id}",
            delete(alerts::delete_alert),
        )
        .route(
            "/projects/{project_id}/cost-alerts",
            get(alerts::list_cost_alerts),
        )
        .route(
            "/projects/{project_id}/cost-alerts",
            post(alerts::create_cost_alert),
        )
        .route(
            "/projects/{project_id}/cost-alerts/{alert_id}",
            get(alerts::get_cost_alert),
        )
        .route(
            "/projects/{project_id}/cost-alerts/{alert_id}",
            patch(alerts::update_cost_alert),
        )
        .route(
            "/projects/{project_id}/cost-alerts/{alert_id}",
            delete(alerts::delete_cost_alert),
        )
        // Invoices
        .route("/projects/{project_id}/invoices", get(invoices::list_invoices))
        .route(
            "/projects/{project_id}/invoices",
            post(invoices::generate_invoice),
        )
        .route(
            "/projects/{project_id}/invoices/{invoice_id}",
            get(invoices::get_invoice),
        )
        .route(
            "/projects/{project_id}/invoices/{invoice_id}/pay",
            post(invoices::pay_invoice),
        )
        .route(
            "/projects/{project_id}/invoices/{invoice_id}/void",
            post(invoices::void_invoice),
        )
        // Audit
        .route(
            "/projects/{project_id}/audit-logs",
            get(audit::list_project_audit_logs),
        )
        // Catalog (read-only)
        .route("/providers", get(catalog::list_providers))
        .route("/models", get(catalog::list_models))
        .route("/models/{model_id}", get(catalog::get_model))
}

/// List envelope used by every console collection endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        let total = data.len();
        Self { data, total }
    }
}

/// `limit` / `offset` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}
