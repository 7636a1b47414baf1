//! Invoice endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireUser;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::audit::{AuditAction, AuditLog};
use crate::domain::invoice::{Invoice, InvoiceId, InvoiceLineItem, InvoiceStatus};
use crate::domain::model::micros_to_usd;
use crate::domain::project::Permission;

use super::ListResponse;

/// Billing period to invoice, `[period_start, period_end)`
#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LineItemResponse {
    #[serde(flatten)]
    pub item: InvoiceLineItem,
    pub amount_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub project_id: String,
    pub number: String,
    pub status: InvoiceStatus,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub line_items: Vec<LineItemResponse>,
    pub subtotal_usd: f64,
    pub tax_rate_bps: u32,
    pub tax_usd: f64,
    pub total_usd: f64,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub voided_at: Option<DateTime<Utc>>,
    pub overdue: bool,
}

impl From<&Invoice> for InvoiceResponse {
    fn from(invoice: &Invoice) -> Self {
        Self {
            id: invoice.id().as_str().to_string(),
            project_id: invoice.project_id().as_str().to_string(),
            number: invoice.number().to_string(),
            status: invoice.status(),
            period_start: invoice.period_start(),
            period_end: invoice.period_end(),
            line_items: invoice
                .line_items()
                .iter()
                .map(|item| LineItemResponse {
                    amount_usd: item.amount_usd(),
                    item: item.clone(),
                })
                .collect(),
            subtotal_usd: micros_to_usd(invoice.subtotal_micros()),
            tax_rate_bps: invoice.tax_rate_bps(),
            tax_usd: micros_to_usd(invoice.tax_micros()),
            total_usd: invoice.total_usd(),
            issued_at: invoice.issued_at(),
            due_at: invoice.due_at(),
            paid_at: invoice.paid_at(),
            voided_at: invoice.voided_at(),
            overdue: invoice.is_overdue(Utc::now()),
        }
    }
}

/// GET /api/projects/{project_id}/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
) -> Result<Json<ListResponse<InvoiceResponse>>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::BillingRead)
        .await?;

    let invoices = state.invoice_service.list(project.id()).await?;

    Ok(Json(ListResponse::new(
        invoices.iter().map(InvoiceResponse::from).collect(),
    )))
}

/// POST /api/projects/{project_id}/invoices
pub async fn generate_invoice(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(project_id): Path<String>,
    Json(request): Json<GenerateInvoiceRequest>,
) -> Result<(StatusCode, Json<InvoiceResponse>), ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::BillingManage)
        .await?;

    let invoice = state
        .invoice_service
        .generate(
            project.id(),
            request.period_start,
            request.period_end,
            user.id(),
        )
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(
                user.id().clone(),
                AuditAction::InvoiceGenerated,
                invoice.id().as_str(),
            )
            .with_project(project.id().clone())
            .with_metadata(serde_json::json!({
                "number": invoice.number(),
                "total_usd": invoice.total_usd(),
            })),
        )
        .await;

    Ok((StatusCode::CREATED, Json(InvoiceResponse::from(&invoice))))
}

/// GET /api/projects/{project_id}/invoices/{invoice_id}
pub async fn get_invoice(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, invoice_id)): Path<(String, String)>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::BillingRead)
        .await?;
    let invoice_id = InvoiceId::parse(&invoice_id)?;

    let invoice = state.invoice_service.get(project.id(), &invoice_id).await?;

    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// POST /api/projects/{project_id}/invoices/{invoice_id}/pay
pub async fn pay_invoice(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, invoice_id)): Path<(String, String)>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::BillingManage)
        .await?;
    let invoice_id = InvoiceId::parse(&invoice_id)?;

    let invoice = state
        .invoice_service
        .mark_paid(project.id(), &invoice_id)
        .await?;

    state
        .audit_service
        .record(
            AuditLog::new(user.id().clone(), AuditAction::InvoicePaid, invoice_id.as_str())
                .with_project(project.id().clone()),
        )
        .await;

    Ok(Json(InvoiceResponse::from(&invoice)))
}

/// POST /api/projects/{project_id}/invoices/{invoice_id}/void
pub async fn void_invoice(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((project_id, invoice_id)): Path<(String, String)>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let project = state
        .authorize(&project_id, &user, Permission::BillingManage)
        .await?;
    let invoice_id = InvoiceId::parse(&invoice_id)?;

    let invoice = state.invoice_service.void(project.id(), &invoice_id).await?;

    state
        .audit_service
        .record(
            AuditLog::new(user.id().clone(), AuditAction::InvoiceVoided, invoice_id.as_str())
                .with_project(project.id().clone()),
        )
        .await;

    Ok(Json(InvoiceResponse::from(&invoice)))
}
