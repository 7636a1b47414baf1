//! Invoices generated from recorded usage

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::uuid_id;
use crate::domain::model::micros_to_usd;
use crate::domain::project::ProjectId;
use crate::domain::storage::StorageEntity;
use crate::domain::usage::ModelUsage;
use crate::domain::user::UserId;
use crate::domain::DomainError;

uuid_id!(
    /// Invoice identifier
    InvoiceId,
    "invoice"
);

const BASIS_POINTS: i128 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Open,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }
}

/// Charges for one model within the invoice period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub model_id: String,
    pub description: String,
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub amount_micros: i64,
}

impl InvoiceLineItem {
    pub fn from_model_usage(usage: &ModelUsage) -> Self {
        Self {
            model_id: usage.model_id.clone(),
            description: format!(
                "{}: {} requests, {} input / {} output tokens",
                usage.model_id, usage.requests, usage.input_tokens, usage.output_tokens
            ),
            requests: usage.requests,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            amount_micros: usage.cost_micros,
        }
    }

    pub fn amount_usd(&self) -> f64 {
        micros_to_usd(self.amount_micros)
    }
}

/// Tax on `subtotal_micros` at `rate_bps` basis points, rounded half up
pub fn calculate_tax_micros(subtotal_micros: i64, rate_bps: u32) -> i64 {
    let numerator = subtotal_micros as i128 * rate_bps as i128;
    let rounded = (numerator + BASIS_POINTS / 2).div_euclid(BASIS_POINTS);
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Billing document for a project and period `[period_start, period_end)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    id: InvoiceId,
    project_id: ProjectId,
    number: String,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    line_items: Vec<InvoiceLineItem>,
    subtotal_micros: i64,
    tax_rate_bps: u32,
    tax_micros: i64,
    total_micros: i64,
    status: InvoiceStatus,
    issued_at: DateTime<Utc>,
    due_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    paid_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voided_at: Option<DateTime<Utc>>,
    created_by: UserId,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for Invoice {
    type Key = InvoiceId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// Inputs for [`Invoice::issue`]
#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub project_id: ProjectId,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub line_items: Vec<InvoiceLineItem>,
    pub tax_rate_bps: u32,
    pub due_days: u32,
    pub created_by: UserId,
}

impl Invoice {
    /// Issue an open invoice; totals are derived from the line items
    pub fn issue(id: InvoiceId, draft: InvoiceDraft) -> Result<Self, DomainError> {
        if draft.period_end <= draft.period_start {
            return Err(DomainError::validation_field(
                "period_end",
                "Invoice period end must be after its start",
            ));
        }

        let issued_at = Utc::now();
        let subtotal_micros: i64 = draft.line_items.iter().map(|l| l.amount_micros).sum();
        let tax_micros = calculate_tax_micros(subtotal_micros, draft.tax_rate_bps);
        let number = invoice_number(&id, issued_at);

        Ok(Self {
            id,
            project_id: draft.project_id,
            number,
            period_start: draft.period_start,
            period_end: draft.period_end,
            line_items: draft.line_items,
            subtotal_micros,
            tax_rate_bps: draft.tax_rate_bps,
            tax_micros,
            total_micros: subtotal_micros + tax_micros,
            status: InvoiceStatus::Open,
            issued_at,
            due_at: issued_at + Duration::days(draft.due_days as i64),
            paid_at: None,
            voided_at: None,
            created_by: draft.created_by,
            updated_at: issued_at,
        })
    }

    // Getters

    pub fn id(&self) -> &InvoiceId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn period_start(&self) -> DateTime<Utc> {
        self.period_start
    }

    pub fn period_end(&self) -> DateTime<Utc> {
        self.period_end
    }

    pub fn line_items(&self) -> &[InvoiceLineItem] {
        &self.line_items
    }

    pub fn subtotal_micros(&self) -> i64 {
        self.subtotal_micros
    }

    pub fn tax_rate_bps(&self) -> u32 {
        self.tax_rate_bps
    }

    pub fn tax_micros(&self) -> i64 {
        self.tax_micros
    }

    pub fn total_micros(&self) -> i64 {
        self.total_micros
    }

    pub fn total_usd(&self) -> f64 {
        micros_to_usd(self.total_micros)
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn due_at(&self) -> DateTime<Utc> {
        self.due_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn voided_at(&self) -> Option<DateTime<Utc>> {
        self.voided_at
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Void invoices never block a new invoice for the same period
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.status != InvoiceStatus::Void && self.period_start < end && start < self.period_end
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == InvoiceStatus::Open && now > self.due_at
    }

    // State transitions

    pub fn mark_paid(&mut self) -> Result<(), DomainError> {
        self.ensure_open("paid")?;
        let now = Utc::now();
        self.status = InvoiceStatus::Paid;
        self.paid_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn void(&mut self) -> Result<(), DomainError> {
        self.ensure_open("voided")?;
        let now = Utc::now();
        self.status = InvoiceStatus::Void;
        self.voided_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    fn ensure_open(&self, transition: &str) -> Result<(), DomainError> {
        if self.status != InvoiceStatus::Open {
            return Err(DomainError::validation_field(
                "status",
                format!(
                    "Invoice {} is {} and cannot be {}",
                    self.number,
                    self.status.as_str(),
                    transition
                ),
            ));
        }
        Ok(())
    }
}

/// `INV-YYYYMM-XXXXXX`, the suffix taken from the invoice id
pub fn invoice_number(id: &InvoiceId, issued_at: DateTime<Utc>) -> String {
    let suffix: String = id
        .as_str()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(6)
        .collect::<String>()
        .to_uppercase();

    format!("INV-{}-{}", issued_at.format("%Y%m"), suffix)
}
