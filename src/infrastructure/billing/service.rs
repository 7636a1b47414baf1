//! Invoice service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::domain::invoice::{Invoice, InvoiceDraft, InvoiceId, InvoiceLineItem};
use crate::domain::project::ProjectId;
use crate::domain::storage::Storage;
use crate::domain::usage::usage_by_model;
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::usage::UsageService;

/// Billing section of the configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Tax rate in basis points (100 = 1%)
    #[serde(default)]
    pub tax_rate_bps: u32,
    #[serde(default = "default_invoice_due_days")]
    pub invoice_due_days: u32,
}

fn default_invoice_due_days() -> u32 {
    30
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            tax_rate_bps: 0,
            invoice_due_days: default_invoice_due_days(),
        }
    }
}

#[derive(Debug)]
pub struct InvoiceService {
    invoices: Arc<dyn Storage<Invoice>>,
    usage: Arc<UsageService>,
    config: BillingConfig,
}

impl InvoiceService {
    pub fn new(
        invoices: Arc<dyn Storage<Invoice>>,
        usage: Arc<UsageService>,
        config: BillingConfig,
    ) -> Self {
        Self {
            invoices,
            usage,
            config,
        }
    }

    /// Invoice the project's usage in `[period_start, period_end)`
    pub async fn generate(
        &self,
        project_id: &ProjectId,
        period_start: DateTime<Utc>,
        period_end: DateTime<Utc>,
        created_by: &UserId,
    ) -> Result<Invoice, DomainError> {
        if period_end <= period_start {
            return Err(DomainError::validation_field(
                "period_end",
                "Invoice period end must be after its start",
            ));
        }

        let overlapping = self
            .invoices
            .find(&|i: &Invoice| {
                i.project_id() == project_id && i.overlaps(period_start, period_end)
            })
            .await?;
        if let Some(existing) = overlapping.first() {
            return Err(DomainError::conflict(format!(
                "Invoice {} already covers part of this period",
                existing.number()
            )));
        }

        let records = self
            .usage
            .records_between(project_id, period_start, period_end)
            .await?;
        let line_items = usage_by_model(&records)
            .iter()
            .map(InvoiceLineItem::from_model_usage)
            .collect();

        let invoice = Invoice::issue(
            InvoiceId::generate(),
            InvoiceDraft {
                project_id: project_id.clone(),
                period_start,
                period_end,
                line_items,
                tax_rate_bps: self.config.tax_rate_bps,
                due_days: self.config.invoice_due_days,
                created_by: created_by.clone(),
            },
        )?;

        let created = self.invoices.create(invoice).await?;
        info!(
            invoice_id = %created.id(),
            number = %created.number(),
            project_id = %project_id,
            total_micros = created.total_micros(),
            "Invoice generated"
        );
        Ok(created)
    }

    /// Newest period first
    pub async fn list(&self, project_id: &ProjectId) -> Result<Vec<Invoice>, DomainError> {
        let mut invoices = self
            .invoices
            .find(&|i: &Invoice| i.project_id() == project_id)
            .await?;
        invoices.sort_by(|a, b| b.period_start().cmp(&a.period_start()));
        Ok(invoices)
    }

    pub async fn get(&self, project_id: &ProjectId, id: &InvoiceId) -> Result<Invoice, DomainError> {
        self.invoices
            .get(id)
            .await?
            .filter(|i| i.project_id() == project_id)
            .ok_or_else(|| DomainError::not_found(format!("Invoice '{}' not found", id)))
    }

    pub async fn mark_paid(
        &self,
        project_id: &ProjectId,
        id: &InvoiceId,
    ) -> Result<Invoice, DomainError> {
        let mut invoice = self.get(project_id, id).await?;
        invoice.mark_paid()?;

        let updated = self.invoices.update(invoice).await?;
        info!(invoice_id = %id, number = %updated.number(), "Invoice paid");
        Ok(updated)
    }

    pub async fn void(&self, project_id: &ProjectId, id: &InvoiceId) -> Result<Invoice, DomainError> {
        let mut invoice = self.get(project_id, id).await?;
        invoice.void()?;

        let updated = self.invoices.update(invoice).await?;
        info!(invoice_id = %id, number = %updated.number(), "Invoice voided");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::api_key::ApiKeyId;
    use crate::domain::invoice::InvoiceStatus;
    use crate::domain::usage::UsageRecord;
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        service: InvoiceService,
        usage: Arc<UsageService>,
        project: ProjectId,
        user: UserId,
    }

    fn fixture(tax_rate_bps: u32) -> Fixture {
        let usage = Arc::new(UsageService::new(Arc::new(
            InMemoryStorage::<UsageRecord>::new(),
        )));
        let service = InvoiceService::new(
            Arc::new(InMemoryStorage::<Invoice>::new()),
            usage.clone(),
            BillingConfig {
                tax_rate_bps,
                invoice_due_days: 14,
            },
        );

        Fixture {
            service,
            usage,
            project: ProjectId::generate(),
            user: UserId::generate(),
        }
    }

    fn march() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
        )
    }

    async fn usage(f: &Fixture, model: &str, day: u32, cost: i64) {
        f.usage
            .record(
                UsageRecord::new(f.project.clone(), ApiKeyId::generate(), model)
                    .with_tokens(1_000, 500)
                    .with_cost_micros(cost)
                    .with_timestamp(Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_generate_groups_usage_by_model() {
        let f = fixture(1_000);
        usage(&f, "gpt-4o", 2, 1_000_000).await;
        usage(&f, "gpt-4o", 3, 500_000).await;
        usage(&f, "claude-3-5-sonnet", 4, 250_000).await;
        let (start, end) = march();

        let invoice = f.service.generate(&f.project, start, end, &f.user).await.unwrap();

        assert_eq!(invoice.line_items().len(), 2);
        assert_eq!(invoice.subtotal_micros(), 1_750_000);
        assert_eq!(invoice.tax_micros(), 175_000);
        assert_eq!(invoice.total_micros(), 1_925_000);
        assert_eq!(invoice.status(), InvoiceStatus::Open);
        assert!(invoice.number().starts_with("INV-"));
        assert_eq!((invoice.due_at() - invoice.issued_at()).num_days(), 14);
    }

    #[tokio::test]
    async fn test_empty_period_produces_zero_invoice() {
        let f = fixture(0);
        let (start, end) = march();

        let invoice = f.service.generate(&f.project, start, end, &f.user).await.unwrap();

        assert!(invoice.line_items().is_empty());
        assert_eq!(invoice.total_micros(), 0);
    }

    #[tokio::test]
    async fn test_inverted_period_rejected() {
        let f = fixture(0);
        let (start, end) = march();

        let result = f.service.generate(&f.project, end, start, &f.user).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_overlapping_period_conflicts_until_voided() {
        let f = fixture(0);
        let (start, end) = march();
        let first = f.service.generate(&f.project, start, end, &f.user).await.unwrap();

        let mid = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 4, 15, 0, 0, 0).unwrap();
        let result = f.service.generate(&f.project, mid, later, &f.user).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));

        // adjacent periods do not overlap
        f.service.generate(&f.project, end, later, &f.user).await.unwrap();

        f.service.void(&f.project, first.id()).await.unwrap();
        let mid_march = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
        f.service
            .generate(&f.project, start, mid_march, &f.user)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let f = fixture(0);
        let (start, end) = march();
        let invoice = f.service.generate(&f.project, start, end, &f.user).await.unwrap();

        let paid = f.service.mark_paid(&f.project, invoice.id()).await.unwrap();
        assert_eq!(paid.status(), InvoiceStatus::Paid);
        assert!(paid.paid_at().is_some());

        assert!(matches!(
            f.service.void(&f.project, invoice.id()).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            f.service.mark_paid(&f.project, invoice.id()).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_invoices_are_project_scoped() {
        let f = fixture(0);
        let (start, end) = march();
        let invoice = f.service.generate(&f.project, start, end, &f.user).await.unwrap();

        let other = ProjectId::generate();
        assert!(matches!(
            f.service.get(&other, invoice.id()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(f.service.list(&other).await.unwrap().is_empty());
        assert_eq!(f.service.list(&f.project).await.unwrap().len(), 1);

        // another project may invoice the same period
        f.service.generate(&other, start, end, &f.user).await.unwrap();
    }
}
