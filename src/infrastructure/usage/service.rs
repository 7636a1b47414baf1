//! Usage tracking service

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::project::ProjectId;
use crate::domain::storage::Storage;
use crate::domain::usage::{UsageAggregate, UsageQuery, UsageRecord, UsageSummary};
use crate::domain::DomainError;

/// Records gateway usage and answers per-project usage queries
#[derive(Debug)]
pub struct UsageService {
    storage: Arc<dyn Storage<UsageRecord>>,
}

impl UsageService {
    pub fn new(storage: Arc<dyn Storage<UsageRecord>>) -> Self {
        Self { storage }
    }

    pub async fn record(&self, record: UsageRecord) -> Result<UsageRecord, DomainError> {
        debug!(
            project_id = %record.project_id,
            model = %record.model_id,
            tokens = record.total_tokens,
            cost_micros = record.cost_micros,
            "Recording usage"
        );
        self.storage.create(record).await
    }

    /// One page of matching records, newest first
    pub async fn query(
        &self,
        project_id: &ProjectId,
        query: &UsageQuery,
    ) -> Result<Vec<UsageRecord>, DomainError> {
        query.validate()?;

        let mut records = self.records_matching(project_id, query).await?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(records
            .into_iter()
            .skip(query.effective_offset())
            .take(query.effective_limit())
            .collect())
    }

    /// Totals plus per-model and per-day breakdowns for `[from, to)`
    pub async fn summary(
        &self,
        project_id: &ProjectId,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<UsageSummary, DomainError> {
        let query = UsageQuery {
            from,
            to,
            ..UsageQuery::default()
        };
        query.validate()?;

        let records = self.records_matching(project_id, &query).await?;
        Ok(UsageSummary::from_records(from, to, &records))
    }

    /// Aggregate over every record at or after `since`
    pub async fn aggregate_since(
        &self,
        project_id: &ProjectId,
        since: DateTime<Utc>,
    ) -> Result<UsageAggregate, DomainError> {
        let records = self
            .storage
            .find(&|r: &UsageRecord| &r.project_id == project_id && r.timestamp >= since)
            .await?;
        Ok(UsageAggregate::from_records(&records))
    }

    /// Records in `[start, end)` used for invoicing
    pub async fn records_between(
        &self,
        project_id: &ProjectId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<UsageRecord>, DomainError> {
        let query = UsageQuery::new().with_time_range(start, end);
        self.records_matching(project_id, &query).await
    }

    async fn records_matching(
        &self,
        project_id: &ProjectId,
        query: &UsageQuery,
    ) -> Result<Vec<UsageRecord>, DomainError> {
        self.storage
            .find(&|r: &UsageRecord| &r.project_id == project_id && query.matches(r))
            .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::api_key::ApiKeyId;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service() -> UsageService {
        UsageService::new(Arc::new(InMemoryStorage::<UsageRecord>::new()))
    }

    fn record(project: &ProjectId, model: &str, at: DateTime<Utc>, cost: i64) -> UsageRecord {
        UsageRecord::new(project.clone(), ApiKeyId::generate(), model)
            .with_tokens(100, 50)
            .with_cost_micros(cost)
            .with_latency_ms(200)
            .with_timestamp(at)
    }

    #[tokio::test]
    async fn test_query_is_scoped_and_newest_first() {
        let service = service();
        let project = ProjectId::generate();
        let now = Utc::now();

        for minutes in [30, 10, 20] {
            service
                .record(record(&project, "gpt-4o", now - Duration::minutes(minutes), 1_000))
                .await
                .unwrap();
        }
        service
            .record(record(&ProjectId::generate(), "gpt-4o", now, 1_000))
            .await
            .unwrap();

        let records = service.query(&project, &UsageQuery::new()).await.unwrap();

        assert_eq!(records.len(), 3);
        assert!(records.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(records.iter().all(|r| r.project_id == project));
    }

    #[tokio::test]
    async fn test_query_filters_and_pagination() {
        let service = service();
        let project = ProjectId::generate();
        let now = Utc::now();

        for i in 0..5 {
            service
                .record(record(&project, "gpt-4o", now - Duration::minutes(i), 1_000))
                .await
                .unwrap();
        }
        service
            .record(record(&project, "claude-3-5-sonnet", now, 1_000))
            .await
            .unwrap();

        let gpt = service
            .query(&project, &UsageQuery::new().with_model("gpt-4o"))
            .await
            .unwrap();
        assert_eq!(gpt.len(), 5);

        let page = service
            .query(&project, &UsageQuery::new().with_limit(2).with_offset(4))
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }

    #[tokio::test]
    async fn test_query_rejects_oversized_limit() {
        let service = service();

        let result = service
            .query(&ProjectId::generate(), &UsageQuery::new().with_limit(501))
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_summary_over_range() {
        let service = service();
        let project = ProjectId::generate();
        let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap();
        let outside = Utc.with_ymd_and_hms(2024, 4, 1, 10, 0, 0).unwrap();

        service.record(record(&project, "gpt-4o", day1, 2_000)).await.unwrap();
        service.record(record(&project, "gpt-4o", day2, 3_000)).await.unwrap();
        service.record(record(&project, "gpt-4o", outside, 9_000)).await.unwrap();

        let summary = service
            .summary(
                &project,
                Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
                Some(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(summary.totals.total_requests, 2);
        assert_eq!(summary.totals.total_cost_micros, 5_000);
        assert_eq!(summary.by_model.len(), 1);
        assert_eq!(summary.daily.len(), 2);
    }

    #[tokio::test]
    async fn test_summary_rejects_inverted_range() {
        let service = service();
        let now = Utc::now();

        let result = service
            .summary(&ProjectId::generate(), Some(now), Some(now - Duration::hours(1)))
            .await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_aggregate_since() {
        let service = service();
        let project = ProjectId::generate();
        let now = Utc::now();

        service
            .record(record(&project, "gpt-4o", now - Duration::days(2), 5_000))
            .await
            .unwrap();
        service.record(record(&project, "gpt-4o", now, 1_500)).await.unwrap();

        let aggregate = service
            .aggregate_since(&project, now - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(aggregate.total_requests, 1);
        assert_eq!(aggregate.total_cost_micros, 1_500);
    }
}
