//! Usage record entities and aggregates

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::api_key::ApiKeyId;
use crate::domain::id::uuid_id;
use crate::domain::model::micros_to_usd;
use crate::domain::project::ProjectId;
use crate::domain::storage::StorageEntity;

use super::cost::CostEstimate;

uuid_id!(
    /// Usage record identifier
    UsageRecordId,
    "usage record"
);

impl StorageEntity for UsageRecord {
    type Key = UsageRecordId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// A single gateway request as billed to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    id: UsageRecordId,
    pub project_id: ProjectId,
    pub api_key_id: ApiKeyId,
    pub model_id: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
    /// Cost in micro-dollars
    pub cost_micros: i64,
    pub latency_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    pub fn new(project_id: ProjectId, api_key_id: ApiKeyId, model_id: impl Into<String>) -> Self {
        Self {
            id: UsageRecordId::generate(),
            project_id,
            api_key_id,
            model_id: model_id.into(),
            input_tokens: 0,
            output_tokens: 0,
            total_tokens: 0,
            cost_micros: 0,
            latency_ms: 0,
            success: true,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_tokens(mut self, input: u32, output: u32) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self.total_tokens = input.saturating_add(output);
        self
    }

    pub fn with_cost_micros(mut self, cost: i64) -> Self {
        self.cost_micros = cost;
        self
    }

    /// Tokens and cost from an estimate
    pub fn with_estimate(self, estimate: &CostEstimate) -> Self {
        self.with_tokens(estimate.input_tokens, estimate.output_tokens)
            .with_cost_micros(estimate.total_cost_micros)
    }

    pub fn with_latency_ms(mut self, latency: u64) -> Self {
        self.latency_ms = latency;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn cost_usd(&self) -> f64 {
        micros_to_usd(self.cost_micros)
    }

    pub fn id(&self) -> &UsageRecordId {
        &self.id
    }
}

/// Aggregated usage statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageAggregate {
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_tokens: u64,
    /// Total cost in micro-dollars
    pub total_cost_micros: i64,
    pub avg_latency_ms: f64,
}

impl UsageAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: &UsageRecord) {
        self.total_requests += 1;

        if record.success {
            self.successful_requests += 1;
        } else {
            self.failed_requests += 1;
        }

        self.total_input_tokens += record.input_tokens as u64;
        self.total_output_tokens += record.output_tokens as u64;
        self.total_tokens += record.total_tokens as u64;
        self.total_cost_micros += record.cost_micros;

        // Running average
        let prev_total = self.avg_latency_ms * (self.total_requests - 1) as f64;
        self.avg_latency_ms = (prev_total + record.latency_ms as f64) / self.total_requests as f64;
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Self {
        let mut aggregate = Self::new();
        for record in records {
            aggregate.add_record(record);
        }
        aggregate
    }

    pub fn total_cost_usd(&self) -> f64 {
        micros_to_usd(self.total_cost_micros)
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }

        self.successful_requests as f64 / self.total_requests as f64
    }

    /// Failed requests as a percentage (0-100)
    pub fn error_rate_percent(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }

        self.failed_requests as f64 * 100.0 / self.total_requests as f64
    }
}

/// Usage of one model within a period
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelUsage {
    pub model_id: String,
    pub requests: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cost_micros: i64,
}

/// Usage of one calendar day (UTC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub requests: u64,
    pub tokens: u64,
    pub cost_micros: i64,
}

impl DailyUsage {
    pub fn cost_usd(&self) -> f64 {
        micros_to_usd(self.cost_micros)
    }
}

/// Per-model breakdown, ordered by model id
pub fn usage_by_model<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Vec<ModelUsage> {
    let mut by_model: BTreeMap<&str, ModelUsage> = BTreeMap::new();

    for record in records {
        let entry = by_model
            .entry(record.model_id.as_str())
            .or_insert_with(|| ModelUsage {
                model_id: record.model_id.clone(),
                ..ModelUsage::default()
            });
        entry.requests += 1;
        entry.input_tokens += record.input_tokens as u64;
        entry.output_tokens += record.output_tokens as u64;
        entry.cost_micros += record.cost_micros;
    }

    by_model.into_values().collect()
}

/// Per-day breakdown, ordered by date
pub fn usage_by_day<'a>(records: impl IntoIterator<Item = &'a UsageRecord>) -> Vec<DailyUsage> {
    let mut by_day: BTreeMap<NaiveDate, DailyUsage> = BTreeMap::new();

    for record in records {
        let date = record.timestamp.date_naive();
        let entry = by_day.entry(date).or_insert_with(|| DailyUsage {
            date,
            requests: 0,
            tokens: 0,
            cost_micros: 0,
        });
        entry.requests += 1;
        entry.tokens += record.total_tokens as u64;
        entry.cost_micros += record.cost_micros;
    }

    by_day.into_values().collect()
}

/// Usage summary for a time period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
    pub totals: UsageAggregate,
    pub by_model: Vec<ModelUsage>,
    pub daily: Vec<DailyUsage>,
}

impl UsageSummary {
    pub fn from_records(
        period_start: Option<DateTime<Utc>>,
        period_end: Option<DateTime<Utc>>,
        records: &[UsageRecord],
    ) -> Self {
        Self {
            period_start,
            period_end,
            totals: UsageAggregate::from_records(records),
            by_model: usage_by_model(records),
            daily: usage_by_day(records),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn record(model: &str, input: u32, output: u32, cost: i64) -> UsageRecord {
        UsageRecord::new(ProjectId::generate(), ApiKeyId::generate(), model)
            .with_tokens(input, output)
            .with_cost_micros(cost)
    }

    #[test]
    fn test_usage_record_creation() {
        let record = record("gpt-4o", 100, 50, 5_000).with_latency_ms(250);

        assert_eq!(record.model_id, "gpt-4o");
        assert_eq!(record.total_tokens, 150);
        assert!((record.cost_usd() - 0.005).abs() < 1e-9);
        assert_eq!(record.latency_ms, 250);
        assert!(record.success);
    }

    #[test]
    fn test_usage_record_with_error() {
        let record = record("gpt-4o", 0, 0, 0).with_error("Model disabled");

        assert!(!record.success);
        assert_eq!(record.error.as_deref(), Some("Model disabled"));
    }

    #[test]
    fn test_usage_aggregate() {
        let records = vec![
            record("gpt-4o", 100, 50, 10_000).with_latency_ms(200),
            record("gpt-4o", 200, 100, 20_000).with_latency_ms(300),
        ];

        let aggregate = UsageAggregate::from_records(&records);

        assert_eq!(aggregate.total_requests, 2);
        assert_eq!(aggregate.successful_requests, 2);
        assert_eq!(aggregate.total_input_tokens, 300);
        assert_eq!(aggregate.total_output_tokens, 150);
        assert_eq!(aggregate.total_tokens, 450);
        assert_eq!(aggregate.total_cost_micros, 30_000);
        assert!((aggregate.avg_latency_ms - 250.0).abs() < 0.1);
        assert!((aggregate.success_rate() - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_error_rate() {
        let records = vec![
            record("gpt-4o", 1, 1, 1),
            record("gpt-4o", 1, 1, 1).with_error("boom"),
            record("gpt-4o", 1, 1, 1),
            record("gpt-4o", 1, 1, 1).with_error("boom"),
        ];

        let aggregate = UsageAggregate::from_records(&records);

        assert_eq!(aggregate.failed_requests, 2);
        assert!((aggregate.error_rate_percent() - 50.0).abs() < 1e-9);
        assert_eq!(UsageAggregate::new().error_rate_percent(), 0.0);
    }

    #[test]
    fn test_breakdowns() {
        let day1 = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        let day2 = Utc.with_ymd_and_hms(2024, 3, 2, 23, 59, 0).unwrap();
        let records = vec![
            record("gpt-4o", 100, 10, 300).with_timestamp(day1),
            record("claude-3.5-haiku", 50, 5, 100).with_timestamp(day1),
            record("gpt-4o", 10, 10, 50).with_timestamp(day2),
        ];

        let summary = UsageSummary::from_records(None, None, &records);

        assert_eq!(summary.by_model.len(), 2);
        assert_eq!(summary.by_model[0].model_id, "claude-3.5-haiku");
        assert_eq!(summary.by_model[1].requests, 2);
        assert_eq!(summary.by_model[1].input_tokens, 110);
        assert_eq!(summary.by_model[1].cost_micros, 350);

        assert_eq!(summary.daily.len(), 2);
        assert_eq!(summary.daily[0].date, day1.date_naive());
        assert_eq!(summary.daily[0].requests, 2);
        assert_eq!(summary.daily[1].tokens, 20);
        assert_eq!(summary.totals.total_cost_micros, 450);
    }
}
