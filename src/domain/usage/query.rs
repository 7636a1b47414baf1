//! Usage record filtering

use chrono::{DateTime, Utc};

use crate::domain::api_key::ApiKeyId;
use crate::domain::DomainError;

use super::record::UsageRecord;

pub const DEFAULT_USAGE_LIMIT: usize = 50;
pub const MAX_USAGE_LIMIT: usize = 500;

/// Query parameters for usage records of one project
#[derive(Debug, Clone, Default)]
pub struct UsageQuery {
    pub api_key_id: Option<ApiKeyId>,
    pub model_id: Option<String>,
    /// Inclusive
    pub from: Option<DateTime<Utc>>,
    /// Exclusive
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl UsageQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key_id: ApiKeyId) -> Self {
        self.api_key_id = Some(api_key_id);
        self
    }

    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn with_time_range(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Rejects inverted ranges and oversized pages
    pub fn validate(&self) -> Result<(), DomainError> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from >= to {
                return Err(DomainError::validation_field(
                    "from",
                    "'from' must be earlier than 'to'",
                ));
            }
        }

        if let Some(limit) = self.limit {
            if limit == 0 || limit > MAX_USAGE_LIMIT {
                return Err(DomainError::validation_field(
                    "limit",
                    format!("limit must be between 1 and {}", MAX_USAGE_LIMIT),
                ));
            }
        }

        Ok(())
    }

    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_USAGE_LIMIT).min(MAX_USAGE_LIMIT)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }

    /// Filters other than pagination
    pub fn matches(&self, record: &UsageRecord) -> bool {
        self.api_key_id
            .as_ref()
            .is_none_or(|id| &record.api_key_id == id)
            && self
                .model_id
                .as_deref()
                .is_none_or(|model| record.model_id == model)
            && self.from.is_none_or(|from| record.timestamp >= from)
            && self.to.is_none_or(|to| record.timestamp < to)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::project::ProjectId;

    #[test]
    fn test_defaults() {
        let query = UsageQuery::new();

        assert_eq!(query.effective_limit(), 50);
        assert_eq!(query.effective_offset(), 0);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_input() {
        let now = Utc::now();

        assert!(UsageQuery::new()
            .with_time_range(now, now - Duration::hours(1))
            .validate()
            .is_err());
        assert!(UsageQuery::new().with_limit(0).validate().is_err());
        assert!(UsageQuery::new().with_limit(501).validate().is_err());
        assert!(UsageQuery::new().with_limit(500).validate().is_ok());
    }

    #[test]
    fn test_matches() {
        let key = ApiKeyId::generate();
        let now = Utc::now();
        let record = UsageRecord::new(ProjectId::generate(), key.clone(), "gpt-4o")
            .with_timestamp(now);

        assert!(UsageQuery::new().matches(&record));
        assert!(UsageQuery::new().with_api_key(key).matches(&record));
        assert!(!UsageQuery::new()
            .with_api_key(ApiKeyId::generate())
            .matches(&record));
        assert!(!UsageQuery::new().with_model("gpt-4o-mini").matches(&record));
        assert!(UsageQuery::new()
            .with_time_range(now, now + Duration::seconds(1))
            .matches(&record));
        assert!(!UsageQuery::new()
            .with_time_range(now - Duration::hours(1), now)
            .matches(&record));
    }
}
