//! Threshold alerts on project usage metrics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::uuid_id;
use crate::domain::project::ProjectId;
use crate::domain::storage::StorageEntity;
use crate::domain::usage::UsageAggregate;
use crate::domain::user::UserId;

use super::period::AlertWindow;

uuid_id!(
    /// Alert identifier
    AlertId,
    "alert"
);

/// Metric an alert watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    RequestCount,
    TokenCount,
    /// Failed requests in percent (0-100)
    ErrorRate,
    /// Spend in USD
    Spend,
}

impl AlertMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestCount => "request_count",
            Self::TokenCount => "token_count",
            Self::ErrorRate => "error_rate",
            Self::Spend => "spend",
        }
    }

    /// Current value of this metric in an aggregate
    pub fn value_of(&self, aggregate: &UsageAggregate) -> f64 {
        match self {
            Self::RequestCount => aggregate.total_requests as f64,
            Self::TokenCount => aggregate.total_tokens as f64,
            Self::ErrorRate => aggregate.error_rate_percent(),
            Self::Spend => aggregate.total_cost_usd(),
        }
    }
}

impl std::fmt::Display for AlertMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where notifications for an alert are delivered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationChannels {
    #[serde(default)]
    pub emails: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// HMAC key for signing webhook payloads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

impl NotificationChannels {
    pub fn new(emails: Vec<String>) -> Self {
        Self {
            emails,
            ..Self::default()
        }
    }

    pub fn with_webhook(mut self, url: impl Into<String>, secret: Option<String>) -> Self {
        self.webhook_url = Some(url.into());
        self.webhook_secret = secret;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.webhook_url.is_none()
    }
}

/// Fires when a usage metric over a window reaches a threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    id: AlertId,
    project_id: ProjectId,
    name: String,
    metric: AlertMetric,
    threshold: f64,
    window: AlertWindow,
    channels: NotificationChannels,
    enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_triggered_at: Option<DateTime<Utc>>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for Alert {
    type Key = AlertId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl Alert {
    pub fn new(
        id: AlertId,
        project_id: ProjectId,
        name: impl Into<String>,
        metric: AlertMetric,
        threshold: f64,
        window: AlertWindow,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            project_id,
            name: name.into(),
            metric,
            threshold,
            window,
            channels: NotificationChannels::default(),
            enabled: true,
            last_triggered_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_channels(mut self, channels: NotificationChannels) -> Self {
        self.channels = channels;
        self
    }

    // Getters

    pub fn id(&self) -> &AlertId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metric(&self) -> AlertMetric {
        self.metric
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn window(&self) -> AlertWindow {
        self.window
    }

    pub fn channels(&self) -> &NotificationChannels {
        &self.channels
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn last_triggered_at(&self) -> Option<DateTime<Utc>> {
        self.last_triggered_at
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Evaluation

    pub fn has_fired_in_window(&self, now: DateTime<Utc>) -> bool {
        let window_start = self.window.start_at(now);
        self.last_triggered_at.is_some_and(|at| at >= window_start)
    }

    /// Enabled, at or over threshold, and not yet fired in the current window
    pub fn should_fire(&self, value: f64, now: DateTime<Utc>) -> bool {
        self.enabled && value >= self.threshold && !self.has_fired_in_window(now)
    }

    pub fn mark_triggered(&mut self, at: DateTime<Utc>) {
        self.last_triggered_at = Some(at);
        self.touch();
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Changing the rule re-arms the alert
    pub fn set_rule(&mut self, metric: AlertMetric, threshold: f64, window: AlertWindow) {
        self.metric = metric;
        self.threshold = threshold;
        self.window = window;
        self.last_triggered_at = None;
        self.touch();
    }

    pub fn set_channels(&mut self, channels: NotificationChannels) {
        self.channels = channels;
        self.touch();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::domain::api_key::ApiKeyId;
    use crate::domain::usage::UsageRecord;

    fn alert(metric: AlertMetric, threshold: f64, window: AlertWindow) -> Alert {
        Alert::new(
            AlertId::generate(),
            ProjectId::generate(),
            "Alert",
            metric,
            threshold,
            window,
            UserId::generate(),
        )
    }

    #[test]
    fn test_metric_values() {
        let project = ProjectId::generate();
        let key = ApiKeyId::generate();
        let records = vec![
            UsageRecord::new(project.clone(), key.clone(), "gpt-4o")
                .with_tokens(100, 50)
                .with_cost_micros(1_500_000),
            UsageRecord::new(project, key, "gpt-4o")
                .with_tokens(10, 0)
                .with_error("boom"),
        ];
        let aggregate = UsageAggregate::from_records(&records);

        assert_eq!(AlertMetric::RequestCount.value_of(&aggregate), 2.0);
        assert_eq!(AlertMetric::TokenCount.value_of(&aggregate), 160.0);
        assert_eq!(AlertMetric::ErrorRate.value_of(&aggregate), 50.0);
        assert!((AlertMetric::Spend.value_of(&aggregate) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_should_fire_at_threshold() {
        let alert = alert(AlertMetric::RequestCount, 10.0, AlertWindow::Day);
        let now = Utc::now();

        assert!(!alert.should_fire(9.0, now));
        assert!(alert.should_fire(10.0, now));
        assert!(alert.should_fire(11.0, now));
    }

    #[test]
    fn test_fires_once_per_window() {
        let mut alert = alert(AlertMetric::Spend, 1.0, AlertWindow::Hour);
        let now = Utc.with_ymd_and_hms(2024, 5, 15, 13, 10, 0).unwrap();

        alert.mark_triggered(now);

        assert!(!alert.should_fire(5.0, now + Duration::minutes(20)));
        assert!(alert.should_fire(5.0, now + Duration::minutes(50)));
    }

    #[test]
    fn test_disabled_alert_never_fires() {
        let mut alert = alert(AlertMetric::TokenCount, 0.0, AlertWindow::Month);
        alert.set_enabled(false);

        assert!(!alert.should_fire(1_000.0, Utc::now()));
    }

    #[test]
    fn test_set_rule_rearms() {
        let mut alert = alert(AlertMetric::TokenCount, 5.0, AlertWindow::Day);
        alert.mark_triggered(Utc::now());

        alert.set_rule(AlertMetric::TokenCount, 50.0, AlertWindow::Day);

        assert!(alert.last_triggered_at().is_none());
        assert_eq!(alert.threshold(), 50.0);
    }

    #[test]
    fn test_channels() {
        assert!(NotificationChannels::default().is_empty());
        let channels = NotificationChannels::new(vec![])
            .with_webhook("https://hooks.example.com", Some("s3cret".into()));

        assert!(!channels.is_empty());
        assert_eq!(channels.webhook_secret.as_deref(), Some("s3cret"));
    }
}
