//! Payload describing a fired alert

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::model::micros_to_usd;

use super::cost_alert::CostAlert;
use super::entity::{Alert, NotificationChannels};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Alert,
    CostAlert,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::CostAlert => "cost_alert",
        }
    }

    /// Webhook event name
    pub fn event(&self) -> &'static str {
        match self {
            Self::Alert => "alert.triggered",
            Self::CostAlert => "cost_alert.triggered",
        }
    }
}

/// Sent to every channel of a fired alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertNotification {
    pub kind: AlertKind,
    pub alert_id: String,
    pub project_id: String,
    pub project_name: String,
    /// Alert name, or a generated label for cost alerts
    pub name: String,
    /// `request_count`, `token_count`, `error_rate`, `spend` or `cost`
    pub metric: String,
    pub threshold: f64,
    pub value: f64,
    /// Alert window or cost alert period
    pub period: String,
    pub period_start: DateTime<Utc>,
    pub triggered_at: DateTime<Utc>,
    #[serde(skip)]
    pub channels: NotificationChannels,
}

impl AlertNotification {
    pub fn for_alert(
        alert: &Alert,
        project_name: &str,
        value: f64,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind: AlertKind::Alert,
            alert_id: alert.id().to_string(),
            project_id: alert.project_id().to_string(),
            project_name: project_name.to_string(),
            name: alert.name().to_string(),
            metric: alert.metric().as_str().to_string(),
            threshold: alert.threshold(),
            value,
            period: alert.window().as_str().to_string(),
            period_start: alert.window().start_at(triggered_at),
            triggered_at,
            channels: alert.channels().clone(),
        }
    }

    pub fn for_cost_alert(
        alert: &CostAlert,
        project_name: &str,
        spend_micros: i64,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        let period = alert.period().as_str();

        Self {
            kind: AlertKind::CostAlert,
            alert_id: alert.id().to_string(),
            project_id: alert.project_id().to_string(),
            project_name: project_name.to_string(),
            name: format!("{} spend over ${:.2}", period, alert.threshold_usd()),
            metric: "cost".to_string(),
            threshold: alert.threshold_usd(),
            value: micros_to_usd(spend_micros),
            period: period.to_string(),
            period_start: alert.period_start(triggered_at),
            triggered_at,
            channels: alert.channels().clone(),
        }
    }

    pub fn subject(&self) -> String {
        format!("[{}] Alert triggered: {}", self.project_name, self.name)
    }

    /// Plain text body for e-mail delivery
    pub fn text_body(&self) -> String {
        format!(
            "{name}\n\nProject: {project}\nMetric: {metric}\nThreshold: {threshold}\nCurrent value: {value:.4}\nPeriod: {period} (since {start})\nTriggered at: {at}\n",
            name = self.name,
            project = self.project_name,
            metric = self.metric,
            threshold = self.threshold,
            value = self.value,
            period = self.period,
            start = self.period_start.to_rfc3339(),
            at = self.triggered_at.to_rfc3339(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::{
        AlertId, AlertMetric, AlertWindow, CostAlertId, CostAlertPeriod,
    };
    use crate::domain::project::ProjectId;
    use crate::domain::user::UserId;

    #[test]
    fn test_alert_notification() {
        let alert = Alert::new(
            AlertId::generate(),
            ProjectId::generate(),
            "Too many requests",
            AlertMetric::RequestCount,
            100.0,
            AlertWindow::Hour,
            UserId::generate(),
        )
        .with_channels(NotificationChannels::new(vec!["ops@example.com".into()]));
        let now = Utc::now();

        let notification = AlertNotification::for_alert(&alert, "Acme", 120.0, now);

        assert_eq!(notification.kind.event(), "alert.triggered");
        assert_eq!(notification.metric, "request_count");
        assert_eq!(notification.period, "hour");
        assert_eq!(notification.channels.emails, vec!["ops@example.com"]);
        assert_eq!(notification.subject(), "[Acme] Alert triggered: Too many requests");
        assert!(notification.text_body().contains("Current value: 120.0000"));
    }

    #[test]
    fn test_cost_alert_notification() {
        let alert = CostAlert::new(
            CostAlertId::generate(),
            ProjectId::generate(),
            10_000_000,
            CostAlertPeriod::Monthly,
            UserId::generate(),
        );

        let notification =
            AlertNotification::for_cost_alert(&alert, "Acme", 12_340_000, Utc::now());

        assert_eq!(notification.kind, AlertKind::CostAlert);
        assert_eq!(notification.name, "monthly spend over $10.00");
        assert!((notification.value - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_channels_not_serialized() {
        let alert = CostAlert::new(
            CostAlertId::generate(),
            ProjectId::generate(),
            1,
            CostAlertPeriod::Daily,
            UserId::generate(),
        )
        .with_channels(
            NotificationChannels::new(vec![]).with_webhook("https://x.example.com", Some("k".into())),
        );

        let json = serde_json::to_value(AlertNotification::for_cost_alert(
            &alert,
            "Acme",
            1,
            Utc::now(),
        ))
        .unwrap();

        assert!(json.get("channels").is_none());
        assert_eq!(json["kind"], "cost_alert");
    }
}
