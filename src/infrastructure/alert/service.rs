//! Alert service - alert and cost alert CRUD plus threshold evaluation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::alert::{
    validate_alert_name, validate_cost_threshold, validate_recipients, validate_threshold,
    validate_webhook_url, Alert, AlertId, AlertMetric, AlertNotification, AlertWindow, CostAlert,
    CostAlertId, CostAlertPeriod, NotificationChannels,
};
use crate::domain::project::{Project, ProjectId};
use crate::domain::storage::Storage;
use crate::domain::usage::UsageAggregate;
use crate::domain::user::UserId;
use crate::domain::DomainError;
use crate::infrastructure::observability::record_alert_triggered;
use crate::infrastructure::usage::UsageService;

use super::notifier::AlertNotifier;

/// Channel settings shared by both alert kinds
#[derive(Debug, Clone, Default)]
pub struct ChannelsRequest {
    pub emails: Vec<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
}

impl ChannelsRequest {
    fn into_channels(self) -> Result<NotificationChannels, DomainError> {
        let emails: Vec<String> = self
            .emails
            .iter()
            .map(|e| e.trim().to_lowercase())
            .collect();
        validate_recipients(&emails)?;

        let mut channels = NotificationChannels::new(emails);
        if let Some(url) = self.webhook_url.filter(|u| !u.trim().is_empty()) {
            validate_webhook_url(&url)?;
            let secret = self.webhook_secret.filter(|s| !s.is_empty());
            channels = channels.with_webhook(url.trim(), secret);
        }

        Ok(channels)
    }
}

#[derive(Debug, Clone)]
pub struct CreateAlertRequest {
    pub name: String,
    pub metric: AlertMetric,
    pub threshold: f64,
    pub window: AlertWindow,
    pub channels: ChannelsRequest,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAlertRequest {
    pub name: Option<String>,
    pub metric: Option<AlertMetric>,
    pub threshold: Option<f64>,
    pub window: Option<AlertWindow>,
    pub channels: Option<ChannelsRequest>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct CreateCostAlertRequest {
    pub threshold_usd: f64,
    pub period: CostAlertPeriod,
    pub channels: ChannelsRequest,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateCostAlertRequest {
    pub threshold_usd: Option<f64>,
    pub period: Option<CostAlertPeriod>,
    pub channels: Option<ChannelsRequest>,
    pub enabled: Option<bool>,
}

/// Storages the alert service reads and writes
#[derive(Debug, Clone)]
pub struct AlertStores {
    pub alerts: Arc<dyn Storage<Alert>>,
    pub cost_alerts: Arc<dyn Storage<CostAlert>>,
    pub projects: Arc<dyn Storage<Project>>,
}

#[derive(Debug)]
pub struct AlertService {
    stores: AlertStores,
    usage: Arc<UsageService>,
    notifier: Arc<dyn AlertNotifier>,
}

impl AlertService {
    pub fn new(
        stores: AlertStores,
        usage: Arc<UsageService>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            stores,
            usage,
            notifier,
        }
    }

    // Alerts

    pub async fn list_alerts(&self, project_id: &ProjectId) -> Result<Vec<Alert>, DomainError> {
        let mut alerts = self
            .stores
            .alerts
            .find(&|a: &Alert| a.project_id() == project_id)
            .await?;
        alerts.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(alerts)
    }

    pub async fn get_alert(
        &self,
        project_id: &ProjectId,
        id: &AlertId,
    ) -> Result<Alert, DomainError> {
        self.stores
            .alerts
            .get(id)
            .await?
            .filter(|a| a.project_id() == project_id)
            .ok_or_else(|| DomainError::not_found(format!("Alert '{}' not found", id)))
    }

    pub async fn create_alert(
        &self,
        project_id: &ProjectId,
        request: CreateAlertRequest,
        created_by: &UserId,
    ) -> Result<Alert, DomainError> {
        validate_alert_name(&request.name)?;
        validate_threshold(request.metric, request.threshold)?;
        let channels = request.channels.into_channels()?;

        let mut alert = Alert::new(
            AlertId::generate(),
            project_id.clone(),
            request.name.trim(),
            request.metric,
            request.threshold,
            request.window,
            created_by.clone(),
        )
        .with_channels(channels);
        alert.set_enabled(request.enabled);

        let created = self.stores.alerts.create(alert).await?;
        info!(
            alert_id = %created.id(),
            project_id = %project_id,
            metric = %created.metric(),
            threshold = created.threshold(),
            "Alert created"
        );
        Ok(created)
    }

    pub async fn update_alert(
        &self,
        project_id: &ProjectId,
        id: &AlertId,
        request: UpdateAlertRequest,
    ) -> Result<Alert, DomainError> {
        let mut alert = self.get_alert(project_id, id).await?;

        if let Some(name) = request.name {
            validate_alert_name(&name)?;
            alert.set_name(name.trim());
        }

        if request.metric.is_some() || request.threshold.is_some() || request.window.is_some() {
            let metric = request.metric.unwrap_or(alert.metric());
            let threshold = request.threshold.unwrap_or(alert.threshold());
            let window = request.window.unwrap_or(alert.window());
            validate_threshold(metric, threshold)?;
            alert.set_rule(metric, threshold, window);
        }

        if let Some(channels) = request.channels {
            alert.set_channels(channels.into_channels()?);
        }

        if let Some(enabled) = request.enabled {
            alert.set_enabled(enabled);
        }

        let updated = self.stores.alerts.update(alert).await?;
        info!(alert_id = %id, project_id = %project_id, "Alert updated");
        Ok(updated)
    }

    pub async fn delete_alert(&self, project_id: &ProjectId, id: &AlertId) -> Result<(), DomainError> {
        let alert = self.get_alert(project_id, id).await?;
        self.stores.alerts.delete(alert.id()).await?;
        info!(alert_id = %id, project_id = %project_id, "Alert deleted");
        Ok(())
    }

    // Cost alerts

    pub async fn list_cost_alerts(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<CostAlert>, DomainError> {
        let mut alerts = self
            .stores
            .cost_alerts
            .find(&|a: &CostAlert| a.project_id() == project_id)
            .await?;
        alerts.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(alerts)
    }

    pub async fn get_cost_alert(
        &self,
        project_id: &ProjectId,
        id: &CostAlertId,
    ) -> Result<CostAlert, DomainError> {
        self.stores
            .cost_alerts
            .get(id)
            .await?
            .filter(|a| a.project_id() == project_id)
            .ok_or_else(|| DomainError::not_found(format!("Cost alert '{}' not found", id)))
    }

    pub async fn create_cost_alert(
        &self,
        project_id: &ProjectId,
        request: CreateCostAlertRequest,
        created_by: &UserId,
    ) -> Result<CostAlert, DomainError> {
        let threshold_micros = validate_cost_threshold(request.threshold_usd)?;
        let channels = request.channels.into_channels()?;

        let mut alert = CostAlert::new(
            CostAlertId::generate(),
            project_id.clone(),
            threshold_micros,
            request.period,
            created_by.clone(),
        )
        .with_channels(channels);
        alert.set_enabled(request.enabled);

        let created = self.stores.cost_alerts.create(alert).await?;
        info!(
            cost_alert_id = %created.id(),
            project_id = %project_id,
            threshold_usd = created.threshold_usd(),
            period = created.period().as_str(),
            "Cost alert created"
        );
        Ok(created)
    }

    pub async fn update_cost_alert(
        &self,
        project_id: &ProjectId,
        id: &CostAlertId,
        request: UpdateCostAlertRequest,
    ) -> Result<CostAlert, DomainError> {
        let mut alert = self.get_cost_alert(project_id, id).await?;

        if request.threshold_usd.is_some() || request.period.is_some() {
            let threshold_micros = match request.threshold_usd {
                Some(usd) => validate_cost_threshold(usd)?,
                None => alert.threshold_micros(),
            };
            let period = request.period.unwrap_or(alert.period());
            alert.set_budget(threshold_micros, period);
        }

        if let Some(channels) = request.channels {
            alert.set_channels(channels.into_channels()?);
        }

        if let Some(enabled) = request.enabled {
            alert.set_enabled(enabled);
        }

        let updated = self.stores.cost_alerts.update(alert).await?;
        info!(cost_alert_id = %id, project_id = %project_id, "Cost alert updated");
        Ok(updated)
    }

    pub async fn delete_cost_alert(
        &self,
        project_id: &ProjectId,
        id: &CostAlertId,
    ) -> Result<(), DomainError> {
        let alert = self.get_cost_alert(project_id, id).await?;
        self.stores.cost_alerts.delete(alert.id()).await?;
        info!(cost_alert_id = %id, project_id = %project_id, "Cost alert deleted");
        Ok(())
    }

    // Evaluation

    /// Fires every enabled alert whose threshold is reached and that has not
    /// fired yet in its current window or period. Delivery failures are logged.
    pub async fn evaluate(
        &self,
        project_id: &ProjectId,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlertNotification>, DomainError> {
        let alerts = self
            .stores
            .alerts
            .find(&|a: &Alert| a.project_id() == project_id && a.is_enabled())
            .await?;
        let cost_alerts = self
            .stores
            .cost_alerts
            .find(&|a: &CostAlert| a.project_id() == project_id && a.is_enabled())
            .await?;

        if alerts.is_empty() && cost_alerts.is_empty() {
            return Ok(Vec::new());
        }

        let project_name = self
            .stores
            .projects
            .get(project_id)
            .await?
            .map(|p| p.name().to_string())
            .unwrap_or_else(|| project_id.to_string());

        let mut aggregates: Vec<(DateTime<Utc>, UsageAggregate)> = Vec::new();
        let mut fired = Vec::new();

        for mut alert in alerts {
            let since = alert.window().start_at(now);
            let aggregate = self.aggregate_cached(&mut aggregates, project_id, since).await?;
            let value = alert.metric().value_of(&aggregate);

            if !alert.should_fire(value, now) {
                continue;
            }

            alert.mark_triggered(now);
            let alert = self.stores.alerts.update(alert).await?;
            debug!(alert_id = %alert.id(), value, "Alert threshold reached");
            fired.push(AlertNotification::for_alert(&alert, &project_name, value, now));
        }

        for mut alert in cost_alerts {
            let since = alert.period_start(now);
            let aggregate = self.aggregate_cached(&mut aggregates, project_id, since).await?;

            if !alert.should_fire(aggregate.total_cost_micros, now) {
                continue;
            }

            alert.mark_triggered(now);
            let alert = self.stores.cost_alerts.update(alert).await?;
            debug!(cost_alert_id = %alert.id(), spend_micros = aggregate.total_cost_micros, "Cost alert threshold reached");
            fired.push(AlertNotification::for_cost_alert(
                &alert,
                &project_name,
                aggregate.total_cost_micros,
                now,
            ));
        }

        for notification in &fired {
            info!(
                alert_id = %notification.alert_id,
                project_id = %project_id,
                event = notification.kind.event(),
                "Alert triggered"
            );
            record_alert_triggered(notification.kind.as_str());
            if let Err(e) = self.notifier.notify(notification).await {
                warn!(alert_id = %notification.alert_id, error = %e, "Alert notification failed");
            }
        }

        Ok(fired)
    }

    async fn aggregate_cached(
        &self,
        cache: &mut Vec<(DateTime<Utc>, UsageAggregate)>,
        project_id: &ProjectId,
        since: DateTime<Utc>,
    ) -> Result<UsageAggregate, DomainError> {
        if let Some((_, aggregate)) = cache.iter().find(|(start, _)| *start == since) {
            return Ok(aggregate.clone());
        }

        let aggregate = self.usage.aggregate_since(project_id, since).await?;
        cache.push((since, aggregate.clone()));
        Ok(aggregate)
    }
}
