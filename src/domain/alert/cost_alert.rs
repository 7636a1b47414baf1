//! Spend alerts over budget periods

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::uuid_id;
use crate::domain::model::micros_to_usd;
use crate::domain::project::ProjectId;
use crate::domain::storage::StorageEntity;
use crate::domain::user::UserId;

use super::entity::NotificationChannels;
use super::period::CostAlertPeriod;

uuid_id!(
    /// Cost alert identifier
    CostAlertId,
    "cost alert"
);

/// Fires once per period when period-to-date spend reaches the threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostAlert {
    id: CostAlertId,
    project_id: ProjectId,
    /// Threshold in micro-dollars
    threshold_micros: i64,
    period: CostAlertPeriod,
    channels: NotificationChannels,
    enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_triggered_at: Option<DateTime<Utc>>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for CostAlert {
    type Key = CostAlertId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl CostAlert {
    pub fn new(
        id: CostAlertId,
        project_id: ProjectId,
        threshold_micros: i64,
        period: CostAlertPeriod,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            project_id,
            threshold_micros,
            period,
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

    pub fn id(&self) -> &CostAlertId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn threshold_micros(&self) -> i64 {
        self.threshold_micros
    }

    pub fn threshold_usd(&self) -> f64 {
        micros_to_usd(self.threshold_micros)
    }

    pub fn period(&self) -> CostAlertPeriod {
        self.period
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

    pub fn period_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.period.start_at(now)
    }

    pub fn has_fired_in_period(&self, now: DateTime<Utc>) -> bool {
        let start = self.period_start(now);
        self.last_triggered_at.is_some_and(|at| at >= start)
    }

    pub fn should_fire(&self, spend_micros: i64, now: DateTime<Utc>) -> bool {
        self.enabled && spend_micros >= self.threshold_micros && !self.has_fired_in_period(now)
    }

    pub fn mark_triggered(&mut self, at: DateTime<Utc>) {
        self.last_triggered_at = Some(at);
        self.touch();
    }

    /// Changing the budget re-arms the alert
    pub fn set_budget(&mut self, threshold_micros: i64, period: CostAlertPeriod) {
        self.threshold_micros = threshold_micros;
        self.period = period;
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
