//! Alert domain - metric alerts, cost alerts and their notifications

mod cost_alert;
mod entity;
mod notification;
mod period;
mod validation;

pub use cost_alert::{CostAlert, CostAlertId};
pub use entity::{Alert, AlertId, AlertMetric, NotificationChannels};
pub use notification::{AlertKind, AlertNotification};
pub use period::{AlertWindow, CostAlertPeriod};
pub use validation::{
    validate_alert_name, validate_cost_threshold, validate_recipients, validate_threshold,
    validate_webhook_url, AlertValidationError, MAX_ALERT_NAME_LENGTH, MAX_ALERT_RECIPIENTS,
};
