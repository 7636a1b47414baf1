//! Alert validation utilities

use thiserror::Error;

use crate::domain::model::usd_to_micros;
use crate::domain::user::validate_email;
use crate::domain::DomainError;

use super::entity::AlertMetric;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlertValidationError {
    #[error("Alert name cannot be empty")]
    EmptyName,

    #[error("Alert name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Threshold must be a non-negative number")]
    NegativeThreshold,

    #[error("Error rate threshold cannot exceed 100 percent")]
    ErrorRateAbove100,

    #[error("Cost threshold must be greater than zero")]
    NonPositiveCostThreshold,

    #[error("Cost threshold must be at least $0.000001")]
    CostThresholdBelowMinimum,

    #[error("Invalid notification email '{0}'")]
    InvalidRecipient(String),

    #[error("At most {0} notification emails are allowed")]
    TooManyRecipients(usize),

    #[error("Webhook URL must be an http or https URL")]
    InvalidWebhookUrl,
}

impl From<AlertValidationError> for DomainError {
    fn from(err: AlertValidationError) -> Self {
        let field = match err {
            AlertValidationError::EmptyName | AlertValidationError::NameTooLong(_) => "name",
            AlertValidationError::NegativeThreshold | AlertValidationError::ErrorRateAbove100 => {
                "threshold"
            }
            AlertValidationError::NonPositiveCostThreshold
            | AlertValidationError::CostThresholdBelowMinimum => "threshold_usd",
            AlertValidationError::InvalidRecipient(_)
            | AlertValidationError::TooManyRecipients(_) => "emails",
            AlertValidationError::InvalidWebhookUrl => "webhook_url",
        };
        DomainError::validation_field(field, err.to_string())
    }
}

pub const MAX_ALERT_NAME_LENGTH: usize = 100;
pub const MAX_ALERT_RECIPIENTS: usize = 10;
const MAX_WEBHOOK_URL_LENGTH: usize = 2048;

pub fn validate_alert_name(name: &str) -> Result<(), AlertValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(AlertValidationError::EmptyName);
    }

    if name.chars().count() > MAX_ALERT_NAME_LENGTH {
        return Err(AlertValidationError::NameTooLong(MAX_ALERT_NAME_LENGTH));
    }

    Ok(())
}

/// Thresholds are non-negative; error rates are percentages
pub fn validate_threshold(metric: AlertMetric, threshold: f64) -> Result<(), AlertValidationError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AlertValidationError::NegativeThreshold);
    }

    if metric == AlertMetric::ErrorRate && threshold > 100.0 {
        return Err(AlertValidationError::ErrorRateAbove100);
    }

    Ok(())
}

/// Returns the threshold in micro-dollars; it must not round down to zero
pub fn validate_cost_threshold(threshold_usd: f64) -> Result<i64, AlertValidationError> {
    if !threshold_usd.is_finite() || threshold_usd <= 0.0 {
        return Err(AlertValidationError::NonPositiveCostThreshold);
    }

    let threshold_micros = usd_to_micros(threshold_usd);
    if threshold_micros < 1 {
        return Err(AlertValidationError::CostThresholdBelowMinimum);
    }

    Ok(threshold_micros)
}

pub fn validate_recipients(emails: &[String]) -> Result<(), AlertValidationError> {
    if emails.len() > MAX_ALERT_RECIPIENTS {
        return Err(AlertValidationError::TooManyRecipients(MAX_ALERT_RECIPIENTS));
    }

    for email in emails {
        validate_email(email).map_err(|_| AlertValidationError::InvalidRecipient(email.clone()))?;
    }

    Ok(())
}

pub fn validate_webhook_url(url: &str) -> Result<(), AlertValidationError> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .ok_or(AlertValidationError::InvalidWebhookUrl)?;

    if rest.is_empty()
        || rest.starts_with('/')
        || url.len() > MAX_WEBHOOK_URL_LENGTH
        || url.chars().any(char::is_whitespace)
    {
        return Err(AlertValidationError::InvalidWebhookUrl);
    }

    Ok(())
}
