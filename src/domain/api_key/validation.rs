//! API key validation utilities

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiKeyValidationError {
    #[error("API key name cannot be empty")]
    EmptyName,

    #[error("API key name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Expiration must be between {min} and {max} days")]
    ExpirationOutOfRange { min: u32, max: u32 },
}

impl From<ApiKeyValidationError> for DomainError {
    fn from(err: ApiKeyValidationError) -> Self {
        let field = match err {
            ApiKeyValidationError::EmptyName | ApiKeyValidationError::NameTooLong(_) => "name",
            ApiKeyValidationError::ExpirationOutOfRange { .. } => "expires_in_days",
        };
        DomainError::validation_field(field, err.to_string())
    }
}

pub const MAX_API_KEY_NAME_LENGTH: usize = 100;
pub const MIN_EXPIRATION_DAYS: u32 = 1;
pub const MAX_EXPIRATION_DAYS: u32 = 365;

pub fn validate_api_key_name(name: &str) -> Result<(), ApiKeyValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ApiKeyValidationError::EmptyName);
    }

    if name.chars().count() > MAX_API_KEY_NAME_LENGTH {
        return Err(ApiKeyValidationError::NameTooLong(MAX_API_KEY_NAME_LENGTH));
    }

    Ok(())
}

pub fn validate_expiration_days(days: u32) -> Result<(), ApiKeyValidationError> {
    if !(MIN_EXPIRATION_DAYS..=MAX_EXPIRATION_DAYS).contains(&days) {
        return Err(ApiKeyValidationError::ExpirationOutOfRange {
            min: MIN_EXPIRATION_DAYS,
            max: MAX_EXPIRATION_DAYS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_api_key_name() {
        assert!(validate_api_key_name("Production").is_ok());
        assert_eq!(validate_api_key_name(""), Err(ApiKeyValidationError::EmptyName));
        assert_eq!(
            validate_api_key_name(&"k".repeat(101)),
            Err(ApiKeyValidationError::NameTooLong(100))
        );
    }

    #[test]
    fn test_validate_expiration_days() {
        assert!(validate_expiration_days(1).is_ok());
        assert!(validate_expiration_days(365).is_ok());
        assert!(validate_expiration_days(0).is_err());
        assert!(validate_expiration_days(366).is_err());
    }
}
