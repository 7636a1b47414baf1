//! Catalog identifier validation

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::domain::DomainError;

/// Maximum length for model and provider IDs
pub const MAX_CATALOG_ID_LENGTH: usize = 64;

/// Lowercase alphanumerics separated by single hyphens or dots
static CATALOG_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+([.-][a-z0-9]+)*$").unwrap());

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelValidationError {
    #[error("Catalog ID cannot be empty")]
    EmptyId,

    #[error("Catalog ID too long: {length} characters (max {max})")]
    IdTooLong { length: usize, max: usize },

    #[error("Invalid catalog ID format '{id}': lowercase alphanumerics separated by '-' or '.'")]
    InvalidIdFormat { id: String },
}

impl From<ModelValidationError> for DomainError {
    fn from(err: ModelValidationError) -> Self {
        DomainError::invalid_id(err.to_string())
    }
}

pub fn validate_catalog_id(id: &str) -> Result<(), ModelValidationError> {
    if id.is_empty() {
        return Err(ModelValidationError::EmptyId);
    }

    if id.len() > MAX_CATALOG_ID_LENGTH {
        return Err(ModelValidationError::IdTooLong {
            length: id.len(),
            max: MAX_CATALOG_ID_LENGTH,
        });
    }

    if !CATALOG_ID_PATTERN.is_match(id) {
        return Err(ModelValidationError::InvalidIdFormat { id: id.to_string() });
    }

    Ok(())
}
