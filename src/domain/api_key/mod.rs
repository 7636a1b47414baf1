//! API Key domain
//!
//! Project-scoped keys used to authenticate against the gateway surface.

mod entity;
mod repository;
mod validation;

pub use entity::{ApiKey, ApiKeyId, ApiKeyStatus};
pub use repository::ApiKeyRepository;
pub use validation::{validate_api_key_name, validate_expiration_days, ApiKeyValidationError};
