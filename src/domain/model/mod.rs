//! Model domain - provider and model catalog with pricing

mod catalog;
mod entity;
mod validation;

pub use catalog::{default_catalog, ModelCatalog};
pub use entity::{
    micros_to_usd, usd_to_micros, Model, ModelId, ModelProviderInfo, ProviderId, ProviderStatus,
    MICROS_PER_USD,
};
pub use validation::{validate_catalog_id, ModelValidationError};
