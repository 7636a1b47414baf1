//! Domain layer - Core business logic and entities

pub mod alert;
pub mod api_key;
pub mod audit;
pub mod error;
pub mod id;
pub mod invoice;
pub mod model;
pub mod project;
pub mod storage;
pub mod usage;
pub mod user;

pub use error::DomainError;
pub use storage::{Storage, StorageEntity, StorageKey};
