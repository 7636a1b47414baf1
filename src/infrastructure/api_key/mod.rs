//! API Key infrastructure module
//!
//! Key generation and hashing, the storage-backed repository and the
//! project-scoped key service.

mod generator;
mod service;
mod storage_repository;

pub use generator::{ApiKeyGenerator, GeneratedApiKey, LIVE_KEY_PREFIX};
pub use service::{ApiKeyService, CreateApiKeyRequest, CreateApiKeyResult};
pub use storage_repository::StorageApiKeyRepository;
