//! API Key repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{ApiKey, ApiKeyId};
use crate::domain::project::ProjectId;
use crate::domain::DomainError;

/// Repository trait for API key storage
#[async_trait]
pub trait ApiKeyRepository: Send + Sync + Debug {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError>;

    /// Get an API key by its key prefix (for lookup during authentication)
    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError>;

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError>;

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError>;

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError>;

    /// All keys of a project, newest first
    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<ApiKey>, DomainError>;

    /// Record usage of an API key
    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError>;
}
