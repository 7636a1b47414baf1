//! Storage-backed API key repository implementation

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::api_key::{ApiKey, ApiKeyId, ApiKeyRepository};
use crate::domain::project::ProjectId;
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Storage-backed implementation of ApiKeyRepository
#[derive(Debug)]
pub struct StorageApiKeyRepository {
    storage: Arc<dyn Storage<ApiKey>>,
}

impl StorageApiKeyRepository {
    pub fn new(storage: Arc<dyn Storage<ApiKey>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl ApiKeyRepository for StorageApiKeyRepository {
    async fn get(&self, id: &ApiKeyId) -> Result<Option<ApiKey>, DomainError> {
        self.storage.get(id).await
    }

    async fn get_by_prefix(&self, prefix: &str) -> Result<Option<ApiKey>, DomainError> {
        let matches = self
            .storage
            .find(&|k: &ApiKey| k.key_prefix() == prefix)
            .await?;
        Ok(matches.into_iter().next())
    }

    async fn create(&self, api_key: ApiKey) -> Result<ApiKey, DomainError> {
        if self.get_by_prefix(api_key.key_prefix()).await?.is_some() {
            return Err(DomainError::conflict(format!(
                "API key prefix '{}' already in use",
                api_key.key_prefix()
            )));
        }

        self.storage.create(api_key).await
    }

    async fn update(&self, api_key: &ApiKey) -> Result<ApiKey, DomainError> {
        if !self.storage.exists(api_key.id()).await? {
            return Err(DomainError::not_found(format!(
                "API key '{}' not found",
                api_key.id()
            )));
        }

        self.storage.update(api_key.clone()).await
    }

    async fn delete(&self, id: &ApiKeyId) -> Result<bool, DomainError> {
        self.storage.delete(id).await
    }

    async fn list_by_project(&self, project_id: &ProjectId) -> Result<Vec<ApiKey>, DomainError> {
        let mut keys = self
            .storage
            .find(&|k: &ApiKey| k.project_id() == project_id)
            .await?;
        keys.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(keys)
    }

    async fn record_usage(&self, id: &ApiKeyId) -> Result<(), DomainError> {
        let mut key = self
            .storage
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))?;

        key.record_usage();
        self.storage.update(key).await?;
        Ok(())
    }
}
