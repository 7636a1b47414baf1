//! API Key service
//!
//! Provides high-level operations for project-scoped API key management.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::domain::api_key::{
    validate_api_key_name, validate_expiration_days, ApiKey, ApiKeyId, ApiKeyRepository,
};
use crate::domain::project::ProjectId;
use crate::domain::user::UserId;
use crate::domain::DomainError;

use super::generator::ApiKeyGenerator;

/// Result of creating a new API key
#[derive(Debug)]
pub struct CreateApiKeyResult {
    /// The API key entity (without the secret)
    pub api_key: ApiKey,
    /// The full secret key (only returned once)
    pub secret: String,
}

#[derive(Debug, Clone)]
pub struct CreateApiKeyRequest {
    pub name: String,
    pub expires_in_days: Option<u32>,
}

/// API Key service for managing API keys
#[derive(Debug)]
pub struct ApiKeyService<R>
where
    R: ApiKeyRepository,
{
    repository: Arc<R>,
    generator: ApiKeyGenerator,
}

impl<R: ApiKeyRepository> ApiKeyService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            generator: ApiKeyGenerator::live(),
        }
    }

    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub async fn create(
        &self,
        project_id: &ProjectId,
        request: CreateApiKeyRequest,
        created_by: &UserId,
    ) -> Result<CreateApiKeyResult, DomainError> {
        validate_api_key_name(&request.name)?;
        if let Some(days) = request.expires_in_days {
            validate_expiration_days(days)?;
        }

        let generated = self.generator.generate();
        let mut api_key = ApiKey::new(
            ApiKeyId::generate(),
            request.name.trim(),
            project_id.clone(),
            &generated.hash,
            &generated.prefix,
            created_by.clone(),
        );

        if let Some(days) = request.expires_in_days {
            api_key = api_key.with_expiration(Utc::now() + Duration::days(days as i64));
        }

        let created = self.repository.create(api_key).await?;
        info!(
            api_key_id = %created.id(),
            project_id = %project_id,
            prefix = %created.key_prefix(),
            "API key created"
        );

        Ok(CreateApiKeyResult {
            api_key: created,
            secret: generated.key,
        })
    }

    pub async fn list(&self, project_id: &ProjectId) -> Result<Vec<ApiKey>, DomainError> {
        self.repository.list_by_project(project_id).await
    }

    /// Keys of other projects are reported as missing
    pub async fn get(&self, project_id: &ProjectId, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        self.repository
            .get(id)
            .await?
            .filter(|key| key.project_id() == project_id)
            .ok_or_else(|| DomainError::not_found(format!("API key '{}' not found", id)))
    }

    pub async fn revoke(&self, project_id: &ProjectId, id: &ApiKeyId) -> Result<ApiKey, DomainError> {
        let mut key = self.get(project_id, id).await?;

        key.revoke();
        info!(api_key_id = %id, project_id = %project_id, "API key revoked");

        self.repository.update(&key).await
    }

    pub async fn delete(&self, project_id: &ProjectId, id: &ApiKeyId) -> Result<(), DomainError> {
        let key = self.get(project_id, id).await?;

        self.repository.delete(key.id()).await?;
        info!(api_key_id = %id, project_id = %project_id, "API key deleted");
        Ok(())
    }

    /// Used when a project is deleted
    pub async fn delete_for_project(&self, project_id: &ProjectId) -> Result<usize, DomainError> {
        let keys = self.repository.list_by_project(project_id).await?;

        for key in &keys {
            self.repository.delete(key.id()).await?;
        }

        Ok(keys.len())
    }

    /// Resolve a presented secret to an active key, recording its use
    pub async fn validate(&self, key_secret: &str) -> Result<Option<ApiKey>, DomainError> {
        let Some(prefix) = self.generator.extract_prefix(key_secret) else {
            debug!("API key has unexpected format");
            return Ok(None);
        };

        debug!(prefix = %prefix, "Validating API key");

        let Some(key) = self.repository.get_by_prefix(prefix).await? else {
            return Ok(None);
        };

        if !self.generator.verify_key(key_secret, key.secret_hash()) {
            debug!("API key hash verification failed");
            return Ok(None);
        }

        if !key.is_valid() {
            debug!(api_key_id = %key.id(), status = ?key.status(), "API key is not valid");
            return Ok(None);
        }

        if let Err(e) = self.repository.record_usage(key.id()).await {
            warn!(api_key_id = %key.id(), error = %e, "Failed to record API key usage");
        }

        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::Storage;
    use crate::infrastructure::api_key::StorageApiKeyRepository;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service() -> (
        ApiKeyService<StorageApiKeyRepository>,
        Arc<InMemoryStorage<ApiKey>>,
    ) {
        let storage = Arc::new(InMemoryStorage::<ApiKey>::new());
        let repo = Arc::new(StorageApiKeyRepository::new(storage.clone()));
        (ApiKeyService::new(repo), storage)
    }

    fn request(name: &str, expires_in_days: Option<u32>) -> CreateApiKeyRequest {
        CreateApiKeyRequest {
            name: name.to_string(),
            expires_in_days,
        }
    }

    #[tokio::test]
    async fn test_create_and_validate() {
        let (service, _) = service();
        let project = ProjectId::generate();

        let created = service
            .create(&project, request("CI", None), &UserId::generate())
            .await
            .unwrap();

        assert!(created.secret.starts_with("gw_live_"));
        assert!(created.api_key.expires_at().is_none());

        let validated = service.validate(&created.secret).await.unwrap().unwrap();
        assert_eq!(validated.id(), created.api_key.id());
        assert_eq!(validated.project_id(), &project);
    }

    #[tokio::test]
    async fn test_create_with_expiration() {
        let (service, _) = service();

        let created = service
            .create(&ProjectId::generate(), request("Temp", Some(30)), &UserId::generate())
            .await
            .unwrap();

        let expires_at = created.api_key.expires_at().unwrap();
        let days = (expires_at - Utc::now()).num_days();
        assert!((29..=30).contains(&days));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (service, _) = service();
        let project = ProjectId::generate();
        let user = UserId::generate();

        assert!(matches!(
            service.create(&project, request(" ", None), &user).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            service.create(&project, request("Key", Some(0)), &user).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(matches!(
            service.create(&project, request("Key", Some(366)), &user).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_secrets() {
        let (service, _) = service();
        let created = service
            .create(&ProjectId::generate(), request("CI", None), &UserId::generate())
            .await
            .unwrap();

        assert!(service.validate("garbage").await.unwrap().is_none());

        // Same lookup prefix, different secret
        let tampered = format!("{}XXXX", &created.secret[..created.secret.len() - 4]);
        assert!(service.validate(&tampered).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revoked_key_fails_validation() {
        let (service, _) = service();
        let project = ProjectId::generate();
        let created = service
            .create(&project, request("CI", None), &UserId::generate())
            .await
            .unwrap();

        let revoked = service.revoke(&project, created.api_key.id()).await.unwrap();

        assert!(revoked.revoked_at().is_some());
        assert!(service.validate(&created.secret).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_key_fails_validation() {
        let (service, storage) = service();
        let created = service
            .create(&ProjectId::generate(), request("CI", None), &UserId::generate())
            .await
            .unwrap();

        let expired = created
            .api_key
            .clone()
            .with_expiration(Utc::now() - Duration::seconds(1));
        storage.update(expired).await.unwrap();

        assert!(service.validate(&created.secret).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_project_scoping() {
        let (service, _) = service();
        let project = ProjectId::generate();
        let other = ProjectId::generate();
        let created = service
            .create(&project, request("CI", None), &UserId::generate())
            .await
            .unwrap();

        assert!(matches!(
            service.get(&other, created.api_key.id()).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete(&other, created.api_key.id()).await,
            Err(DomainError::NotFound { .. })
        ));

        service.delete(&project, created.api_key.id()).await.unwrap();
        assert!(service.list(&project).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_for_project() {
        let (service, _) = service();
        let project = ProjectId::generate();
        let user = UserId::generate();
        service.create(&project, request("a", None), &user).await.unwrap();
        service.create(&project, request("b", None), &user).await.unwrap();

        assert_eq!(service.delete_for_project(&project).await.unwrap(), 2);
        assert!(service.list(&project).await.unwrap().is_empty());
    }
}
