//! Storage-backed user repository implementation

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::storage::Storage;
use crate::domain::user::{normalize_email, User, UserId, UserRepository};
use crate::domain::DomainError;

/// Storage-backed implementation of UserRepository
#[derive(Debug)]
pub struct StorageUserRepository {
    storage: Arc<dyn Storage<User>>,
}

impl StorageUserRepository {
    pub fn new(storage: Arc<dyn Storage<User>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl UserRepository for StorageUserRepository {
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        self.storage.get(id).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = normalize_email(email);
        let matches = self.storage.find(&|u: &User| u.email() == email).await?;
        Ok(matches.into_iter().next())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        if self.email_exists(user.email()).await? {
            return Err(DomainError::conflict(format!(
                "An account with email '{}' already exists",
                user.email()
            )));
        }

        self.storage.create(user).await
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        if !self.storage.exists(user.id()).await? {
            return Err(DomainError::not_found(format!(
                "User '{}' not found",
                user.id()
            )));
        }

        self.storage.update(user.clone()).await
    }

    async fn delete(&self, id: &UserId) -> Result<bool, DomainError> {
        self.storage.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::InMemoryStorage;

    fn repository() -> StorageUserRepository {
        StorageUserRepository::new(Arc::new(InMemoryStorage::<User>::new()))
    }

    fn user(email: &str) -> User {
        User::new(UserId::generate(), "Ada", email, "hash")
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = repository();
        let created = repo.create(user("ada@example.com")).await.unwrap();

        let fetched = repo.get(created.id()).await.unwrap().unwrap();
        assert_eq!(fetched.email(), "ada@example.com");
    }

    #[tokio::test]
    async fn test_get_by_email_is_case_insensitive() {
        let repo = repository();
        repo.create(user("ada@example.com")).await.unwrap();

        assert!(repo.get_by_email(" ADA@Example.com ").await.unwrap().is_some());
        assert!(repo.get_by_email("bob@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = repository();
        repo.create(user("ada@example.com")).await.unwrap();

        let result = repo.create(user("Ada@Example.com")).await;
        assert!(matches!(result, Err(DomainError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = repository();

        let result = repo.update(&user("ghost@example.com")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = repository();
        let created = repo.create(user("ada@example.com")).await.unwrap();

        assert!(repo.delete(created.id()).await.unwrap());
        assert!(!repo.delete(created.id()).await.unwrap());
    }
}
