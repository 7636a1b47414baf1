//! Audit trail service

use std::sync::Arc;

use tracing::{debug, error};

use crate::domain::audit::AuditLog;
use crate::domain::project::ProjectId;
use crate::domain::storage::Storage;
use crate::domain::user::UserId;
use crate::domain::DomainError;

pub const DEFAULT_AUDIT_PAGE_SIZE: usize = 50;
pub const MAX_AUDIT_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct AuditPage {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl AuditPage {
    fn validate(&self) -> Result<(), DomainError> {
        match self.limit {
            Some(limit) if limit == 0 || limit > MAX_AUDIT_PAGE_SIZE => {
                Err(DomainError::validation_field(
                    "limit",
                    format!("limit must be between 1 and {}", MAX_AUDIT_PAGE_SIZE),
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct AuditService {
    storage: Arc<dyn Storage<AuditLog>>,
}

impl AuditService {
    pub fn new(storage: Arc<dyn Storage<AuditLog>>) -> Self {
        Self { storage }
    }

    /// Store an entry. Failures are logged and swallowed so the audited
    /// action itself never fails because of the trail.
    pub async fn record(&self, entry: AuditLog) {
        let action = entry.action();
        let target_id = entry.target_id().to_string();

        match self.storage.create(entry).await {
            Ok(_) => debug!(action = %action, target_id = %target_id, "Audit entry recorded"),
            Err(e) => error!(
                action = %action,
                target_id = %target_id,
                error = %e,
                "Failed to record audit entry"
            ),
        }
    }

    pub async fn list_for_project(
        &self,
        project_id: &ProjectId,
        page: AuditPage,
    ) -> Result<Vec<AuditLog>, DomainError> {
        page.validate()?;
        let entries = self
            .storage
            .find(&|e: &AuditLog| e.project_id() == Some(project_id))
            .await?;
        Ok(paginate(entries, page))
    }

    pub async fn list_for_user(
        &self,
        user_id: &UserId,
        page: AuditPage,
    ) -> Result<Vec<AuditLog>, DomainError> {
        page.validate()?;
        let entries = self
            .storage
            .find(&|e: &AuditLog| e.user_id() == user_id)
            .await?;
        Ok(paginate(entries, page))
    }
}

fn paginate(mut entries: Vec<AuditLog>, page: AuditPage) -> Vec<AuditLog> {
    entries.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    entries
        .into_iter()
        .skip(page.offset.unwrap_or(0))
        .take(page.limit.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE))
        .collect()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::domain::audit::AuditAction;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service() -> AuditService {
        AuditService::new(Arc::new(InMemoryStorage::<AuditLog>::new()))
    }

    #[tokio::test]
    async fn test_project_and_user_listing() {
        let service = service();
        let user = UserId::generate();
        let project = ProjectId::generate();

        service
            .record(AuditLog::new(user.clone(), AuditAction::UserLogin, user.as_str()))
            .await;
        service
            .record(
                AuditLog::new(user.clone(), AuditAction::ProjectCreated, project.as_str())
                    .with_project(project.clone()),
            )
            .await;
        service
            .record(
                AuditLog::new(UserId::generate(), AuditAction::ApiKeyCreated, "key-1")
                    .with_project(project.clone()),
            )
            .await;

        let for_project = service
            .list_for_project(&project, AuditPage::default())
            .await
            .unwrap();
        assert_eq!(for_project.len(), 2);
        assert!(for_project
            .windows(2)
            .all(|w| w[0].created_at() >= w[1].created_at()));

        let for_user = service.list_for_user(&user, AuditPage::default()).await.unwrap();
        assert_eq!(for_user.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination() {
        let service = service();
        let user = UserId::generate();
        for i in 0..5 {
            service
                .record(AuditLog::new(
                    user.clone(),
                    AuditAction::UserUpdated,
                    format!("target-{}", i),
                ))
                .await;
        }

        let page = service
            .list_for_user(
                &user,
                AuditPage {
                    limit: Some(2),
                    offset: Some(4),
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);

        let too_big = service
            .list_for_user(
                &user,
                AuditPage {
                    limit: Some(MAX_AUDIT_PAGE_SIZE + 1),
                    offset: None,
                },
            )
            .await;
        assert!(matches!(too_big, Err(DomainError::Validation { .. })));
    }

    #[derive(Debug)]
    struct FailingStorage;

    #[async_trait]
    impl Storage<AuditLog> for FailingStorage {
        async fn get(&self, _: &crate::domain::audit::AuditLogId) -> Result<Option<AuditLog>, DomainError> {
            Ok(None)
        }

        async fn list(&self) -> Result<Vec<AuditLog>, DomainError> {
            Ok(Vec::new())
        }

        async fn create(&self, _: AuditLog) -> Result<AuditLog, DomainError> {
            Err(DomainError::storage("database unavailable"))
        }

        async fn update(&self, _: AuditLog) -> Result<AuditLog, DomainError> {
            Err(DomainError::storage("database unavailable"))
        }

        async fn delete(&self, _: &crate::domain::audit::AuditLogId) -> Result<bool, DomainError> {
            Ok(false)
        }

        async fn clear(&self) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let service = AuditService::new(Arc::new(FailingStorage));

        service
            .record(AuditLog::new(UserId::generate(), AuditAction::UserLogin, "x"))
            .await;
    }
}
