//! API Key entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::uuid_id;
use crate::domain::project::ProjectId;
use crate::domain::storage::StorageEntity;
use crate::domain::user::UserId;

uuid_id!(
    /// API key identifier
    ApiKeyId,
    "API key"
);

impl StorageEntity for ApiKey {
    type Key = ApiKeyId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

/// Status of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    /// Key is active and can be used
    #[default]
    Active,
    /// Key has been revoked and cannot be used
    Revoked,
}

impl ApiKeyStatus {
    /// Check if the key is usable
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Project-scoped API key for the gateway surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    id: ApiKeyId,
    name: String,
    project_id: ProjectId,
    /// `sha256$<base64url>` of the full key; the key itself is never stored
    secret_hash: String,
    /// Type prefix plus the first 8 random characters, used for lookup
    key_prefix: String,
    status: ApiKeyStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_used_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revoked_at: Option<DateTime<Utc>>,
    created_by: UserId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ApiKey {
    pub fn new(
        id: ApiKeyId,
        name: impl Into<String>,
        project_id: ProjectId,
        secret_hash: impl Into<String>,
        key_prefix: impl Into<String>,
        created_by: UserId,
    ) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            project_id,
            secret_hash: secret_hash.into(),
            key_prefix: key_prefix.into(),
            status: ApiKeyStatus::Active,
            expires_at: None,
            last_used_at: None,
            revoked_at: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    // Getters

    pub fn id(&self) -> &ApiKeyId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn secret_hash(&self) -> &str {
        &self.secret_hash
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    pub fn status(&self) -> ApiKeyStatus {
        self.status
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used_at
    }

    pub fn revoked_at(&self) -> Option<DateTime<Utc>> {
        self.revoked_at
    }

    pub fn created_by(&self) -> &UserId {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Status checks

    /// Check if the key is currently valid and usable
    pub fn is_valid(&self) -> bool {
        self.status.is_usable() && !self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    // Mutators

    /// Revocation is permanent
    pub fn revoke(&mut self) {
        if self.status != ApiKeyStatus::Revoked {
            let now = Utc::now();
            self.status = ApiKeyStatus::Revoked;
            self.revoked_at = Some(now);
            self.updated_at = now;
        }
    }

    pub fn record_usage(&mut self) {
        self.last_used_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn create_test_key() -> ApiKey {
        ApiKey::new(
            ApiKeyId::generate(),
            "CI key",
            ProjectId::generate(),
            "sha256$abc",
            "gw_live_abcdefgh",
            UserId::generate(),
        )
    }

    #[test]
    fn test_new_key_is_valid() {
        let key = create_test_key();

        assert_eq!(key.status(), ApiKeyStatus::Active);
        assert!(key.is_valid());
        assert!(!key.is_expired());
        assert!(key.last_used_at().is_none());
    }

    #[test]
    fn test_revoke_is_permanent() {
        let mut key = create_test_key();

        key.revoke();
        let revoked_at = key.revoked_at();

        assert_eq!(key.status(), ApiKeyStatus::Revoked);
        assert!(!key.is_valid());
        assert!(revoked_at.is_some());

        key.revoke();
        assert_eq!(key.revoked_at(), revoked_at);
    }

    #[test]
    fn test_expired_key_is_invalid() {
        let key = create_test_key().with_expiration(Utc::now() - Duration::seconds(1));

        assert!(key.is_expired());
        assert!(!key.is_valid());
    }

    #[test]
    fn test_future_expiration_is_valid() {
        let key = create_test_key().with_expiration(Utc::now() + Duration::days(30));

        assert!(!key.is_expired());
        assert!(key.is_valid());
    }

    #[test]
    fn test_record_usage() {
        let mut key = create_test_key();
        key.record_usage();
        assert!(key.last_used_at().is_some());
    }
}
