//! Audit trail of console actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::uuid_id;
use crate::domain::project::ProjectId;
use crate::domain::storage::StorageEntity;
use crate::domain::user::UserId;

uuid_id!(
    /// Audit log entry identifier
    AuditLogId,
    "audit log"
);

/// Every mutating console action that is recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "user.registered")]
    UserRegistered,
    #[serde(rename = "user.verified")]
    UserVerified,
    #[serde(rename = "user.login")]
    UserLogin,
    #[serde(rename = "user.updated")]
    UserUpdated,
    #[serde(rename = "user.password_changed")]
    UserPasswordChanged,
    #[serde(rename = "project.created")]
    ProjectCreated,
    #[serde(rename = "project.updated")]
    ProjectUpdated,
    #[serde(rename = "project.deleted")]
    ProjectDeleted,
    #[serde(rename = "member.added")]
    MemberAdded,
    #[serde(rename = "member.updated")]
    MemberUpdated,
    #[serde(rename = "member.removed")]
    MemberRemoved,
    #[serde(rename = "api_key.created")]
    ApiKeyCreated,
    #[serde(rename = "api_key.revoked")]
    ApiKeyRevoked,
    #[serde(rename = "api_key.deleted")]
    ApiKeyDeleted,
    #[serde(rename = "alert.created")]
    AlertCreated,
    #[serde(rename = "alert.updated")]
    AlertUpdated,
    #[serde(rename = "alert.deleted")]
    AlertDeleted,
    #[serde(rename = "cost_alert.created")]
    CostAlertCreated,
    #[serde(rename = "cost_alert.updated")]
    CostAlertUpdated,
    #[serde(rename = "cost_alert.deleted")]
    CostAlertDeleted,
    #[serde(rename = "invoice.generated")]
    InvoiceGenerated,
    #[serde(rename = "invoice.paid")]
    InvoicePaid,
    #[serde(rename = "invoice.voided")]
    InvoiceVoided,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRegistered => "user.registered",
            Self::UserVerified => "user.verified",
            Self::UserLogin => "user.login",
            Self::UserUpdated => "user.updated",
            Self::UserPasswordChanged => "user.password_changed",
            Self::ProjectCreated => "project.created",
            Self::ProjectUpdated => "project.updated",
            Self::ProjectDeleted => "project.deleted",
            Self::MemberAdded => "member.added",
            Self::MemberUpdated => "member.updated",
            Self::MemberRemoved => "member.removed",
            Self::ApiKeyCreated => "api_key.created",
            Self::ApiKeyRevoked => "api_key.revoked",
            Self::ApiKeyDeleted => "api_key.deleted",
            Self::AlertCreated => "alert.created",
            Self::AlertUpdated => "alert.updated",
            Self::AlertDeleted => "alert.deleted",
            Self::CostAlertCreated => "cost_alert.created",
            Self::CostAlertUpdated => "cost_alert.updated",
            Self::CostAlertDeleted => "cost_alert.deleted",
            Self::InvoiceGenerated => "invoice.generated",
            Self::InvoicePaid => "invoice.paid",
            Self::InvoiceVoided => "invoice.voided",
        }
    }

    /// Kind of entity the action targets
    pub fn target_type(&self) -> &'static str {
        self.as_str()
            .split_once('.')
            .map(|(target, _)| target)
            .unwrap_or("unknown")
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    id: AuditLogId,
    user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_id: Option<ProjectId>,
    action: AuditAction,
    target_type: String,
    target_id: String,
    #[serde(default)]
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl StorageEntity for AuditLog {
    type Key = AuditLogId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl AuditLog {
    pub fn new(user_id: UserId, action: AuditAction, target_id: impl Into<String>) -> Self {
        Self {
            id: AuditLogId::generate(),
            user_id,
            project_id: None,
            action,
            target_type: action.target_type().to_string(),
            target_id: target_id.into(),
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &AuditLogId {
        &self.id
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn project_id(&self) -> Option<&ProjectId> {
        self.project_id.as_ref()
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuditAction::ApiKeyCreated.as_str(), "api_key.created");
        assert_eq!(AuditAction::ApiKeyCreated.target_type(), "api_key");
        assert_eq!(AuditAction::CostAlertDeleted.target_type(), "cost_alert");
        assert_eq!(
            serde_json::to_value(AuditAction::InvoicePaid).unwrap(),
            json!("invoice.paid")
        );
    }

    #[test]
    fn test_serde_names_match_as_str() {
        let actions = [
            AuditAction::UserRegistered,
            AuditAction::UserPasswordChanged,
            AuditAction::MemberUpdated,
            AuditAction::InvoiceVoided,
        ];

        for action in actions {
            assert_eq!(serde_json::to_value(action).unwrap(), json!(action.as_str()));
        }
    }

    #[test]
    fn test_audit_log_builder() {
        let project = ProjectId::generate();
        let log = AuditLog::new(UserId::generate(), AuditAction::ProjectCreated, project.as_str())
            .with_project(project.clone())
            .with_metadata(json!({"name": "Acme"}));

        assert_eq!(log.target_type(), "project");
        assert_eq!(log.target_id(), project.as_str());
        assert_eq!(log.project_id(), Some(&project));
        assert_eq!(log.metadata()["name"], "Acme");
    }
}
