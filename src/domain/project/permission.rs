//! Static role → permission table for project members

use serde::{Deserialize, Serialize};

/// Grants every permission, including ones added later
pub const WILDCARD: &str = "*";

/// Actions a project member may be allowed to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "project:read")]
    ProjectRead,
    #[serde(rename = "project:update")]
    ProjectUpdate,
    #[serde(rename = "project:delete")]
    ProjectDelete,
    #[serde(rename = "members:read")]
    MembersRead,
    #[serde(rename = "members:manage")]
    MembersManage,
    #[serde(rename = "api_keys:read")]
    ApiKeysRead,
    #[serde(rename = "api_keys:create")]
    ApiKeysCreate,
    #[serde(rename = "api_keys:revoke")]
    ApiKeysRevoke,
    #[serde(rename = "usage:read")]
    UsageRead,
    #[serde(rename = "alerts:read")]
    AlertsRead,
    #[serde(rename = "alerts:manage")]
    AlertsManage,
    #[serde(rename = "billing:read")]
    BillingRead,
    #[serde(rename = "billing:manage")]
    BillingManage,
    #[serde(rename = "audit:read")]
    AuditRead,
}

impl Permission {
    pub const ALL: [Permission; 14] = [
        Self::ProjectRead,
        Self::ProjectUpdate,
        Self::ProjectDelete,
        Self::MembersRead,
        Self::MembersManage,
        Self::ApiKeysRead,
        Self::ApiKeysCreate,
        Self::ApiKeysRevoke,
        Self::UsageRead,
        Self::AlertsRead,
        Self::AlertsManage,
        Self::BillingRead,
        Self::BillingManage,
        Self::AuditRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectRead => "project:read",
            Self::ProjectUpdate => "project:update",
            Self::ProjectDelete => "project:delete",
            Self::MembersRead => "members:read",
            Self::MembersManage => "members:manage",
            Self::ApiKeysRead => "api_keys:read",
            Self::ApiKeysCreate => "api_keys:create",
            Self::ApiKeysRevoke => "api_keys:revoke",
            Self::UsageRead => "usage:read",
            Self::AlertsRead => "alerts:read",
            Self::AlertsManage => "alerts:manage",
            Self::BillingRead => "billing:read",
            Self::BillingManage => "billing:manage",
            Self::AuditRead => "audit:read",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a user within a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Owner,
    Admin,
    Developer,
    #[default]
    Viewer,
}

const OWNER_PERMISSIONS: &[&str] = &[WILDCARD];

const ADMIN_PERMISSIONS: &[&str] = &[
    "project:read",
    "project:update",
    "members:read",
    "members:manage",
    "api_keys:read",
    "api_keys:create",
    "api_keys:revoke",
    "usage:read",
    "alerts:read",
    "alerts:manage",
    "billing:read",
    "billing:manage",
    "audit:read",
];

const DEVELOPER_PERMISSIONS: &[&str] = &[
    "project:read",
    "members:read",
    "api_keys:read",
    "api_keys:create",
    "api_keys:revoke",
    "usage:read",
    "alerts:read",
    "alerts:manage",
];

const VIEWER_PERMISSIONS: &[&str] = &[
    "project:read",
    "members:read",
    "api_keys:read",
    "usage:read",
    "alerts:read",
];

impl ProjectRole {
    /// Raw entries of the permission table for this role
    pub fn permission_table(&self) -> &'static [&'static str] {
        match self {
            Self::Owner => OWNER_PERMISSIONS,
            Self::Admin => ADMIN_PERMISSIONS,
            Self::Developer => DEVELOPER_PERMISSIONS,
            Self::Viewer => VIEWER_PERMISSIONS,
        }
    }

    /// Wildcard or explicit membership in the table
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permission_table()
            .iter()
            .any(|entry| *entry == WILDCARD || *entry == permission.as_str())
    }

    /// Every permission the role resolves to, wildcard expanded
    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|permission| self.has_permission(*permission))
            .collect()
    }

    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Developer => "developer",
            Self::Viewer => "viewer",
        }
    }
}

impl std::fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
