//! Project entity and membership

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::id::uuid_id;
use crate::domain::storage::StorageEntity;
use crate::domain::user::UserId;

use super::permission::{Permission, ProjectRole};

uuid_id!(
    /// Project identifier
    ProjectId,
    "project"
);

/// A user's membership in a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMember {
    user_id: UserId,
    role: ProjectRole,
    joined_at: DateTime<Utc>,
}

impl ProjectMember {
    pub fn new(user_id: UserId, role: ProjectRole) -> Self {
        Self {
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> ProjectRole {
        self.role
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }
}

/// Project grouping API keys, usage, alerts and invoices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    owner_id: UserId,
    members: Vec<ProjectMember>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StorageEntity for Project {
    type Key = ProjectId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

impl Project {
    /// Create a project whose only member is its owner
    pub fn new(id: ProjectId, name: impl Into<String>, owner_id: UserId) -> Self {
        let now = Utc::now();

        Self {
            id,
            name: name.into(),
            description: None,
            members: vec![ProjectMember::new(owner_id.clone(), ProjectRole::Owner)],
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // Getters

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn owner_id(&self) -> &UserId {
        &self.owner_id
    }

    pub fn members(&self) -> &[ProjectMember] {
        &self.members
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Membership queries

    pub fn member(&self, user_id: &UserId) -> Option<&ProjectMember> {
        self.members.iter().find(|m| &m.user_id == user_id)
    }

    pub fn role_of(&self, user_id: &UserId) -> Option<ProjectRole> {
        self.member(user_id).map(|m| m.role)
    }

    pub fn is_member(&self, user_id: &UserId) -> bool {
        self.member(user_id).is_some()
    }

    /// Non-members have no permissions at all
    pub fn user_has_permission(&self, user_id: &UserId, permission: Permission) -> bool {
        self.role_of(user_id)
            .is_some_and(|role| role.has_permission(permission))
    }

    // Mutators

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
        self.touch();
    }

    /// Returns false when the user is already a member
    pub fn add_member(&mut self, user_id: UserId, role: ProjectRole) -> bool {
        if self.is_member(&user_id) {
            return false;
        }

        self.members.push(ProjectMember::new(user_id, role));
        self.touch();
        true
    }

    /// Returns false when the user is not a member
    pub fn set_member_role(&mut self, user_id: &UserId, role: ProjectRole) -> bool {
        match self.members.iter_mut().find(|m| &m.user_id == user_id) {
            Some(member) => {
                member.role = role;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Returns false when the user is not a member
    pub fn remove_member(&mut self, user_id: &UserId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| &m.user_id != user_id);

        let removed = self.members.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
