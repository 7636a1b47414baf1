//! Project service - projects, membership and permission checks

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::alert::{Alert, CostAlert};
use crate::domain::api_key::ApiKey;
use crate::domain::project::{
    validate_project_description, validate_project_name, Permission, Project, ProjectId,
    ProjectMember, ProjectRole,
};
use crate::domain::storage::Storage;
use crate::domain::user::{normalize_email, User, UserId};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A member's role and the permissions it grants
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPermissions {
    pub role: ProjectRole,
    pub permissions: Vec<Permission>,
}

/// Storages of entities removed together with their project
#[derive(Debug, Clone)]
pub struct ProjectDependents {
    pub api_keys: Arc<dyn Storage<ApiKey>>,
    pub alerts: Arc<dyn Storage<Alert>>,
    pub cost_alerts: Arc<dyn Storage<CostAlert>>,
}

#[derive(Debug)]
pub struct ProjectService {
    projects: Arc<dyn Storage<Project>>,
    users: Arc<dyn Storage<User>>,
    dependents: ProjectDependents,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn Storage<Project>>,
        users: Arc<dyn Storage<User>>,
        dependents: ProjectDependents,
    ) -> Self {
        Self {
            projects,
            users,
            dependents,
        }
    }

    pub async fn create(
        &self,
        owner_id: &UserId,
        request: CreateProjectRequest,
    ) -> Result<Project, DomainError> {
        validate_project_name(&request.name)?;
        if let Some(ref description) = request.description {
            validate_project_description(description)?;
        }

        let mut project = Project::new(ProjectId::generate(), request.name.trim(), owner_id.clone());
        if let Some(description) = request.description {
            project = project.with_description(description);
        }

        let created = self.projects.create(project).await?;
        info!(project_id = %created.id(), owner_id = %owner_id, "Project created");
        Ok(created)
    }

    /// Projects the user is a member of, newest first
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Project>, DomainError> {
        let mut projects = self
            .projects
            .find(&|p: &Project| p.is_member(user_id))
            .await?;
        projects.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(projects)
    }

    /// Non-members get the same answer as for a missing project
    pub async fn get_for_member(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<Project, DomainError> {
        self.projects
            .get(project_id)
            .await?
            .filter(|project| project.is_member(user_id))
            .ok_or_else(|| DomainError::not_found(format!("Project '{}' not found", project_id)))
    }

    /// Loads the project and checks the user's role grants `permission`
    pub async fn authorize(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
        permission: Permission,
    ) -> Result<Project, DomainError> {
        let project = self.get_for_member(project_id, user_id).await?;

        if !project.user_has_permission(user_id, permission) {
            debug!(
                project_id = %project_id,
                user_id = %user_id,
                permission = %permission,
                "Permission denied"
            );
            return Err(DomainError::forbidden(format!(
                "Missing permission '{}'",
                permission
            )));
        }

        Ok(project)
    }

    pub async fn permissions(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<ProjectPermissions, DomainError> {
        let project = self.get_for_member(project_id, user_id).await?;
        let role = project
            .role_of(user_id)
            .ok_or_else(|| DomainError::not_found(format!("Project '{}' not found", project_id)))?;

        Ok(ProjectPermissions {
            role,
            permissions: role.permissions(),
        })
    }

    pub async fn update(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
        request: UpdateProjectRequest,
    ) -> Result<Project, DomainError> {
        let mut project = self
            .authorize(project_id, user_id, Permission::ProjectUpdate)
            .await?;

        if let Some(name) = request.name {
            validate_project_name(&name)?;
            project.set_name(name.trim());
        }

        if let Some(description) = request.description {
            validate_project_description(&description)?;
            project.set_description(if description.is_empty() {
                None
            } else {
                Some(description)
            });
        }

        let updated = self.projects.update(project).await?;
        info!(project_id = %project_id, "Project updated");
        Ok(updated)
    }

    /// Deletes the project together with its API keys and alerts
    pub async fn delete(&self, project_id: &ProjectId, user_id: &UserId) -> Result<(), DomainError> {
        self.authorize(project_id, user_id, Permission::ProjectDelete)
            .await?;

        let keys = self
            .dependents
            .api_keys
            .find(&|k: &ApiKey| k.project_id() == project_id)
            .await?;
        for key in &keys {
            self.dependents.api_keys.delete(key.id()).await?;
        }

        let alerts = self
            .dependents
            .alerts
            .find(&|a: &Alert| a.project_id() == project_id)
            .await?;
        for alert in &alerts {
            self.dependents.alerts.delete(alert.id()).await?;
        }

        let cost_alerts = self
            .dependents
            .cost_alerts
            .find(&|a: &CostAlert| a.project_id() == project_id)
            .await?;
        for alert in &cost_alerts {
            self.dependents.cost_alerts.delete(alert.id()).await?;
        }

        self.projects.delete(project_id).await?;
        info!(
            project_id = %project_id,
            api_keys = keys.len(),
            alerts = alerts.len(),
            cost_alerts = cost_alerts.len(),
            "Project deleted"
        );
        Ok(())
    }

    // Members

    pub async fn list_members(
        &self,
        project_id: &ProjectId,
        user_id: &UserId,
    ) -> Result<Vec<ProjectMember>, DomainError> {
        let project = self
            .authorize(project_id, user_id, Permission::MembersRead)
            .await?;
        Ok(project.members().to_vec())
    }

    /// Adds an existing user by e-mail
    pub async fn add_member(
        &self,
        project_id: &ProjectId,
        actor_id: &UserId,
        email: &str,
        role: ProjectRole,
    ) -> Result<ProjectMember, DomainError> {
        let mut project = self
            .authorize(project_id, actor_id, Permission::MembersManage)
            .await?;

        if role == ProjectRole::Owner {
            return Err(DomainError::validation_field(
                "role",
                "A project can only have one owner",
            ));
        }

        let email = normalize_email(email);
        let user = self
            .users
            .find(&|u: &User| u.email() == email)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", email)))?;

        if !project.add_member(user.id().clone(), role) {
            return Err(DomainError::conflict(format!(
                "User '{}' is already a member of this project",
                email
            )));
        }

        let member = project
            .member(user.id())
            .cloned()
            .ok_or_else(|| DomainError::internal("Member missing after insert"))?;

        self.projects.update(project).await?;
        info!(project_id = %project_id, user_id = %user.id(), role = ?role, "Member added");
        Ok(member)
    }

    pub async fn update_member_role(
        &self,
        project_id: &ProjectId,
        actor_id: &UserId,
        member_id: &UserId,
        role: ProjectRole,
    ) -> Result<ProjectMember, DomainError> {
        let mut project = self
            .authorize(project_id, actor_id, Permission::MembersManage)
            .await?;

        if role == ProjectRole::Owner {
            return Err(DomainError::validation_field(
                "role",
                "A project can only have one owner",
            ));
        }

        if project.owner_id() == member_id {
            return Err(DomainError::validation_field(
                "role",
                "The owner's role cannot be changed",
            ));
        }

        if !project.set_member_role(member_id, role) {
            return Err(DomainError::not_found(format!(
                "Member '{}' not found",
                member_id
            )));
        }

        let member = project
            .member(member_id)
            .cloned()
            .ok_or_else(|| DomainError::internal("Member missing after update"))?;

        self.projects.update(project).await?;
        info!(project_id = %project_id, user_id = %member_id, role = ?role, "Member role updated");
        Ok(member)
    }

    pub async fn remove_member(
        &self,
        project_id: &ProjectId,
        actor_id: &UserId,
        member_id: &UserId,
    ) -> Result<(), DomainError> {
        let mut project = self
            .authorize(project_id, actor_id, Permission::MembersManage)
            .await?;

        if project.owner_id() == member_id {
            return Err(DomainError::validation_field(
                "user_id",
                "The project owner cannot be removed",
            ));
        }

        if !project.remove_member(member_id) {
            return Err(DomainError::not_found(format!(
                "Member '{}' not found",
                member_id
            )));
        }

        self.projects.update(project).await?;
        info!(project_id = %project_id, user_id = %member_id, "Member removed");
        Ok(())
    }
}
