//! Project domain - projects, membership and role permissions

mod entity;
mod permission;
mod validation;

pub use entity::{Project, ProjectId, ProjectMember};
pub use permission::{Permission, ProjectRole, WILDCARD};
pub use validation::{
    validate_project_description, validate_project_name, ProjectValidationError,
};
