//! Project infrastructure - project service and permission checks

mod service;

pub use service::{
    CreateProjectRequest, ProjectDependents, ProjectPermissions, ProjectService,
    UpdateProjectRequest,
};
