//! Project validation utilities

use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectValidationError {
    #[error("Project name cannot be empty")]
    EmptyName,

    #[error("Project name exceeds maximum length of {0} characters")]
    NameTooLong(usize),

    #[error("Project description exceeds maximum length of {0} characters")]
    DescriptionTooLong(usize),
}

impl From<ProjectValidationError> for DomainError {
    fn from(err: ProjectValidationError) -> Self {
        let field = match err {
            ProjectValidationError::EmptyName | ProjectValidationError::NameTooLong(_) => "name",
            ProjectValidationError::DescriptionTooLong(_) => "description",
        };
        DomainError::validation_field(field, err.to_string())
    }
}

pub const MAX_PROJECT_NAME_LENGTH: usize = 100;
pub const MAX_PROJECT_DESCRIPTION_LENGTH: usize = 500;

pub fn validate_project_name(name: &str) -> Result<(), ProjectValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ProjectValidationError::EmptyName);
    }

    if name.chars().count() > MAX_PROJECT_NAME_LENGTH {
        return Err(ProjectValidationError::NameTooLong(MAX_PROJECT_NAME_LENGTH));
    }

    Ok(())
}

pub fn validate_project_description(description: &str) -> Result<(), ProjectValidationError> {
    if description.chars().count() > MAX_PROJECT_DESCRIPTION_LENGTH {
        return Err(ProjectValidationError::DescriptionTooLong(
            MAX_PROJECT_DESCRIPTION_LENGTH,
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name() {
        assert!(validate_project_name("Acme").is_ok());
        assert_eq!(
            validate_project_name("  "),
            Err(ProjectValidationError::EmptyName)
        );
        assert_eq!(
            validate_project_name(&"p".repeat(101)),
            Err(ProjectValidationError::NameTooLong(100))
        );
    }

    #[test]
    fn test_project_description() {
        assert!(validate_project_description("").is_ok());
        assert!(validate_project_description(&"d".repeat(500)).is_ok());
        assert!(validate_project_description(&"d".repeat(501)).is_err());
    }
}
