//! Error surface shared by workflow services.
//!
//! Every failure carries a [`WorkflowErrorKind`] so callers can branch on
//! the category without matching messages.

use crate::model::employee::EmployeeValidationError;
use crate::model::notification::InvalidDecision;
use crate::model::project::{ProjectId, ProjectValidationError};
use crate::model::EntityRef;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Workflow command failure.
#[derive(Debug)]
pub enum WorkflowError {
    /// Referenced employee, project or notification does not exist.
    NotFound(EntityRef),
    /// Missing required field or malformed input value.
    Validation(String),
    /// The system is missing something it needs to operate, such as an
    /// admin to act as project creator.
    Configuration(String),
    /// Finalization requested before anyone accepted.
    NoAcceptors(ProjectId),
    /// Request collides with state another command already decided.
    Conflict(String),
    /// Storage failure.
    Repo(RepoError),
}

/// Stable category of a [`WorkflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowErrorKind {
    NotFound,
    Validation,
    Configuration,
    NoAcceptors,
    Conflict,
    Storage,
}

impl WorkflowErrorKind {
    /// Machine-readable code used in logs and CLI output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Validation => "validation_error",
            Self::Configuration => "configuration_error",
            Self::NoAcceptors => "no_acceptors",
            Self::Conflict => "conflict",
            Self::Storage => "storage_error",
        }
    }
}

impl WorkflowError {
    pub fn kind(&self) -> WorkflowErrorKind {
        match self {
            Self::NotFound(_) => WorkflowErrorKind::NotFound,
            Self::Validation(_) => WorkflowErrorKind::Validation,
            Self::Configuration(_) => WorkflowErrorKind::Configuration,
            Self::NoAcceptors(_) => WorkflowErrorKind::NoAcceptors,
            Self::Conflict(_) => WorkflowErrorKind::Conflict,
            Self::Repo(_) => WorkflowErrorKind::Storage,
        }
    }
}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "{entity} not found"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::Configuration(message) => write!(f, "{message}"),
            Self::NoAcceptors(project_id) => write!(
                f,
                "no employees have accepted project {project_id} yet"
            ),
            Self::Conflict(message) => write!(f, "{message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WorkflowError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WorkflowError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(entity) => Self::NotFound(entity),
            RepoError::Validation(message) => Self::Validation(message),
            RepoError::DuplicateExternalId(_) => Self::Validation(value.to_string()),
            RepoError::AlreadyAssigned { .. } => Self::Conflict(value.to_string()),
            other => Self::Repo(other),
        }
    }
}

impl From<EmployeeValidationError> for WorkflowError {
    fn from(value: EmployeeValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<ProjectValidationError> for WorkflowError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<InvalidDecision> for WorkflowError {
    fn from(value: InvalidDecision) -> Self {
        Self::Validation(value.to_string())
    }
}
