//! Domain records for the assignment workflow.
//!
//! # Responsibility
//! - Define employees, projects and notifications as plain value snapshots.
//! - Own field-level validation that does not need storage access.
//!
//! # Invariants
//! - Records are returned by value; mutation happens through repository or
//!   service commands that hand back a fresh snapshot.
//! - Internal ids are SQLite row ids and are never reused by the workflow.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod employee;
pub mod notification;
pub mod project;

use employee::EmployeeId;
use notification::NotificationId;
use project::ProjectId;

/// Typed reference to one stored record, used in not-found reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    Employee(EmployeeId),
    Project(ProjectId),
    Notification(NotificationId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Employee(id) => write!(f, "employee {id}"),
            Self::Project(id) => write!(f, "project {id}"),
            Self::Notification(id) => write!(f, "notification {id}"),
        }
    }
}
