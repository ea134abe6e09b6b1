//! Per-employee project invitations.
//!
//! # Invariants
//! - A notification belongs to exactly one employee and one project.
//! - Lifecycle: `pending -> {accept, reject} -> {assigned, closed}`.
//!   `assigned` and `closed` are terminal.

use crate::model::employee::EmployeeId;
use crate::model::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Internal notification id (SQLite row id).
pub type NotificationId = i64;

/// Notification response state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Accept,
    Reject,
    /// The employee won the project.
    Assigned,
    /// The project went to someone else.
    Closed,
}

impl NotificationStatus {
    /// Statuses an employee still sees on their dashboard.
    pub const ACTIVE: [Self; 2] = [Self::Pending, Self::Accept];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accept => "accept",
            Self::Reject => "reject",
            Self::Assigned => "assigned",
            Self::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "assigned" => Some(Self::Assigned),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Finalization has already decided this notification.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Assigned | Self::Closed)
    }
}

impl Display for NotificationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employee answer to a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn as_status(self) -> NotificationStatus {
        match self {
            Self::Accept => NotificationStatus::Accept,
            Self::Reject => NotificationStatus::Reject,
        }
    }
}

impl FromStr for Decision {
    type Err = InvalidDecision;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(Self::Accept),
            "reject" => Ok(Self::Reject),
            _ => Err(InvalidDecision(value.trim().to_string())),
        }
    }
}

/// Decision text other than `accept` or `reject`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDecision(pub String);

impl Display for InvalidDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid response `{}`; expected accept|reject", self.0)
    }
}

impl Error for InvalidDecision {}

/// Stored notification snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub employee_id: EmployeeId,
    pub project_id: ProjectId,
    pub status: NotificationStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Dashboard read model: a notification joined with its project summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub project_id: ProjectId,
    pub project_title: String,
    pub project_description: Option<String>,
    pub project_priority: i64,
    pub status: NotificationStatus,
    pub created_at: i64,
}
