//! Project records and commands.
//!
//! # Invariants
//! - `title` is non-blank.
//! - `created_by` references an admin employee (checked by the fan-out
//!   service, which has storage access).
//! - `assignee_id` starts as `None`; the finalization path sets it once and
//!   nothing in the workflow clears it.

use crate::model::employee::EmployeeId;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Internal project id (SQLite row id).
pub type ProjectId = i64;

/// Priority used when the caller does not pick one.
pub const DEFAULT_PRIORITY: i64 = 1;

/// Project lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Created, waiting for acceptances and finalization.
    Pending,
    /// Assigned to one employee.
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// Stable storage/wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored project snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub priority: i64,
    /// Unix epoch milliseconds.
    pub deadline: Option<i64>,
    pub created_by: EmployeeId,
    pub assignee_id: Option<EmployeeId>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl Project {
    pub fn is_assigned(&self) -> bool {
        self.assignee_id.is_some()
    }
}

/// Input for the project creation command.
///
/// The creator is explicit: callers pass the id of the administrator acting
/// in this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub title: String,
    pub description: Option<String>,
    pub priority: i64,
    pub deadline: Option<i64>,
    pub creator_id: EmployeeId,
}

impl NewProject {
    pub fn new(title: impl Into<String>, creator_id: EmployeeId) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: DEFAULT_PRIORITY,
            deadline: None,
            creator_id,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: i64) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Trims the title and drops a blank description.
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: normalize_description(self.description.as_deref()),
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.title.trim().is_empty() {
            return Err(ProjectValidationError::BlankTitle);
        }
        Ok(())
    }
}

/// Partial update applied by administrators outside the workflow.
///
/// `None` leaves a field unchanged. There is no way to clear an assignee
/// through this command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub status: Option<ProjectStatus>,
    pub priority: Option<i64>,
    pub assignee_id: Option<EmployeeId>,
    pub description: Option<String>,
    pub deadline: Option<i64>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
            && self.description.is_none()
            && self.deadline.is_none()
    }
}

/// Filter for project listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    /// Only projects assigned to this employee.
    pub assignee_id: Option<EmployeeId>,
}

/// Field-level project validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectValidationError {
    BlankTitle,
    MalformedDeadline(String),
    UnknownStatus(String),
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "project title is required"),
            Self::MalformedDeadline(raw) => write!(
                f,
                "deadline `{raw}` is not an RFC 3339 timestamp or YYYY-MM-DD date"
            ),
            Self::UnknownStatus(raw) => write!(
                f,
                "unknown project status `{raw}`; expected pending|in_progress|completed|cancelled"
            ),
        }
    }
}

impl Error for ProjectValidationError {}

/// Parses project status text from operator input.
pub fn parse_project_status(raw: &str) -> Result<ProjectStatus, ProjectValidationError> {
    let normalized = raw.trim().to_ascii_lowercase();
    ProjectStatus::parse(normalized.as_str())
        .ok_or_else(|| ProjectValidationError::UnknownStatus(raw.trim().to_string()))
}

/// Parses a deadline into epoch milliseconds.
///
/// Accepted shapes:
/// - RFC 3339 with offset (`2024-03-01T09:30:00+02:00`).
/// - Naive ISO timestamp, read as UTC (`2024-03-01T09:30:00`).
/// - Plain date, read as UTC midnight (`2024-03-01`).
pub fn parse_deadline(raw: &str) -> Result<i64, ProjectValidationError> {
    let trimmed = raw.trim();
    if let Ok(value) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(value.timestamp_millis());
    }
    if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(value.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|value| value.and_utc().timestamp_millis())
        .ok_or_else(|| ProjectValidationError::MalformedDeadline(trimmed.to_string()))
}

fn normalize_description(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{
        parse_deadline, parse_project_status, NewProject, ProjectStatus, ProjectUpdate,
        ProjectValidationError, DEFAULT_PRIORITY,
    };

    #[test]
    fn new_project_defaults() {
        let project = NewProject::new("Migrate DB", 1);
        assert_eq!(project.priority, DEFAULT_PRIORITY);
        assert!(project.description.is_none());
        assert!(project.deadline.is_none());
    }

    #[test]
    fn blank_title_is_rejected() {
        let err = NewProject::new("  \t", 1).validate().unwrap_err();
        assert_eq!(err, ProjectValidationError::BlankTitle);
    }

    #[test]
    fn normalized_drops_blank_description() {
        let project = NewProject::new("  Title ", 1)
            .with_description("   ")
            .normalized();
        assert_eq!(project.title, "Title");
        assert!(project.description.is_none());
    }

    #[test]
    fn deadline_accepts_date_and_timestamps() {
        assert_eq!(parse_deadline("2024-03-01").unwrap(), 1_709_251_200_000);
        assert_eq!(
            parse_deadline("2024-03-01T00:00:00Z").unwrap(),
            1_709_251_200_000
        );
        assert_eq!(
            parse_deadline("2024-03-01T02:00:00+02:00").unwrap(),
            1_709_251_200_000
        );
        assert_eq!(
            parse_deadline("2024-03-01T00:00:01").unwrap(),
            1_709_251_201_000
        );
    }

    #[test]
    fn deadline_rejects_garbage() {
        assert!(matches!(
            parse_deadline("next tuesday"),
            Err(ProjectValidationError::MalformedDeadline(_))
        ));
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(
            parse_project_status(" In_Progress ").unwrap(),
            ProjectStatus::InProgress
        );
        assert!(parse_project_status("done").is_err());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(ProjectUpdate::default().is_empty());
        let update = ProjectUpdate {
            priority: Some(3),
            ..ProjectUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
