//! Core domain logic for the staffing workflow.
//! This crate is the single source of truth for assignment invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::employee::{
    parse_rating, Employee, EmployeeId, EmployeeValidationError, NewEmployee, DEFAULT_RATING,
};
pub use model::notification::{
    Decision, InvalidDecision, Notification, NotificationId, NotificationStatus,
    NotificationView,
};
pub use model::project::{
    parse_deadline, parse_project_status, NewProject, Project, ProjectId, ProjectListQuery,
    ProjectStatus, ProjectUpdate, ProjectValidationError,
};
pub use model::EntityRef;
pub use repo::employee_repo::EmployeeListQuery;
pub use repo::project_repo::ClearedProjects;
pub use repo::workflow_store::{SqliteWorkflowStore, WorkflowStore, WorkflowUnit};
pub use repo::{RepoError, RepoResult};
pub use service::assignment_service::{AssignmentService, FinalizeOutcome};
pub use service::employee_service::{AdminBootstrap, EmployeeService};
pub use service::error::{WorkflowError, WorkflowErrorKind};
pub use service::notification_service::NotificationService;
pub use service::project_service::{NotifiedEmployee, ProjectCreated, ProjectService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
