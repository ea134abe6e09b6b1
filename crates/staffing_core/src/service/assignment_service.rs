//! Finalization engine: turns "who accepted" into "who is assigned".
//!
//! # Responsibility
//! - Pick the winning acceptor for a project.
//! - Move the project to `in_progress` and settle every notification of the
//!   project in the same transaction.
//!
//! # Invariants
//! - Winner order: rating descending, then internal id ascending. The
//!   outcome never depends on storage iteration order.
//! - Finalizing an assigned project is a no-op that reports the existing
//!   assignment.
//! - After success exactly the winner's notification is `assigned`; every
//!   other notification of the project is `closed`.
//! - Validation failures (`NotFound`, `NoAcceptors`) leave storage untouched.

use crate::model::employee::Employee;
use crate::model::project::{Project, ProjectId};
use crate::model::EntityRef;
use crate::repo::employee_repo::EmployeeRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::workflow_store::{WorkflowStore, WorkflowUnit};
use crate::service::error::WorkflowError;
use log::{info, warn};
use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;

/// Result of a finalize request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizeOutcome {
    /// Project snapshot after the call.
    pub project: Project,
    /// Assigned employee (new winner or the pre-existing assignee).
    pub employee: Employee,
    /// `true` when the project was assigned before this call.
    pub already_assigned: bool,
    /// Human-readable summary.
    pub message: String,
}

/// Finalization use-case facade.
pub struct AssignmentService<S: WorkflowStore> {
    store: S,
}

impl<S: WorkflowStore> AssignmentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Assigns a project to its best-rated acceptor.
    ///
    /// # Contract
    /// - Already assigned: returns the current assignment with
    ///   `already_assigned = true` and changes nothing.
    /// - Otherwise sets assignee and `in_progress`, marks the winner's
    ///   notification `assigned` and all others `closed`.
    ///
    /// # Errors
    /// - `NotFound` when the project (or its recorded assignee) is missing.
    /// - `NoAcceptors` when nobody has accepted the project.
    pub fn finalize(&mut self, project_id: ProjectId) -> Result<FinalizeOutcome, WorkflowError> {
        let started_at = Instant::now();
        let result = self.finalize_in_unit(project_id);

        match &result {
            Ok(outcome) => info!(
                "event=project_finalize module=assignment status=ok project_id={} employee_id={} already_assigned={} duration_ms={}",
                project_id,
                outcome.employee.id,
                outcome.already_assigned,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=project_finalize module=assignment status=error project_id={} error_code={} duration_ms={}",
                project_id,
                err.kind().as_str(),
                started_at.elapsed().as_millis()
            ),
        }

        result
    }

    fn finalize_in_unit(&mut self, project_id: ProjectId) -> Result<FinalizeOutcome, WorkflowError> {
        let unit = self.store.begin()?;
        let project = unit
            .get_project(project_id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Project(project_id)))?;

        if let Some(assignee_id) = project.assignee_id {
            let employee = unit
                .get_employee(assignee_id)?
                .ok_or(WorkflowError::NotFound(EntityRef::Employee(assignee_id)))?;
            return Ok(FinalizeOutcome {
                project,
                employee,
                already_assigned: true,
                message: "Project is already assigned".to_string(),
            });
        }

        let acceptors = unit.list_acceptors(project_id)?;
        let winner = select_winner(&acceptors)
            .cloned()
            .ok_or(WorkflowError::NoAcceptors(project_id))?;

        let project = unit.assign_project(project_id, winner.id)?;
        unit.resolve_project_notifications(project_id, winner.id)?;
        unit.commit()?;

        let message = format!(
            "Project assigned to {} (rating: {})",
            winner.name, winner.rating
        );
        Ok(FinalizeOutcome {
            project,
            employee: winner,
            already_assigned: false,
            message,
        })
    }
}

/// Returns the acceptor that wins the project, or `None` for an empty set.
///
/// Highest rating wins; among equal ratings the lowest internal id wins.
pub fn select_winner(acceptors: &[Employee]) -> Option<&Employee> {
    acceptors.iter().min_by(|left, right| rank_candidates(left, right))
}

/// Total order over candidates: `Less` means `left` ranks ahead.
pub fn rank_candidates(left: &Employee, right: &Employee) -> Ordering {
    right
        .rating
        .total_cmp(&left.rating)
        .then_with(|| left.id.cmp(&right.id))
}
