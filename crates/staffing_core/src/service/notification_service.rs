//! Response handling and employee dashboards.
//!
//! # Invariants
//! - Accepting is idempotent: the acceptance relation holds one row per
//!   `(project, employee)` pair however often the employee accepts.
//! - Responses never trigger finalization.
//! - Notifications already decided by finalization (`assigned`, `closed`)
//!   refuse further responses.

use crate::model::employee::EmployeeId;
use crate::model::notification::{
    Decision, Notification, NotificationId, NotificationStatus, NotificationView,
};
use crate::model::EntityRef;
use crate::repo::employee_repo::EmployeeRepository;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::project_repo::ProjectRepository;
use crate::repo::workflow_store::{WorkflowStore, WorkflowUnit};
use crate::service::error::WorkflowError;
use log::{info, warn};

/// Notification use-case facade.
pub struct NotificationService<S: WorkflowStore> {
    store: S,
}

impl<S: WorkflowStore> NotificationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records an employee's accept/reject answer.
    ///
    /// A later answer overwrites an earlier one while the notification is
    /// still open. On accept the employee joins the project's acceptors.
    ///
    /// # Errors
    /// - `NotFound` when the notification, its project or its employee is
    ///   missing.
    /// - `Conflict` when the notification is already `assigned` or `closed`.
    pub fn respond(
        &mut self,
        notification_id: NotificationId,
        decision: Decision,
    ) -> Result<Notification, WorkflowError> {
        let unit = self.store.begin()?;
        let notification = unit
            .get_notification(notification_id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Notification(
                notification_id,
            )))?;
        unit.get_project(notification.project_id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Project(
                notification.project_id,
            )))?;
        unit.get_employee(notification.employee_id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Employee(
                notification.employee_id,
            )))?;

        if notification.status.is_terminal() {
            warn!(
                "event=notification_respond module=notification status=rejected error_code=terminal notification_id={} current={}",
                notification.id, notification.status
            );
            return Err(WorkflowError::Conflict(format!(
                "notification {} is already {}; responses are closed",
                notification.id, notification.status
            )));
        }

        let updated = unit.set_notification_status(notification.id, decision.as_status())?;
        let newly_accepted = match decision {
            Decision::Accept => {
                unit.add_acceptor(notification.project_id, notification.employee_id)?
            }
            Decision::Reject => false,
        };
        unit.commit()?;

        info!(
            "event=notification_respond module=notification status=ok notification_id={} project_id={} employee_id={} decision={} newly_accepted={}",
            updated.id,
            updated.project_id,
            updated.employee_id,
            updated.status,
            newly_accepted
        );
        Ok(updated)
    }

    /// Lists the notifications an employee can still act on (`pending` or
    /// `accept`), each joined with its project summary.
    ///
    /// # Errors
    /// - `NotFound` when the employee does not exist.
    pub fn list_active(
        &mut self,
        employee_id: EmployeeId,
    ) -> Result<Vec<NotificationView>, WorkflowError> {
        let unit = self.store.begin_read()?;
        unit.get_employee(employee_id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Employee(employee_id)))?;
        Ok(unit.list_employee_notifications(employee_id, &NotificationStatus::ACTIVE)?)
    }
}
