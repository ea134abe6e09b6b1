//! Project creation with notification fan-out, plus admin maintenance.
//!
//! # Invariants
//! - The creator is passed explicitly and must be an admin.
//! - Project row and its notifications commit together or not at all.
//! - Exactly one `pending` notification per non-admin employee, none for
//!   admins.

use crate::model::employee::EmployeeId;
use crate::model::notification::NotificationId;
use crate::model::project::{NewProject, Project, ProjectId, ProjectListQuery, ProjectUpdate};
use crate::model::EntityRef;
use crate::repo::employee_repo::{EmployeeListQuery, EmployeeRepository};
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::project_repo::{ClearedProjects, ProjectRepository};
use crate::repo::workflow_store::{WorkflowStore, WorkflowUnit};
use crate::service::error::WorkflowError;
use log::{info, warn};
use serde::Serialize;

/// One employee reached by the fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifiedEmployee {
    pub employee_id: EmployeeId,
    pub employee_name: String,
    pub notification_id: NotificationId,
}

/// Outcome of `create_project`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCreated {
    pub project: Project,
    pub notified: Vec<NotifiedEmployee>,
}

impl ProjectCreated {
    pub fn notifications_sent(&self) -> usize {
        self.notified.len()
    }
}

/// Project use-case facade.
pub struct ProjectService<S: WorkflowStore> {
    store: S,
}

impl<S: WorkflowStore> ProjectService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Creates a `pending` project and notifies every non-admin employee.
    ///
    /// # Errors
    /// - `Validation` when the title is blank.
    /// - `NotFound` when the creator id does not resolve.
    /// - `Configuration` when the creator is not an admin.
    pub fn create_project(&mut self, project: &NewProject) -> Result<ProjectCreated, WorkflowError> {
        let project = project.normalized();
        project.validate()?;

        let unit = self.store.begin()?;
        let creator = unit
            .get_employee(project.creator_id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Employee(project.creator_id)))?;
        if !creator.is_admin {
            warn!(
                "event=project_create module=project status=rejected error_code=creator_not_admin creator_id={}",
                creator.id
            );
            return Err(WorkflowError::Configuration(format!(
                "no admin available: employee {} cannot create projects",
                creator.id
            )));
        }

        let stored = unit.insert_project(&project)?;
        let recipients = unit.list_employees(&EmployeeListQuery::non_admins())?;
        let mut notified = Vec::with_capacity(recipients.len());
        for employee in recipients {
            let notification = unit.insert_notification(stored.id, employee.id)?;
            notified.push(NotifiedEmployee {
                employee_id: employee.id,
                employee_name: employee.name,
                notification_id: notification.id,
            });
        }
        unit.commit()?;

        info!(
            "event=project_create module=project status=ok project_id={} creator_id={} notified={}",
            stored.id,
            creator.id,
            notified.len()
        );
        Ok(ProjectCreated {
            project: stored,
            notified,
        })
    }

    pub fn get_project(&mut self, id: ProjectId) -> Result<Project, WorkflowError> {
        let unit = self.store.begin_read()?;
        unit.get_project(id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Project(id)))
    }

    pub fn list_projects(
        &mut self,
        query: &ProjectListQuery,
    ) -> Result<Vec<Project>, WorkflowError> {
        let unit = self.store.begin_read()?;
        Ok(unit.list_projects(query)?)
    }

    /// Applies an administrative partial update.
    ///
    /// Setting `assignee_id` here bypasses finalization and leaves
    /// notifications untouched.
    ///
    /// # Errors
    /// - `NotFound` when the project or the requested assignee is missing.
    pub fn update_project(
        &mut self,
        id: ProjectId,
        update: &ProjectUpdate,
    ) -> Result<Project, WorkflowError> {
        let unit = self.store.begin()?;
        if let Some(assignee_id) = update.assignee_id {
            unit.get_employee(assignee_id)?
                .ok_or(WorkflowError::NotFound(EntityRef::Employee(assignee_id)))?;
        }
        let updated = unit.update_project(id, update)?;
        unit.commit()?;

        info!(
            "event=project_update module=project status=ok project_id={} assignee_override={}",
            updated.id,
            update.assignee_id.is_some()
        );
        Ok(updated)
    }

    /// Deletes every project together with its notifications and
    /// acceptances.
    pub fn clear_projects(&mut self) -> Result<ClearedProjects, WorkflowError> {
        let unit = self.store.begin()?;
        let cleared = unit.clear_projects()?;
        unit.commit()?;

        info!(
            "event=projects_clear module=project status=ok projects={} notifications={} acceptances={}",
            cleared.projects, cleared.notifications, cleared.acceptances
        );
        Ok(cleared)
    }
}
