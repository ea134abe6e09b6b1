//! Transactional unit of work for the assignment workflow.
//!
//! # Responsibility
//! - Group the reads and writes of one workflow command into a single
//!   SQLite transaction.
//! - Expose the same repository contracts inside the transaction, so
//!   services stay storage-agnostic.
//!
//! # Invariants
//! - `begin` opens `BEGIN IMMEDIATE`: the write lock is held from the first
//!   read, so two finalize calls on the same database serialize.
//! - Dropping a unit without `commit` rolls every change back.

use crate::model::employee::{Employee, EmployeeId, NewEmployee};
use crate::model::notification::{
    Notification, NotificationId, NotificationStatus, NotificationView,
};
use crate::model::project::{NewProject, Project, ProjectId, ProjectListQuery, ProjectUpdate};
use crate::repo::employee_repo::{
    EmployeeListQuery, EmployeeRepository, SqliteEmployeeRepository, EMPLOYEES_TABLE,
};
use crate::repo::notification_repo::{
    NotificationRepository, SqliteNotificationRepository, NOTIFICATIONS_TABLE,
};
use crate::repo::project_repo::{
    delete_all_projects, ClearedProjects, ProjectRepository, SqliteProjectRepository,
    ACCEPTANCES_TABLE, PROJECTS_TABLE,
};
use crate::repo::{ensure_schema_ready, RepoResult};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Source of transactional units.
pub trait WorkflowStore {
    type Unit<'a>: WorkflowUnit
    where
        Self: 'a;

    /// Opens a write unit holding the database write lock.
    fn begin(&mut self) -> RepoResult<Self::Unit<'_>>;

    /// Opens a read unit over a consistent snapshot.
    fn begin_read(&mut self) -> RepoResult<Self::Unit<'_>>;
}

/// One transaction's view of the entity store.
pub trait WorkflowUnit: EmployeeRepository + ProjectRepository + NotificationRepository {
    /// Removes all projects with their notifications and acceptances.
    fn clear_projects(&self) -> RepoResult<ClearedProjects>;

    /// Makes every change of this unit durable.
    fn commit(self) -> RepoResult<()>;
}

/// SQLite-backed workflow store borrowing one connection.
pub struct SqliteWorkflowStore<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteWorkflowStore<'conn> {
    /// Builds a store after checking every workflow table.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_schema_ready(
            conn,
            &[
                EMPLOYEES_TABLE,
                PROJECTS_TABLE,
                NOTIFICATIONS_TABLE,
                ACCEPTANCES_TABLE,
            ],
        )?;
        Ok(Self { conn })
    }

    fn open_unit(&mut self, behavior: TransactionBehavior) -> RepoResult<SqliteWorkflowUnit<'_>> {
        let tx = self.conn.transaction_with_behavior(behavior)?;
        Ok(SqliteWorkflowUnit { tx })
    }
}

impl WorkflowStore for SqliteWorkflowStore<'_> {
    type Unit<'a>
        = SqliteWorkflowUnit<'a>
    where
        Self: 'a;

    fn begin(&mut self) -> RepoResult<Self::Unit<'_>> {
        self.open_unit(TransactionBehavior::Immediate)
    }

    fn begin_read(&mut self) -> RepoResult<Self::Unit<'_>> {
        self.open_unit(TransactionBehavior::Deferred)
    }
}

/// Open SQLite transaction implementing every workflow repository.
pub struct SqliteWorkflowUnit<'a> {
    tx: Transaction<'a>,
}

impl SqliteWorkflowUnit<'_> {
    fn employees(&self) -> SqliteEmployeeRepository<'_> {
        SqliteEmployeeRepository::on_verified(&self.tx)
    }

    fn projects(&self) -> SqliteProjectRepository<'_> {
        SqliteProjectRepository::on_verified(&self.tx)
    }

    fn notifications(&self) -> SqliteNotificationRepository<'_> {
        SqliteNotificationRepository::on_verified(&self.tx)
    }
}

impl WorkflowUnit for SqliteWorkflowUnit<'_> {
    fn clear_projects(&self) -> RepoResult<ClearedProjects> {
        delete_all_projects(&self.tx)
    }

    fn commit(self) -> RepoResult<()> {
        self.tx.commit()?;
        Ok(())
    }
}

impl EmployeeRepository for SqliteWorkflowUnit<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        self.employees().create_employee(employee)
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.employees().get_employee(id)
    }

    fn find_employee_by_external_id(&self, external_id: &str) -> RepoResult<Option<Employee>> {
        self.employees().find_employee_by_external_id(external_id)
    }

    fn list_employees(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>> {
        self.employees().list_employees(query)
    }

    fn update_employee_rating(&self, id: EmployeeId, rating: f64) -> RepoResult<Employee> {
        self.employees().update_employee_rating(id, rating)
    }
}

impl ProjectRepository for SqliteWorkflowUnit<'_> {
    fn insert_project(&self, project: &NewProject) -> RepoResult<Project> {
        self.projects().insert_project(project)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.projects().get_project(id)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        self.projects().list_projects(query)
    }

    fn update_project(&self, id: ProjectId, update: &ProjectUpdate) -> RepoResult<Project> {
        self.projects().update_project(id, update)
    }

    fn assign_project(&self, id: ProjectId, employee_id: EmployeeId) -> RepoResult<Project> {
        self.projects().assign_project(id, employee_id)
    }

    fn add_acceptor(&self, project_id: ProjectId, employee_id: EmployeeId) -> RepoResult<bool> {
        self.projects().add_acceptor(project_id, employee_id)
    }

    fn list_acceptors(&self, project_id: ProjectId) -> RepoResult<Vec<Employee>> {
        self.projects().list_acceptors(project_id)
    }
}

impl NotificationRepository for SqliteWorkflowUnit<'_> {
    fn insert_notification(
        &self,
        project_id: ProjectId,
        employee_id: EmployeeId,
    ) -> RepoResult<Notification> {
        self.notifications()
            .insert_notification(project_id, employee_id)
    }

    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        self.notifications().get_notification(id)
    }

    fn set_notification_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> RepoResult<Notification> {
        self.notifications().set_notification_status(id, status)
    }

    fn list_project_notifications(&self, project_id: ProjectId) -> RepoResult<Vec<Notification>> {
        self.notifications().list_project_notifications(project_id)
    }

    fn list_employee_notifications(
        &self,
        employee_id: EmployeeId,
        statuses: &[NotificationStatus],
    ) -> RepoResult<Vec<NotificationView>> {
        self.notifications()
            .list_employee_notifications(employee_id, statuses)
    }

    fn resolve_project_notifications(
        &self,
        project_id: ProjectId,
        winner_id: EmployeeId,
    ) -> RepoResult<usize> {
        self.notifications()
            .resolve_project_notifications(project_id, winner_id)
    }
}
