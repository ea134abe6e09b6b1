//! Project and acceptance-relation persistence.
//!
//! # Invariants
//! - `assign_project` only writes while `assignee_id IS NULL`; a second
//!   assignment attempt reports `RepoError::AlreadyAssigned`.
//! - Acceptance rows are insert-or-ignore and are never removed here.
//! - Acceptors are returned rating descending, then id ascending.

use crate::model::employee::{Employee, EmployeeId};
use crate::model::project::{
    NewProject, Project, ProjectId, ProjectListQuery, ProjectStatus, ProjectUpdate,
};
use crate::model::EntityRef;
use crate::repo::employee_repo::{parse_employee_row, EMPLOYEES_TABLE};
use crate::repo::{ensure_schema_ready, RepoError, RepoResult, TableSpec};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::Serialize;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    status,
    priority,
    deadline,
    created_by,
    assignee_id,
    created_at
FROM projects";

pub(crate) const PROJECTS_TABLE: TableSpec = TableSpec {
    name: "projects",
    columns: &[
        "id",
        "title",
        "description",
        "status",
        "priority",
        "deadline",
        "created_by",
        "assignee_id",
        "created_at",
        "updated_at",
    ],
};

pub(crate) const ACCEPTANCES_TABLE: TableSpec = TableSpec {
    name: "project_acceptances",
    columns: &["project_id", "employee_id", "accepted_at"],
};

/// Row counts removed by a full project wipe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClearedProjects {
    pub acceptances: usize,
    pub notifications: usize,
    pub projects: usize,
}

/// Repository interface for projects and their acceptors.
pub trait ProjectRepository {
    /// Inserts a `pending`, unassigned project.
    fn insert_project(&self, project: &NewProject) -> RepoResult<Project>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    /// Applies a partial update and returns the new snapshot.
    fn update_project(&self, id: ProjectId, update: &ProjectUpdate) -> RepoResult<Project>;
    /// Sets the assignee and moves the project to `in_progress`, only if it
    /// has no assignee yet.
    fn assign_project(&self, id: ProjectId, employee_id: EmployeeId) -> RepoResult<Project>;
    /// Records an acceptance; returns `false` when the pair already existed.
    fn add_acceptor(&self, project_id: ProjectId, employee_id: EmployeeId) -> RepoResult<bool>;
    fn list_acceptors(&self, project_id: ProjectId) -> RepoResult<Vec<Employee>>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[EMPLOYEES_TABLE, PROJECTS_TABLE, ACCEPTANCES_TABLE])?;
        Ok(Self { conn })
    }

    pub(crate) fn on_verified(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn insert_project(&self, project: &NewProject) -> RepoResult<Project> {
        let project = project.normalized();
        project
            .validate()
            .map_err(|err| RepoError::Validation(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO projects (title, description, status, priority, deadline, created_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                project.title.as_str(),
                project.description.as_deref(),
                ProjectStatus::Pending.as_str(),
                project.priority,
                project.deadline,
                project.creator_id,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_project(id)?
            .ok_or(RepoError::NotFound(EntityRef::Project(id)))
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        self.conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_project_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let mut sql = format!("{PROJECT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(assignee_id) = query.assignee_id {
            sql.push_str(" AND assignee_id = ?");
            bind_values.push(Value::Integer(assignee_id));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn update_project(&self, id: ProjectId, update: &ProjectUpdate) -> RepoResult<Project> {
        let mut assignments: Vec<&str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = update.status {
            assignments.push("status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = update.priority {
            assignments.push("priority = ?");
            bind_values.push(Value::Integer(priority));
        }
        if let Some(assignee_id) = update.assignee_id {
            assignments.push("assignee_id = ?");
            bind_values.push(Value::Integer(assignee_id));
        }
        if let Some(description) = update.description.as_ref() {
            assignments.push("description = ?");
            bind_values.push(Value::Text(description.clone()));
        }
        if let Some(deadline) = update.deadline {
            assignments.push("deadline = ?");
            bind_values.push(Value::Integer(deadline));
        }
        assignments.push("updated_at = (strftime('%s', 'now') * 1000)");
        bind_values.push(Value::Integer(id));

        let sql = format!(
            "UPDATE projects SET {} WHERE id = ?;",
            assignments.join(", ")
        );
        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Project(id)));
        }

        self.get_project(id)?
            .ok_or(RepoError::NotFound(EntityRef::Project(id)))
    }

    fn assign_project(&self, id: ProjectId, employee_id: EmployeeId) -> RepoResult<Project> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                assignee_id = ?2,
                status = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND assignee_id IS NULL;",
            params![id, employee_id, ProjectStatus::InProgress.as_str()],
        )?;

        if changed == 0 {
            return match self.get_project(id)?.and_then(|project| project.assignee_id) {
                Some(assignee_id) => Err(RepoError::AlreadyAssigned {
                    project_id: id,
                    assignee_id,
                }),
                None => Err(RepoError::NotFound(EntityRef::Project(id))),
            };
        }

        self.get_project(id)?
            .ok_or(RepoError::NotFound(EntityRef::Project(id)))
    }

    fn add_acceptor(&self, project_id: ProjectId, employee_id: EmployeeId) -> RepoResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO project_acceptances (project_id, employee_id)
             VALUES (?1, ?2);",
            params![project_id, employee_id],
        )?;
        Ok(inserted == 1)
    }

    fn list_acceptors(&self, project_id: ProjectId) -> RepoResult<Vec<Employee>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                e.id,
                e.external_id,
                e.name,
                e.role,
                e.is_admin,
                e.rating,
                e.created_at
             FROM project_acceptances pa
             INNER JOIN employees e ON e.id = pa.employee_id
             WHERE pa.project_id = ?1
             ORDER BY e.rating DESC, e.id ASC;",
        )?;
        let mut rows = stmt.query([project_id])?;
        let mut acceptors = Vec::new();
        while let Some(row) = rows.next()? {
            acceptors.push(parse_employee_row(row)?);
        }
        Ok(acceptors)
    }
}

/// Deletes every acceptance, notification and project row.
///
/// Callers run this inside a transaction so the wipe is all-or-nothing.
pub(crate) fn delete_all_projects(conn: &Connection) -> RepoResult<ClearedProjects> {
    let acceptances = conn.execute("DELETE FROM project_acceptances;", [])?;
    let notifications = conn.execute("DELETE FROM notifications;", [])?;
    let projects = conn.execute("DELETE FROM projects;", [])?;
    Ok(ClearedProjects {
        acceptances,
        notifications,
        projects,
    })
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let status_text: String = row.get("status")?;
    let status = ProjectStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid project status `{status_text}` in projects.status"
        ))
    })?;

    Ok(Project {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        priority: row.get("priority")?,
        deadline: row.get("deadline")?,
        created_by: row.get("created_by")?,
        assignee_id: row.get("assignee_id")?,
        created_at: row.get("created_at")?,
    })
}
