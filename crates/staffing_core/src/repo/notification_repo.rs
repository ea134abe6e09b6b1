//! Notification persistence.
//!
//! # Invariants
//! - At most one notification per `(employee_id, project_id)` pair.
//! - `resolve_project_notifications` rewrites every notification of a
//!   project in a single statement: the winner's becomes `assigned`, all
//!   others `closed`, whatever their previous status.

use crate::model::employee::EmployeeId;
use crate::model::notification::{
    Notification, NotificationId, NotificationStatus, NotificationView,
};
use crate::model::project::ProjectId;
use crate::model::EntityRef;
use crate::repo::project_repo::PROJECTS_TABLE;
use crate::repo::{ensure_schema_ready, RepoError, RepoResult, TableSpec};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    employee_id,
    project_id,
    status,
    created_at
FROM notifications";

pub(crate) const NOTIFICATIONS_TABLE: TableSpec = TableSpec {
    name: "notifications",
    columns: &[
        "id",
        "employee_id",
        "project_id",
        "status",
        "created_at",
        "updated_at",
    ],
};

/// Repository interface for notifications.
pub trait NotificationRepository {
    /// Inserts one `pending` notification.
    fn insert_notification(
        &self,
        project_id: ProjectId,
        employee_id: EmployeeId,
    ) -> RepoResult<Notification>;
    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    fn set_notification_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> RepoResult<Notification>;
    /// All notifications of one project, ordered by id.
    fn list_project_notifications(&self, project_id: ProjectId) -> RepoResult<Vec<Notification>>;
    /// Dashboard rows for one employee. An empty `statuses` slice means no
    /// status filter.
    fn list_employee_notifications(
        &self,
        employee_id: EmployeeId,
        statuses: &[NotificationStatus],
    ) -> RepoResult<Vec<NotificationView>>;
    /// Marks the winner's notification `assigned` and every other one
    /// `closed`. Returns the number of rows rewritten.
    fn resolve_project_notifications(
        &self,
        project_id: ProjectId,
        winner_id: EmployeeId,
    ) -> RepoResult<usize>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[PROJECTS_TABLE, NOTIFICATIONS_TABLE])?;
        Ok(Self { conn })
    }

    pub(crate) fn on_verified(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert_notification(
        &self,
        project_id: ProjectId,
        employee_id: EmployeeId,
    ) -> RepoResult<Notification> {
        self.conn.execute(
            "INSERT INTO notifications (employee_id, project_id, status)
             VALUES (?1, ?2, ?3);",
            params![employee_id, project_id, NotificationStatus::Pending.as_str()],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_notification(id)?
            .ok_or(RepoError::NotFound(EntityRef::Notification(id)))
    }

    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        self.conn
            .query_row(
                &format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_notification_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn set_notification_status(
        &self,
        id: NotificationId,
        status: NotificationStatus,
    ) -> RepoResult<Notification> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET
                status = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, status.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Notification(id)));
        }

        self.get_notification(id)?
            .ok_or(RepoError::NotFound(EntityRef::Notification(id)))
    }

    fn list_project_notifications(&self, project_id: ProjectId) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL} WHERE project_id = ?1 ORDER BY id ASC;"
        ))?;
        let mut rows = stmt.query([project_id])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }

    fn list_employee_notifications(
        &self,
        employee_id: EmployeeId,
        statuses: &[NotificationStatus],
    ) -> RepoResult<Vec<NotificationView>> {
        let mut sql = String::from(
            "SELECT
                n.id,
                n.project_id,
                n.status,
                n.created_at,
                p.title,
                p.description,
                p.priority
             FROM notifications n
             INNER JOIN projects p ON p.id = n.project_id
             WHERE n.employee_id = ?",
        );
        let mut bind_values = vec![Value::Integer(employee_id)];

        if !statuses.is_empty() {
            let placeholders = vec!["?"; statuses.len()].join(", ");
            sql.push_str(&format!(" AND n.status IN ({placeholders})"));
            bind_values.extend(
                statuses
                    .iter()
                    .map(|status| Value::Text(status.as_str().to_string())),
            );
        }
        sql.push_str(" ORDER BY n.id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut views = Vec::new();
        while let Some(row) = rows.next()? {
            views.push(NotificationView {
                id: row.get("id")?,
                project_id: row.get("project_id")?,
                project_title: row.get("title")?,
                project_description: row.get("description")?,
                project_priority: row.get("priority")?,
                status: parse_status(row)?,
                created_at: row.get("created_at")?,
            });
        }
        Ok(views)
    }

    fn resolve_project_notifications(
        &self,
        project_id: ProjectId,
        winner_id: EmployeeId,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications
             SET
                status = CASE WHEN employee_id = ?2 THEN ?3 ELSE ?4 END,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE project_id = ?1;",
            params![
                project_id,
                winner_id,
                NotificationStatus::Assigned.as_str(),
                NotificationStatus::Closed.as_str(),
            ],
        )?;
        Ok(changed)
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        project_id: row.get("project_id")?,
        status: parse_status(row)?,
        created_at: row.get("created_at")?,
    })
}

fn parse_status(row: &Row<'_>) -> RepoResult<NotificationStatus> {
    let value: String = row.get("status")?;
    NotificationStatus::parse(&value).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification status `{value}` in notifications.status"
        ))
    })
}
