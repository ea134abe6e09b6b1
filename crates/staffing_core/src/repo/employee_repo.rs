//! Employee directory persistence.
//!
//! # Invariants
//! - `external_id` uniqueness violations surface as
//!   `RepoError::DuplicateExternalId`, not as raw SQLite errors.
//! - Listings are ordered by internal id ascending.

use crate::model::employee::{validate_rating, Employee, EmployeeId, NewEmployee};
use crate::model::EntityRef;
use crate::repo::{
    bool_to_int, ensure_schema_ready, int_to_bool, RepoError, RepoResult, TableSpec,
};
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, OptionalExtension, Row};

const EMPLOYEE_SELECT_SQL: &str = "SELECT
    id,
    external_id,
    name,
    role,
    is_admin,
    rating,
    created_at
FROM employees";

pub(crate) const EMPLOYEES_TABLE: TableSpec = TableSpec {
    name: "employees",
    columns: &[
        "id",
        "external_id",
        "name",
        "role",
        "is_admin",
        "rating",
        "created_at",
        "updated_at",
    ],
};

/// Filter for employee listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmployeeListQuery {
    /// `Some(false)` keeps only regular staff, `Some(true)` only admins.
    pub is_admin: Option<bool>,
}

impl EmployeeListQuery {
    /// Employees eligible for project notifications.
    pub fn non_admins() -> Self {
        Self {
            is_admin: Some(false),
        }
    }
}

/// Repository interface for the employee directory.
pub trait EmployeeRepository {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee>;
    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
    fn find_employee_by_external_id(&self, external_id: &str) -> RepoResult<Option<Employee>>;
    fn list_employees(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>>;
    /// Overwrites one rating and returns the updated record.
    fn update_employee_rating(&self, id: EmployeeId, rating: f64) -> RepoResult<Employee>;
}

/// SQLite-backed employee repository.
pub struct SqliteEmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeRepository<'conn> {
    /// Builds a repository after checking the connection schema.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, &[EMPLOYEES_TABLE])?;
        Ok(Self { conn })
    }

    /// Builds a repository on a connection the caller already verified.
    pub(crate) fn on_verified(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeRepository for SqliteEmployeeRepository<'_> {
    fn create_employee(&self, employee: &NewEmployee) -> RepoResult<Employee> {
        let employee = employee.normalized();
        employee
            .validate()
            .map_err(|err| RepoError::Validation(err.to_string()))?;

        let inserted = self.conn.execute(
            "INSERT INTO employees (external_id, name, role, is_admin, rating)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                employee.external_id.as_str(),
                employee.name.as_str(),
                employee.role.as_str(),
                bool_to_int(employee.is_admin),
                employee.rating,
            ],
        );
        if let Err(err) = inserted {
            return Err(match err {
                rusqlite::Error::SqliteFailure(code, _)
                    if code.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    RepoError::DuplicateExternalId(employee.external_id.clone())
                }
                other => other.into(),
            });
        }

        let id = self.conn.last_insert_rowid();
        self.get_employee(id)?
            .ok_or(RepoError::NotFound(EntityRef::Employee(id)))
    }

    fn get_employee(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        self.conn
            .query_row(
                &format!("{EMPLOYEE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                |row| Ok(parse_employee_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_employee_by_external_id(&self, external_id: &str) -> RepoResult<Option<Employee>> {
        self.conn
            .query_row(
                &format!("{EMPLOYEE_SELECT_SQL} WHERE external_id = ?1;"),
                [external_id.trim()],
                |row| Ok(parse_employee_row(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_employees(&self, query: &EmployeeListQuery) -> RepoResult<Vec<Employee>> {
        let mut sql = format!("{EMPLOYEE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(is_admin) = query.is_admin {
            sql.push_str(" AND is_admin = ?");
            bind_values.push(Value::Integer(bool_to_int(is_admin)));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut employees = Vec::new();
        while let Some(row) = rows.next()? {
            employees.push(parse_employee_row(row)?);
        }
        Ok(employees)
    }

    fn update_employee_rating(&self, id: EmployeeId, rating: f64) -> RepoResult<Employee> {
        validate_rating(rating).map_err(|err| RepoError::Validation(err.to_string()))?;

        let changed = self.conn.execute(
            "UPDATE employees
             SET
                rating = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, rating],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(EntityRef::Employee(id)));
        }

        self.get_employee(id)?
            .ok_or(RepoError::NotFound(EntityRef::Employee(id)))
    }
}

pub(crate) fn parse_employee_row(row: &Row<'_>) -> RepoResult<Employee> {
    let rating: f64 = row.get("rating")?;
    if !rating.is_finite() {
        return Err(RepoError::InvalidData(format!(
            "non-finite rating `{rating}` in employees.rating"
        )));
    }

    Ok(Employee {
        id: row.get("id")?,
        external_id: row.get("external_id")?,
        name: row.get("name")?,
        role: row.get("role")?,
        is_admin: int_to_bool(row.get("is_admin")?, "employees.is_admin")?,
        rating,
        created_at: row.get("created_at")?,
    })
}
