//! Employee directory use-cases.
//!
//! # Invariants
//! - Ratings stay finite; malformed input is a validation error.
//! - `ensure_admin` is idempotent for the same external id.

use crate::model::employee::{validate_rating, Employee, EmployeeId, NewEmployee};
use crate::model::EntityRef;
use crate::repo::employee_repo::{EmployeeListQuery, EmployeeRepository};
use crate::repo::workflow_store::{WorkflowStore, WorkflowUnit};
use crate::service::error::WorkflowError;
use log::info;
use serde::Serialize;

/// Result of the admin bootstrap command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminBootstrap {
    pub employee: Employee,
    /// `false` when the admin already existed.
    pub created: bool,
}

/// Employee directory facade.
pub struct EmployeeService<S: WorkflowStore> {
    store: S,
}

impl<S: WorkflowStore> EmployeeService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers one employee.
    ///
    /// # Errors
    /// - `Validation` for blank fields, a non-finite rating, or an external
    ///   id that is already taken.
    pub fn create_employee(&mut self, employee: &NewEmployee) -> Result<Employee, WorkflowError> {
        employee.validate()?;

        let unit = self.store.begin()?;
        let created = unit.create_employee(employee)?;
        unit.commit()?;

        info!(
            "event=employee_create module=employee status=ok employee_id={} is_admin={}",
            created.id, created.is_admin
        );
        Ok(created)
    }

    /// Creates the admin account unless one with the same external id exists.
    ///
    /// # Errors
    /// - `Conflict` when the external id belongs to a non-admin employee.
    pub fn ensure_admin(&mut self, admin: NewEmployee) -> Result<AdminBootstrap, WorkflowError> {
        let admin = admin.admin();
        admin.validate()?;

        let unit = self.store.begin()?;
        if let Some(existing) = unit.find_employee_by_external_id(&admin.external_id)? {
            if !existing.is_admin {
                return Err(WorkflowError::Conflict(format!(
                    "employee id `{}` exists but is not an admin",
                    existing.external_id
                )));
            }
            return Ok(AdminBootstrap {
                employee: existing,
                created: false,
            });
        }

        let employee = unit.create_employee(&admin)?;
        unit.commit()?;

        info!(
            "event=admin_bootstrap module=employee status=ok employee_id={}",
            employee.id
        );
        Ok(AdminBootstrap {
            employee,
            created: true,
        })
    }

    pub fn get_employee(&mut self, id: EmployeeId) -> Result<Employee, WorkflowError> {
        let unit = self.store.begin_read()?;
        unit.get_employee(id)?
            .ok_or(WorkflowError::NotFound(EntityRef::Employee(id)))
    }

    pub fn find_by_external_id(
        &mut self,
        external_id: &str,
    ) -> Result<Option<Employee>, WorkflowError> {
        let unit = self.store.begin_read()?;
        Ok(unit.find_employee_by_external_id(external_id)?)
    }

    pub fn list_employees(
        &mut self,
        query: &EmployeeListQuery,
    ) -> Result<Vec<Employee>, WorkflowError> {
        let unit = self.store.begin_read()?;
        Ok(unit.list_employees(query)?)
    }

    /// Overwrites an employee's rating and returns the fresh record.
    ///
    /// Ratings only influence finalizations that have not happened yet.
    pub fn update_rating(
        &mut self,
        id: EmployeeId,
        rating: f64,
    ) -> Result<Employee, WorkflowError> {
        validate_rating(rating)?;

        let unit = self.store.begin()?;
        let updated = unit.update_employee_rating(id, rating)?;
        unit.commit()?;

        info!(
            "event=employee_rating_update module=employee status=ok employee_id={}",
            updated.id
        );
        Ok(updated)
    }
}
