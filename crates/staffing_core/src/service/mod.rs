//! Workflow use-case services.
//!
//! # Responsibility
//! - Turn repository primitives into the notify / respond / finalize
//!   commands, each run as one store transaction.
//! - Keep CLI and other front ends decoupled from SQL.

pub mod assignment_service;
pub mod employee_service;
pub mod error;
pub mod notification_service;
pub mod project_service;
