//! Employee records.
//!
//! # Invariants
//! - `external_id` is unique across the directory (enforced by storage).
//! - `rating` is always a finite number; new employees start at
//!   [`DEFAULT_RATING`].
//! - Admins create projects and are never notified about them.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Internal employee id (SQLite row id).
pub type EmployeeId = i64;

/// Neutral rating assigned when the caller does not provide one.
pub const DEFAULT_RATING: f64 = 5.0;

/// Stored employee snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    /// Staff code used by operators to identify the employee.
    pub external_id: String,
    pub name: String,
    /// Free-form role label (`developer`, `designer`, ...).
    pub role: String,
    pub is_admin: bool,
    pub rating: f64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

/// Input for registering a new employee.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEmployee {
    pub external_id: String,
    pub name: String,
    pub role: String,
    pub is_admin: bool,
    pub rating: f64,
}

impl NewEmployee {
    /// Builds a non-admin employee with the default rating.
    pub fn new(
        external_id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            external_id: external_id.into(),
            name: name.into(),
            role: role.into(),
            is_admin: false,
            rating: DEFAULT_RATING,
        }
    }

    /// Marks the employee as an administrator.
    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    /// Returns a copy with surrounding whitespace removed from text fields.
    pub fn normalized(&self) -> Self {
        Self {
            external_id: self.external_id.trim().to_string(),
            name: self.name.trim().to_string(),
            role: self.role.trim().to_string(),
            is_admin: self.is_admin,
            rating: self.rating,
        }
    }

    /// Checks field-level rules before persistence.
    ///
    /// # Errors
    /// - Blank `external_id`, `name` or `role`.
    /// - Non-finite `rating`.
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        if self.external_id.trim().is_empty() {
            return Err(EmployeeValidationError::BlankField("external_id"));
        }
        if self.name.trim().is_empty() {
            return Err(EmployeeValidationError::BlankField("name"));
        }
        if self.role.trim().is_empty() {
            return Err(EmployeeValidationError::BlankField("role"));
        }
        validate_rating(self.rating)
    }
}

/// Field-level employee validation failure.
#[derive(Debug, Clone, PartialEq)]
pub enum EmployeeValidationError {
    BlankField(&'static str),
    NonFiniteRating(f64),
    MalformedRating(String),
}

impl Display for EmployeeValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "employee {field} must not be blank"),
            Self::NonFiniteRating(value) => write!(f, "rating must be a finite number, got {value}"),
            Self::MalformedRating(raw) => write!(f, "rating `{raw}` is not a number"),
        }
    }
}

impl Error for EmployeeValidationError {}

/// Rejects NaN and infinite ratings.
pub fn validate_rating(rating: f64) -> Result<(), EmployeeValidationError> {
    if rating.is_finite() {
        Ok(())
    } else {
        Err(EmployeeValidationError::NonFiniteRating(rating))
    }
}

/// Parses operator-supplied rating text.
pub fn parse_rating(raw: &str) -> Result<f64, EmployeeValidationError> {
    let trimmed = raw.trim();
    let rating = trimmed
        .parse::<f64>()
        .map_err(|_| EmployeeValidationError::MalformedRating(trimmed.to_string()))?;
    validate_rating(rating)?;
    Ok(rating)
}
