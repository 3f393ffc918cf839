//! Error types for value object construction.

use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: &'static str },

    #[error("Field '{field}' must be positive, got {actual}")]
    NotPositive { field: &'static str, actual: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: &'static str) -> Self {
        ValidationError::EmptyField { field }
    }

    /// Creates a not-positive validation error.
    pub fn not_positive(field: &'static str, actual: impl ToString) -> Self {
        ValidationError::NotPositive {
            field,
            actual: actual.to_string(),
        }
    }
}
