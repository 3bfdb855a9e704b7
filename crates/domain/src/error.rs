//! Domain error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by enrollment record operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// The record already holds an enrollment in the same calendar month.
    #[error("Already enrolled for this month (existing enrollment on {existing})")]
    AlreadyEnrolledThisMonth { existing: NaiveDate },

    /// A stored value no longer satisfies the enrollment rules.
    #[error("Invalid stored value for {field}: {value}")]
    InvalidStoredValue { field: &'static str, value: String },
}
