use domain::DomainError;
use thiserror::Error;

use crate::RecordId;

/// Errors that can occur when interacting with the enrollment store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another record already uses this phone number.
    #[error("A record with phone number {0} already exists")]
    DuplicatePhone(String),

    /// No record has the given ID.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// The change would break a record rule, or a stored row is invalid.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The store refused the operation (used by the in-memory store to
    /// simulate outages).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
