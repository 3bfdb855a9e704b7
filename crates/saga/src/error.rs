//! Saga error types.

use chrono::NaiveDate;
use common::RecordId;
use domain::{DomainError, ValidationErrors};
use enrollment_store::StoreError;
use thiserror::Error;

use crate::services::PaymentError;
use crate::state::SagaState;

/// Errors that can end an enrollment saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The submission failed validation. Nothing was written.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// The phone number is already enrolled. Nothing was written.
    #[error("User with phone number {phone_number} already exists")]
    Conflict { phone_number: String },

    /// The charge failed and the write was undone.
    #[error("Payment for record {record_id} failed: {source}")]
    Payment {
        record_id: RecordId,
        #[source]
        source: PaymentError,
    },

    /// A write failed before any charge was attempted.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),

    /// The charge failed and undoing the write failed too. The record is left
    /// in storage without a successful payment.
    #[error(
        "Compensation for record {record_id} failed after payment error ({payment}): {storage}"
    )]
    CompensationFailed {
        record_id: RecordId,
        payment: PaymentError,
        storage: StoreError,
    },

    /// No record has the given ID.
    #[error("Record not found: {0}")]
    NotFound(RecordId),

    /// The record already holds an enrollment this calendar month.
    #[error("Already enrolled for this month (enrolled on {existing})")]
    AlreadyEnrolled { existing: NaiveDate },

    /// The task running the saga panicked or was aborted.
    #[error("Saga task did not finish: {0}")]
    Interrupted(#[from] tokio::task::JoinError),

    /// The coordinator attempted a transition the state machine forbids.
    #[error("Invalid saga transition: {from} -> {to}")]
    InvalidTransition { from: SagaState, to: SagaState },
}

impl SagaError {
    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SagaError::Validation(_) => "validation",
            SagaError::Conflict { .. } => "conflict",
            SagaError::Payment { .. } => "payment",
            SagaError::Storage(_) => "storage",
            SagaError::CompensationFailed { .. } => "compensation_failed",
            SagaError::NotFound(_) => "not_found",
            SagaError::AlreadyEnrolled { .. } => "already_enrolled",
            SagaError::Interrupted(_) => "interrupted",
            SagaError::InvalidTransition { .. } => "invalid_transition",
        }
    }
}

impl From<StoreError> for SagaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicatePhone(phone_number) => SagaError::Conflict { phone_number },
            StoreError::NotFound(id) => SagaError::NotFound(id),
            StoreError::Domain(DomainError::AlreadyEnrolledThisMonth { existing }) => {
                SagaError::AlreadyEnrolled { existing }
            }
            other => SagaError::Storage(other),
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
