//! Saga pattern implementation for class enrollment.
//!
//! Creating a record and charging for it cannot share a transaction, so the
//! enrollment saga runs them as two steps with a compensating action:
//! 1. Create the enrollment record
//! 2. Charge the enrollment fee
//!
//! If the charge fails (or times out) the record is deleted again. No record
//! survives a failed charge, and no charge is attempted for a record that
//! failed to persist. Monthly renewals follow the same shape, with the
//! appended enrollment date as the compensated step.

pub mod coordinator;
pub mod enrollment;
pub mod error;
pub mod run;
pub mod services;
pub mod state;

pub use coordinator::{EnrollmentOutcome, EnrollmentSaga, RenewalOutcome};
pub use enrollment::EnrollmentFee;
pub use error::SagaError;
pub use run::SagaRun;
pub use services::{
    ChargeRequest, InMemoryPaymentProcessor, PaymentBehavior, PaymentError, PaymentProcessor,
    PaymentReceipt, SimulatedPaymentProcessor,
};
pub use state::SagaState;
