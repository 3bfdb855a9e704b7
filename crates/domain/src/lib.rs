//! Domain layer for the yoga class enrollment service.
//!
//! This crate holds the single definition of the enrollment rules:
//! - value objects (`Name`, `Age`, `Batch`, `PhoneNumber`) that can only be
//!   built from valid input
//! - the validator turning a raw submission into an `EnrollmentSubmission`
//! - `EnrollmentRecord` with its one-enrollment-per-month rule
//! - a `Clock` abstraction so "today" can be pinned in tests

pub mod clock;
pub mod enrollment;
pub mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use enrollment::{
    Age, Batch, EnrollmentRecord, EnrollmentSubmission, Field, FieldError, Name, PhoneNumber,
    RawSubmission, ValidationErrors, ValidationRules, validate,
};
pub use error::DomainError;
