//! Storage for enrollment records.
//!
//! Both implementations enforce phone number uniqueness as part of the
//! insert itself, so a duplicate is reported by the write rather than by a
//! separate lookup that could race with it.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::RecordId;
pub use error::{Result, StoreError};
pub use memory::InMemoryEnrollmentStore;
pub use postgres::PostgresEnrollmentStore;
pub use store::{EnrollmentStore, EnrollmentStoreExt};
