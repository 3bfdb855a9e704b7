//! Shared types for the enrollment service crates.

pub mod types;

pub use types::RecordId;
