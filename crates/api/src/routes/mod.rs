//! HTTP route handlers.

pub mod enrollments;
pub mod health;
pub mod metrics;
