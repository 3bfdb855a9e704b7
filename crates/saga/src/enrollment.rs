//! Enrollment saga constants.

use serde::Serialize;

/// The saga type identifier for first-time enrollment.
pub const SAGA_ENROLL: &str = "enroll";

/// The saga type identifier for monthly renewal.
pub const SAGA_RENEW: &str = "renew";

/// Default fee charged per enrollment month.
pub const DEFAULT_FEE_AMOUNT: u64 = 500;

/// Default description attached to the charge.
pub const DEFAULT_FEE_DESCRIPTION: &str = "Yoga Monthly Fee";

/// The fee charged for one month of classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentFee {
    /// Amount in whole rupees.
    pub amount: u64,
    pub description: String,
}

impl EnrollmentFee {
    pub fn new(amount: u64, description: impl Into<String>) -> Self {
        Self {
            amount,
            description: description.into(),
        }
    }
}

impl Default for EnrollmentFee {
    fn default() -> Self {
        Self::new(DEFAULT_FEE_AMOUNT, DEFAULT_FEE_DESCRIPTION)
    }
}
