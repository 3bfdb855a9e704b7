//! Enrollment record, its value objects and the validation rules.

mod record;
mod validation;
mod value_objects;

pub use record::{EnrollmentRecord, EnrollmentSubmission};
pub use validation::{
    Field, FieldError, RawSubmission, ValidationErrors, ValidationRules, validate,
};
pub use value_objects::{Age, Batch, Name, PhoneNumber};
