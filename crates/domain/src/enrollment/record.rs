//! The persisted enrollment record.

use chrono::{Datelike, NaiveDate};
use common::RecordId;
use serde::Serialize;

use super::value_objects::{Age, Batch, Name, PhoneNumber};
use crate::error::DomainError;

/// A submission that passed validation.
///
/// Only [`validate`](super::validate) produces one, so holding an
/// `EnrollmentSubmission` means every field is within its domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSubmission {
    pub name: Name,
    pub age: Age,
    pub selected_batch: Batch,
    pub phone_number: PhoneNumber,
}

/// An enrolled participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRecord {
    id: RecordId,
    name: Name,
    age: Age,
    selected_batch: Batch,
    phone_number: PhoneNumber,
    enrollment_dates: Vec<NaiveDate>,
}

impl EnrollmentRecord {
    /// Creates a fresh record with a single enrollment on `enrolled_on`.
    pub fn new(submission: EnrollmentSubmission, enrolled_on: NaiveDate) -> Self {
        Self {
            id: RecordId::new(),
            name: submission.name,
            age: submission.age,
            selected_batch: submission.selected_batch,
            phone_number: submission.phone_number,
            enrollment_dates: vec![enrolled_on],
        }
    }

    /// Rebuilds a record from stored column values, re-checking every rule.
    pub fn from_stored(
        id: RecordId,
        name: &str,
        age: i64,
        selected_batch: &str,
        phone_number: &str,
        mut enrollment_dates: Vec<NaiveDate>,
    ) -> Result<Self, DomainError> {
        let invalid = |field: &'static str, value: String| DomainError::InvalidStoredValue {
            field,
            value,
        };
        enrollment_dates.sort_unstable();
        Ok(Self {
            id,
            name: Name::parse(name).map_err(|_| invalid("name", name.to_string()))?,
            age: Age::new(age).map_err(|_| invalid("age", age.to_string()))?,
            selected_batch: Batch::parse(selected_batch)
                .map_err(|_| invalid("selected_batch", selected_batch.to_string()))?,
            phone_number: PhoneNumber::parse(phone_number)
                .map_err(|_| invalid("phone_number", phone_number.to_string()))?,
            enrollment_dates,
        })
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn age(&self) -> Age {
        self.age
    }

    pub fn selected_batch(&self) -> Batch {
        self.selected_batch
    }

    pub fn phone_number(&self) -> &PhoneNumber {
        &self.phone_number
    }

    /// Enrollment dates, oldest first.
    pub fn enrollment_dates(&self) -> &[NaiveDate] {
        &self.enrollment_dates
    }

    /// Returns the most recent enrollment date.
    pub fn latest_enrollment(&self) -> Option<NaiveDate> {
        self.enrollment_dates.last().copied()
    }

    /// Returns the enrollment falling in the same calendar month as `date`.
    pub fn enrollment_in_month_of(&self, date: NaiveDate) -> Option<NaiveDate> {
        self.enrollment_dates
            .iter()
            .copied()
            .find(|d| d.year() == date.year() && d.month() == date.month())
    }

    /// Checks the one-enrollment-per-calendar-month rule for `date`.
    pub fn ensure_can_enroll_on(&self, date: NaiveDate) -> Result<(), DomainError> {
        match self.enrollment_in_month_of(date) {
            Some(existing) => Err(DomainError::AlreadyEnrolledThisMonth { existing }),
            None => Ok(()),
        }
    }

    /// Appends an enrollment on `date`, enforcing the monthly rule.
    pub fn record_enrollment(&mut self, date: NaiveDate) -> Result<(), DomainError> {
        self.ensure_can_enroll_on(date)?;
        self.enrollment_dates.push(date);
        self.enrollment_dates.sort_unstable();
        Ok(())
    }

    /// Removes an enrollment on `date`. Returns false if there was none.
    pub fn remove_enrollment(&mut self, date: NaiveDate) -> bool {
        match self.enrollment_dates.iter().position(|d| *d == date) {
            Some(idx) => {
                self.enrollment_dates.remove(idx);
                true
            }
            None => false,
        }
    }
}
