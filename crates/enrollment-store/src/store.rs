use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{EnrollmentRecord, PhoneNumber};

use crate::{RecordId, Result};

/// Core trait for enrollment record storage.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Persists a new record.
    ///
    /// Fails with `DuplicatePhone` if any record already uses the same phone
    /// number. The check and the write are a single atomic step.
    async fn insert(&self, record: &EnrollmentRecord) -> Result<()>;

    /// Deletes a record. Returns false if it did not exist.
    async fn delete(&self, id: RecordId) -> Result<bool>;

    /// Loads a record by ID.
    async fn get(&self, id: RecordId) -> Result<Option<EnrollmentRecord>>;

    /// Loads the record holding a phone number.
    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<EnrollmentRecord>>;

    /// Appends an enrollment date, enforcing one enrollment per calendar
    /// month atomically. Returns the updated record.
    async fn append_enrollment_date(
        &self,
        id: RecordId,
        date: NaiveDate,
    ) -> Result<EnrollmentRecord>;

    /// Removes an enrollment date. Returns the updated record.
    async fn remove_enrollment_date(
        &self,
        id: RecordId,
        date: NaiveDate,
    ) -> Result<EnrollmentRecord>;

    /// Returns the number of stored records.
    async fn count(&self) -> Result<usize>;
}

/// Extension trait providing convenience methods for stores.
#[async_trait]
pub trait EnrollmentStoreExt: EnrollmentStore {
    /// Checks if a record exists.
    async fn exists(&self, id: RecordId) -> Result<bool> {
        Ok(self.get(id).await?.is_some())
    }

    /// Checks if a phone number is already enrolled.
    async fn phone_taken(&self, phone: &PhoneNumber) -> Result<bool> {
        Ok(self.find_by_phone(phone).await?.is_some())
    }
}

impl<T: EnrollmentStore + ?Sized> EnrollmentStoreExt for T {}
