use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{EnrollmentRecord, PhoneNumber};
use tokio::sync::RwLock;

use crate::{RecordId, Result, StoreError, store::EnrollmentStore};

#[derive(Default)]
struct Records {
    by_id: HashMap<RecordId, EnrollmentRecord>,
    // Unique index on phone number.
    by_phone: HashMap<PhoneNumber, RecordId>,
}

#[derive(Default)]
struct FailureSwitches {
    insert: AtomicBool,
    delete: AtomicBool,
    update: AtomicBool,
}

/// In-memory enrollment store.
///
/// Used when no database is configured and in tests. Individual operations
/// can be switched to fail to exercise error paths.
#[derive(Clone, Default)]
pub struct InMemoryEnrollmentStore {
    records: Arc<RwLock<Records>>,
    fail: Arc<FailureSwitches>,
}

impl InMemoryEnrollmentStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail with `Unavailable`.
    pub fn set_fail_on_insert(&self, fail: bool) {
        self.fail.insert.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent delete fail with `Unavailable`.
    pub fn set_fail_on_delete(&self, fail: bool) {
        self.fail.delete.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent enrollment date update fail with `Unavailable`.
    pub fn set_fail_on_update(&self, fail: bool) {
        self.fail.update.store(fail, Ordering::SeqCst);
    }

    /// Removes all records.
    pub async fn clear(&self) {
        let mut records = self.records.write().await;
        records.by_id.clear();
        records.by_phone.clear();
    }

    fn check(switch: &AtomicBool, op: &str) -> Result<()> {
        if switch.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{op} disabled")));
        }
        Ok(())
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn insert(&self, record: &EnrollmentRecord) -> Result<()> {
        Self::check(&self.fail.insert, "insert")?;

        let mut records = self.records.write().await;
        if records.by_phone.contains_key(record.phone_number()) {
            return Err(StoreError::DuplicatePhone(
                record.phone_number().to_string(),
            ));
        }
        records
            .by_phone
            .insert(record.phone_number().clone(), record.id());
        records.by_id.insert(record.id(), record.clone());
        Ok(())
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        Self::check(&self.fail.delete, "delete")?;

        let mut records = self.records.write().await;
        match records.by_id.remove(&id) {
            Some(record) => {
                records.by_phone.remove(record.phone_number());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get(&self, id: RecordId) -> Result<Option<EnrollmentRecord>> {
        Ok(self.records.read().await.by_id.get(&id).cloned())
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<EnrollmentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .by_phone
            .get(phone)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    async fn append_enrollment_date(
        &self,
        id: RecordId,
        date: NaiveDate,
    ) -> Result<EnrollmentRecord> {
        Self::check(&self.fail.update, "update")?;

        let mut records = self.records.write().await;
        let record = records.by_id.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.record_enrollment(date)?;
        Ok(record.clone())
    }

    async fn remove_enrollment_date(
        &self,
        id: RecordId,
        date: NaiveDate,
    ) -> Result<EnrollmentRecord> {
        Self::check(&self.fail.update, "update")?;

        let mut records = self.records.write().await;
        let record = records.by_id.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        record.remove_enrollment(date);
        Ok(record.clone())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.by_id.len())
    }
}
