use async_trait::async_trait;
use chrono::NaiveDate;
use domain::{EnrollmentRecord, PhoneNumber};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{RecordId, Result, StoreError, store::EnrollmentStore};

/// Name of the unique constraint on `enrollments.phone_number`.
const PHONE_UNIQUE_CONSTRAINT: &str = "enrollments_phone_number_key";

const SELECT_COLUMNS: &str = "id, name, age, selected_batch, phone_number, enrollment_dates";

/// PostgreSQL-backed enrollment store.
#[derive(Clone)]
pub struct PostgresEnrollmentStore {
    pool: PgPool,
}

impl PostgresEnrollmentStore {
    /// Creates a new PostgreSQL enrollment store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("enrollment migrations applied");
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<EnrollmentRecord> {
        let id = RecordId::from_uuid(row.try_get::<Uuid, _>("id")?);
        let name: String = row.try_get("name")?;
        let age: i16 = row.try_get("age")?;
        let selected_batch: String = row.try_get("selected_batch")?;
        let phone_number: String = row.try_get("phone_number")?;
        let enrollment_dates: Vec<NaiveDate> = row.try_get("enrollment_dates")?;

        Ok(EnrollmentRecord::from_stored(
            id,
            &name,
            i64::from(age),
            &selected_batch,
            &phone_number,
            enrollment_dates,
        )?)
    }

    async fn fetch_by_id(&self, id: RecordId) -> Result<Option<EnrollmentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM enrollments WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }
}

#[async_trait]
impl EnrollmentStore for PostgresEnrollmentStore {
    async fn insert(&self, record: &EnrollmentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO enrollments (id, name, age, selected_batch, phone_number, enrollment_dates)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id().as_uuid())
        .bind(record.name().as_str())
        .bind(i16::from(record.age().years()))
        .bind(record.selected_batch().as_str())
        .bind(record.phone_number().as_str())
        .bind(record.enrollment_dates())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // The unique index is the source of truth for duplicates.
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(PHONE_UNIQUE_CONSTRAINT)
            {
                tracing::debug!(record_id = %record.id(), "phone number already enrolled");
                return StoreError::DuplicatePhone(record.phone_number().to_string());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn delete(&self, id: RecordId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get(&self, id: RecordId) -> Result<Option<EnrollmentRecord>> {
        self.fetch_by_id(id).await
    }

    async fn find_by_phone(&self, phone: &PhoneNumber) -> Result<Option<EnrollmentRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM enrollments WHERE phone_number = $1"
        ))
        .bind(phone.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn append_enrollment_date(
        &self,
        id: RecordId,
        date: NaiveDate,
    ) -> Result<EnrollmentRecord> {
        // The monthly rule is part of the UPDATE so two concurrent renewals
        // cannot both succeed.
        let row = sqlx::query(&format!(
            r#"
            UPDATE enrollments
            SET enrollment_dates = array_append(enrollment_dates, $2::date)
            WHERE id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM unnest(enrollment_dates) AS d
                  WHERE date_trunc('month', d) = date_trunc('month', $2::date)
              )
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Self::row_to_record(row),
            None => {
                let record = self.fetch_by_id(id).await?.ok_or(StoreError::NotFound(id))?;
                record.ensure_can_enroll_on(date)?;
                // Only reachable if a concurrent update removed the blocking
                // date between the UPDATE and this read.
                tracing::warn!(record_id = %id, %date, "enrollment dates changed during renewal");
                Err(StoreError::Unavailable(format!(
                    "concurrent update of enrollment dates for {id}"
                )))
            }
        }
    }

    async fn remove_enrollment_date(
        &self,
        id: RecordId,
        date: NaiveDate,
    ) -> Result<EnrollmentRecord> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE enrollments
            SET enrollment_dates = array_remove(enrollment_dates, $2::date)
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_record)
            .transpose()?
            .ok_or(StoreError::NotFound(id))
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }
}
