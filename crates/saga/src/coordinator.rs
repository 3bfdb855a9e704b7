//! Saga coordinator for enrollment and monthly renewal.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::RecordId;
use domain::{Clock, EnrollmentRecord, RawSubmission, SystemClock, validate};
use enrollment_store::{EnrollmentStore, StoreError};

use crate::enrollment::{self, EnrollmentFee};
use crate::error::SagaError;
use crate::run::SagaRun;
use crate::services::payment::{ChargeRequest, PaymentError, PaymentProcessor, PaymentReceipt};
use crate::state::SagaState;

/// Default bound on a single payment call.
pub const DEFAULT_PAYMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a successful enrollment.
#[derive(Debug, Clone)]
pub struct EnrollmentOutcome {
    pub record: EnrollmentRecord,
    pub receipt: PaymentReceipt,
    pub run: SagaRun,
}

/// Result of a successful monthly renewal.
#[derive(Debug, Clone)]
pub struct RenewalOutcome {
    pub record: EnrollmentRecord,
    pub receipt: PaymentReceipt,
    pub run: SagaRun,
}

/// Orchestrates the enrollment saga.
///
/// The coordinator writes first and charges second, undoing the write when
/// the charge fails or times out.
pub struct EnrollmentSaga<S, P>
where
    S: EnrollmentStore,
    P: PaymentProcessor,
{
    store: S,
    payment: P,
    clock: Arc<dyn Clock>,
    fee: EnrollmentFee,
    payment_timeout: Duration,
}

impl<S, P> EnrollmentSaga<S, P>
where
    S: EnrollmentStore,
    P: PaymentProcessor,
{
    /// Creates a coordinator using the system clock, the default fee and the
    /// default payment timeout.
    pub fn new(store: S, payment: P) -> Self {
        Self {
            store,
            payment,
            clock: Arc::new(SystemClock),
            fee: EnrollmentFee::default(),
            payment_timeout: DEFAULT_PAYMENT_TIMEOUT,
        }
    }

    /// Replaces the source of "today".
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the fee charged per enrollment.
    pub fn with_fee(mut self, fee: EnrollmentFee) -> Self {
        self.fee = fee;
        self
    }

    /// Replaces the bound on a single payment call.
    pub fn with_payment_timeout(mut self, timeout: Duration) -> Self {
        self.payment_timeout = timeout;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fee(&self) -> &EnrollmentFee {
        &self.fee
    }

    /// Loads a record by ID.
    pub async fn get_record(&self, id: RecordId) -> Result<Option<EnrollmentRecord>, SagaError> {
        self.store.get(id).await.map_err(SagaError::from)
    }

    /// Validates a submission, creates its record and charges the fee.
    ///
    /// On a failed charge the record is deleted before the error is
    /// returned.
    #[tracing::instrument(skip(self, raw), fields(saga_type = enrollment::SAGA_ENROLL))]
    pub async fn enroll(&self, raw: &RawSubmission) -> Result<EnrollmentOutcome, SagaError> {
        let started = Instant::now();
        metrics::counter!("enrollment_saga_total", "saga" => enrollment::SAGA_ENROLL).increment(1);

        let mut run = SagaRun::new();
        let result = self.run_enrollment(&mut run, raw).await;

        self.record_finish(enrollment::SAGA_ENROLL, started, &run, result.as_ref().err());
        result.map(|(record, receipt)| EnrollmentOutcome {
            record,
            receipt,
            run,
        })
    }

    async fn run_enrollment(
        &self,
        run: &mut SagaRun,
        raw: &RawSubmission,
    ) -> Result<(EnrollmentRecord, PaymentReceipt), SagaError> {
        // Validating
        let submission = match validate(raw) {
            Ok(submission) => submission,
            Err(errors) => {
                run.advance(SagaState::Failed)?;
                return Err(SagaError::Validation(errors));
            }
        };

        // Creating. The store's unique phone constraint is the only
        // duplicate check.
        run.advance(SagaState::Creating)?;
        let record = EnrollmentRecord::new(submission, self.clock.today());
        if let Err(e) = self.store.insert(&record).await {
            run.advance(SagaState::Failed)?;
            return Err(SagaError::from(e));
        }
        tracing::info!(record_id = %record.id(), "enrollment record created");

        // Charging
        run.advance(SagaState::Charging)?;
        match self.charge(record.id()).await {
            Ok(receipt) => {
                run.advance(SagaState::Done)?;
                Ok((record, receipt))
            }
            Err(payment) => {
                let record_id = record.id();
                let store = &self.store;
                self.compensate(run, record_id, payment, async move {
                    store.delete(record_id).await.map(|_| ())
                })
                .await
            }
        }
    }

    /// Appends today's enrollment to an existing record and charges the fee.
    ///
    /// At most one enrollment per calendar month is allowed. On a failed
    /// charge the appended date is removed again.
    #[tracing::instrument(skip(self), fields(saga_type = enrollment::SAGA_RENEW))]
    pub async fn renew(&self, id: RecordId) -> Result<RenewalOutcome, SagaError> {
        let started = Instant::now();
        metrics::counter!("enrollment_saga_total", "saga" => enrollment::SAGA_RENEW).increment(1);

        let mut run = SagaRun::new();
        let result = self.run_renewal(&mut run, id).await;

        self.record_finish(enrollment::SAGA_RENEW, started, &run, result.as_ref().err());
        result.map(|(record, receipt)| RenewalOutcome {
            record,
            receipt,
            run,
        })
    }

    async fn run_renewal(
        &self,
        run: &mut SagaRun,
        id: RecordId,
    ) -> Result<(EnrollmentRecord, PaymentReceipt), SagaError> {
        let today = self.clock.today();

        // Validating
        let checked = match self.store.get(id).await {
            Ok(Some(record)) => record
                .ensure_can_enroll_on(today)
                .map_err(|e| SagaError::from(StoreError::Domain(e))),
            Ok(None) => Err(SagaError::NotFound(id)),
            Err(e) => Err(SagaError::from(e)),
        };
        if let Err(e) = checked {
            run.advance(SagaState::Failed)?;
            return Err(e);
        }

        // Creating. The store re-checks the monthly rule atomically.
        run.advance(SagaState::Creating)?;
        let record = match self.store.append_enrollment_date(id, today).await {
            Ok(record) => record,
            Err(e) => {
                run.advance(SagaState::Failed)?;
                return Err(SagaError::from(e));
            }
        };
        tracing::info!(record_id = %id, date = %today, "enrollment date appended");

        // Charging
        run.advance(SagaState::Charging)?;
        match self.charge(id).await {
            Ok(receipt) => {
                run.advance(SagaState::Done)?;
                Ok((record, receipt))
            }
            Err(payment) => {
                let store = &self.store;
                self.compensate(run, id, payment, async move {
                    store.remove_enrollment_date(id, today).await.map(|_| ())
                })
                .await
            }
        }
    }

    /// Calls the payment processor, treating a timeout as a failed charge.
    async fn charge(&self, record_id: RecordId) -> Result<PaymentReceipt, PaymentError> {
        let request = ChargeRequest {
            record_id,
            amount: self.fee.amount,
            description: self.fee.description.clone(),
        };

        match tokio::time::timeout(self.payment_timeout, self.payment.charge(request)).await {
            Ok(Ok(receipt)) => {
                tracing::info!(%record_id, payment_id = %receipt.payment_id, "payment succeeded");
                Ok(receipt)
            }
            Ok(Err(e)) => {
                tracing::warn!(%record_id, error = %e, "payment failed");
                Err(e)
            }
            Err(_) => {
                tracing::warn!(%record_id, timeout = ?self.payment_timeout, "payment timed out");
                Err(PaymentError::TimedOut(self.payment_timeout))
            }
        }
    }

    /// Runs the single compensating action after a failed charge.
    #[tracing::instrument(skip(self, run, undo))]
    async fn compensate<T, F>(
        &self,
        run: &mut SagaRun,
        record_id: RecordId,
        payment: PaymentError,
        undo: F,
    ) -> Result<T, SagaError>
    where
        F: Future<Output = Result<(), StoreError>>,
    {
        run.advance(SagaState::Compensating)?;
        let undone = undo.await;
        run.advance(SagaState::Failed)?;

        match undone {
            Ok(()) => {
                tracing::info!(%record_id, "compensation completed");
                Err(SagaError::Payment {
                    record_id,
                    source: payment,
                })
            }
            Err(storage) => {
                metrics::counter!("enrollment_compensation_failed").increment(1);
                tracing::error!(
                    orphaned_record = %record_id,
                    payment_error = %payment,
                    storage_error = %storage,
                    "compensation failed; record persists without a successful payment"
                );
                Err(SagaError::CompensationFailed {
                    record_id,
                    payment,
                    storage,
                })
            }
        }
    }

    fn record_finish(
        &self,
        saga: &'static str,
        started: Instant,
        run: &SagaRun,
        error: Option<&SagaError>,
    ) {
        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("enrollment_saga_duration_seconds", "saga" => saga).record(duration);

        match error {
            None => {
                metrics::counter!("enrollment_saga_completed", "saga" => saga).increment(1);
                tracing::info!(path = %run, duration, "saga completed successfully");
            }
            Some(e) => {
                metrics::counter!("enrollment_saga_failed", "saga" => saga, "reason" => e.kind())
                    .increment(1);
                tracing::warn!(path = %run, duration, reason = e.kind(), error = %e, "saga failed");
            }
        }
    }
}

impl<S, P> EnrollmentSaga<S, P>
where
    S: EnrollmentStore + 'static,
    P: PaymentProcessor + 'static,
{
    /// Runs [`enroll`](Self::enroll) on its own task.
    ///
    /// Dropping the returned future does not stop the saga: a record that
    /// was written is either charged or compensated.
    pub async fn enroll_detached(
        self: Arc<Self>,
        raw: RawSubmission,
    ) -> Result<EnrollmentOutcome, SagaError> {
        tokio::spawn(async move { self.enroll(&raw).await }).await?
    }

    /// Runs [`renew`](Self::renew) on its own task, with the same drop
    /// behavior as [`enroll_detached`](Self::enroll_detached).
    pub async fn renew_detached(self: Arc<Self>, id: RecordId) -> Result<RenewalOutcome, SagaError> {
        tokio::spawn(async move { self.renew(id).await }).await?
    }
}
