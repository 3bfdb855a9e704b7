//! Integration tests for the enrollment saga.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use domain::{Batch, FixedClock, PhoneNumber, RawSubmission};
use enrollment_store::{EnrollmentStore, InMemoryEnrollmentStore};
use saga::{
    EnrollmentSaga, InMemoryPaymentProcessor, PaymentBehavior, PaymentError, SagaError,
    SagaState,
};

type TestSaga = EnrollmentSaga<InMemoryEnrollmentStore, InMemoryPaymentProcessor>;

struct TestHarness {
    saga: TestSaga,
    store: InMemoryEnrollmentStore,
    payment: InMemoryPaymentProcessor,
}

impl TestHarness {
    fn new() -> Self {
        let store = InMemoryEnrollmentStore::new();
        let payment = InMemoryPaymentProcessor::new();

        let saga = EnrollmentSaga::new(store.clone(), payment.clone())
            .with_clock(FixedClock(today()))
            .with_payment_timeout(Duration::from_millis(50));

        Self {
            saga,
            store,
            payment,
        }
    }

    async fn records_with_phone(&self, phone: &str) -> usize {
        let phone = PhoneNumber::parse(phone).unwrap();
        usize::from(self.store.find_by_phone(&phone).await.unwrap().is_some())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 21).unwrap()
}

fn asha() -> RawSubmission {
    RawSubmission::new("Asha", 30, "6-7AM", "9876543210")
}

#[tokio::test]
async fn test_concrete_scenario_asha() {
    let h = TestHarness::new();

    let outcome = h.saga.enroll(&asha()).await.unwrap();

    let record = h.store.get(outcome.record.id()).await.unwrap().unwrap();
    assert_eq!(record.name().as_str(), "Asha");
    assert_eq!(record.age().years(), 30);
    assert_eq!(record.selected_batch(), Batch::SixToSevenAm);
    assert_eq!(record.phone_number().as_str(), "9876543210");
    assert_eq!(record.enrollment_dates(), &[today()]);
    assert_eq!(outcome.run.state(), SagaState::Done);
}

#[tokio::test]
async fn test_charging_always_succeeds_creates_exactly_one_record() {
    let h = TestHarness::new();

    h.saga.enroll(&asha()).await.unwrap();

    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(h.records_with_phone("9876543210").await, 1);
    assert_eq!(h.payment.payment_count(), 1);
}

#[tokio::test]
async fn test_charging_always_fails_leaves_no_record() {
    let h = TestHarness::new();
    h.payment.set_behavior(PaymentBehavior::Decline);

    let result = h.saga.enroll(&asha()).await;

    assert!(matches!(result, Err(SagaError::Payment { .. })));
    assert_eq!(h.records_with_phone("9876543210").await, 0);
    assert_eq!(h.store.count().await.unwrap(), 0);
    // The charge was attempted exactly once, against the deleted record.
    assert_eq!(h.payment.attempts().len(), 1);
}

#[tokio::test]
async fn test_failed_charge_frees_phone_for_retry() {
    let h = TestHarness::new();
    h.payment.set_behavior(PaymentBehavior::Decline);
    assert!(h.saga.enroll(&asha()).await.is_err());

    h.payment.set_behavior(PaymentBehavior::Approve);
    h.saga.enroll(&asha()).await.unwrap();

    assert_eq!(h.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_timeout_triggers_compensation() {
    let h = TestHarness::new();
    h.payment.set_behavior(PaymentBehavior::Hang);

    let result = h.saga.enroll(&asha()).await;

    assert!(matches!(
        result,
        Err(SagaError::Payment {
            source: PaymentError::TimedOut(_),
            ..
        })
    ));
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_same_payload_twice_yields_one_record_and_one_conflict() {
    let h = TestHarness::new();

    let first = h.saga.enroll(&asha()).await;
    let second = h.saga.enroll(&asha()).await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(SagaError::Conflict { .. })));
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(h.payment.attempts().len(), 1);
}

#[tokio::test]
async fn test_concurrent_enrollments_with_same_phone() {
    let h = TestHarness::new();
    let saga = Arc::new(h.saga);

    let mut handles = Vec::new();
    for i in 0..10 {
        let saga = saga.clone();
        handles.push(tokio::spawn(async move {
            let raw = RawSubmission::new(format!("Person {i}"), 25 + i, "8-9AM", "9123456780");
            saga.enroll(&raw).await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(SagaError::Conflict { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 9);
    assert_eq!(h.store.count().await.unwrap(), 1);
    assert_eq!(h.payment.payment_count(), 1);
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected_before_storage() {
    let h = TestHarness::new();
    let invalid = [
        RawSubmission::new("Asha", 17, "6-7AM", "9876543210"),
        RawSubmission::new("Asha", 66, "6-7AM", "9876543210"),
        RawSubmission::new("Asha", 30, "noon", "9876543210"),
        RawSubmission::new("Asha", 30, "6-7AM", "987654321"),
        RawSubmission::new("   ", 30, "6-7AM", "9876543210"),
        RawSubmission::default(),
    ];

    for raw in &invalid {
        let result = h.saga.enroll(raw).await;
        assert!(matches!(result, Err(SagaError::Validation(_))), "{raw:?}");
    }

    assert_eq!(h.store.count().await.unwrap(), 0);
    assert!(h.payment.attempts().is_empty());
}

#[tokio::test]
async fn test_one_saga_fails_other_succeeds() {
    let h = TestHarness::new();

    h.saga.enroll(&asha()).await.unwrap();

    h.payment.set_behavior(PaymentBehavior::Decline);
    let ravi = RawSubmission::new("Ravi", 45, "5-6PM", "9000000001");
    assert!(h.saga.enroll(&ravi).await.is_err());

    assert_eq!(h.records_with_phone("9876543210").await, 1);
    assert_eq!(h.records_with_phone("9000000001").await, 0);
    assert_eq!(h.payment.payment_count(), 1);
}

#[tokio::test]
async fn test_monthly_renewal_cycle() {
    let h = TestHarness::new();
    let id = h.saga.enroll(&asha()).await.unwrap().record.id();

    // Same month: rejected without a charge.
    assert!(matches!(
        h.saga.renew(id).await,
        Err(SagaError::AlreadyEnrolled { .. })
    ));
    assert_eq!(h.payment.attempts().len(), 1);

    // Next month: appended and charged.
    let july = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let saga = EnrollmentSaga::new(h.store.clone(), h.payment.clone())
        .with_clock(FixedClock(july));
    let outcome = saga.renew(id).await.unwrap();
    assert_eq!(outcome.record.enrollment_dates(), &[today(), july]);
    assert_eq!(h.payment.payment_count(), 2);

    // Renewal with a failed charge leaves the dates untouched.
    let august = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    h.payment.set_behavior(PaymentBehavior::Decline);
    let saga = EnrollmentSaga::new(h.store.clone(), h.payment.clone())
        .with_clock(FixedClock(august));
    assert!(saga.renew(id).await.is_err());

    let record = h.store.get(id).await.unwrap().unwrap();
    assert_eq!(record.enrollment_dates(), &[today(), july]);
}
