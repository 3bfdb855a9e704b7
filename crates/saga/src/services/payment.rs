//! Payment processor trait and implementations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::RecordId;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

/// A request to charge for one enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub record_id: RecordId,
    /// Amount in whole rupees.
    pub amount: u64,
    pub description: String,
}

/// Result of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// The payment ID assigned by the processor.
    pub payment_id: String,
    pub record_id: RecordId,
    pub amount: u64,
}

/// Reasons a charge did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The processor refused the charge.
    #[error("Payment declined: {0}")]
    Declined(String),

    /// The processor did not answer in time.
    #[error("Payment timed out after {0:?}")]
    TimedOut(Duration),

    /// The processor could not be reached.
    #[error("Payment processor unavailable: {0}")]
    Unavailable(String),
}

/// Capability to charge for an enrollment.
///
/// The result is the authoritative success signal for the saga.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Charges the fee for a record.
    async fn charge(&self, request: ChargeRequest) -> Result<PaymentReceipt, PaymentError>;
}

#[async_trait]
impl<T: PaymentProcessor + ?Sized> PaymentProcessor for Arc<T> {
    async fn charge(&self, request: ChargeRequest) -> Result<PaymentReceipt, PaymentError> {
        (**self).charge(request).await
    }
}

/// Stand-in for a payment gateway that approves a fixed share of charges
/// at random.
#[derive(Debug, Clone)]
pub struct SimulatedPaymentProcessor {
    success_rate: f64,
}

impl SimulatedPaymentProcessor {
    /// Success rate used when none is configured.
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.8;

    /// Creates a processor approving `success_rate` of charges, clamped to
    /// `[0, 1]`.
    pub fn new(success_rate: f64) -> Self {
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self { success_rate }
    }

    pub fn success_rate(&self) -> f64 {
        self.success_rate
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE)
    }
}

#[async_trait]
impl PaymentProcessor for SimulatedPaymentProcessor {
    async fn charge(&self, request: ChargeRequest) -> Result<PaymentReceipt, PaymentError> {
        tracing::info!(
            record_id = %request.record_id,
            amount = request.amount,
            description = %request.description,
            "processing payment"
        );

        let approved = rand::thread_rng().gen_bool(self.success_rate);
        if !approved {
            tracing::info!(record_id = %request.record_id, "payment declined");
            return Err(PaymentError::Declined(
                "simulated gateway declined the charge".to_string(),
            ));
        }

        tracing::info!(record_id = %request.record_id, "payment approved");
        Ok(PaymentReceipt {
            payment_id: format!("PAY-{}", uuid::Uuid::new_v4().simple()),
            record_id: request.record_id,
            amount: request.amount,
        })
    }
}

/// How the in-memory processor answers charges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentBehavior {
    /// Every charge succeeds.
    #[default]
    Approve,
    /// Every charge is declined.
    Decline,
    /// Charges never complete; the caller's timeout decides.
    Hang,
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    behavior: PaymentBehavior,
    attempts: Vec<ChargeRequest>,
    receipts: Vec<PaymentReceipt>,
    next_id: u32,
}

/// Deterministic payment processor for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentProcessor {
    state: Arc<Mutex<InMemoryPaymentState>>,
}

impl InMemoryPaymentProcessor {
    /// Creates a processor that approves every charge.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a processor with the given behavior.
    pub fn with_behavior(behavior: PaymentBehavior) -> Self {
        let processor = Self::default();
        processor.set_behavior(behavior);
        processor
    }

    /// Changes how subsequent charges are answered.
    pub fn set_behavior(&self, behavior: PaymentBehavior) {
        self.lock().behavior = behavior;
    }

    /// Returns every charge request received, including failed ones.
    pub fn attempts(&self) -> Vec<ChargeRequest> {
        self.lock().attempts.clone()
    }

    /// Returns the number of successful charges.
    pub fn payment_count(&self) -> usize {
        self.lock().receipts.len()
    }

    fn lock(&self) -> MutexGuard<'_, InMemoryPaymentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl PaymentProcessor for InMemoryPaymentProcessor {
    async fn charge(&self, request: ChargeRequest) -> Result<PaymentReceipt, PaymentError> {
        let behavior = {
            let mut state = self.lock();
            state.attempts.push(request.clone());
            state.behavior
        };

        match behavior {
            PaymentBehavior::Approve => {
                let mut state = self.lock();
                state.next_id += 1;
                let receipt = PaymentReceipt {
                    payment_id: format!("PAY-{:04}", state.next_id),
                    record_id: request.record_id,
                    amount: request.amount,
                };
                state.receipts.push(receipt.clone());
                Ok(receipt)
            }
            PaymentBehavior::Decline => {
                Err(PaymentError::Declined("Payment declined".to_string()))
            }
            PaymentBehavior::Hang => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChargeRequest {
        ChargeRequest {
            record_id: RecordId::new(),
            amount: 500,
            description: "Yoga Monthly Fee".to_string(),
        }
    }

    #[tokio::test]
    async fn test_approve_records_receipt() {
        let processor = InMemoryPaymentProcessor::new();
        let req = request();

        let receipt = processor.charge(req.clone()).await.unwrap();
        assert_eq!(receipt.payment_id, "PAY-0001");
        assert_eq!(receipt.record_id, req.record_id);
        assert_eq!(receipt.amount, 500);
        assert_eq!(processor.payment_count(), 1);
        assert_eq!(processor.attempts(), vec![req]);
    }

    #[tokio::test]
    async fn test_decline() {
        let processor = InMemoryPaymentProcessor::with_behavior(PaymentBehavior::Decline);

        let result = processor.charge(request()).await;
        assert!(matches!(result, Err(PaymentError::Declined(_))));
        assert_eq!(processor.payment_count(), 0);
        assert_eq!(processor.attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_hang_never_completes() {
        let processor = InMemoryPaymentProcessor::with_behavior(PaymentBehavior::Hang);

        let result =
            tokio::time::timeout(Duration::from_millis(20), processor.charge(request())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_simulated_extremes_are_deterministic() {
        let always = SimulatedPaymentProcessor::new(1.0);
        for _ in 0..20 {
            let receipt = always.charge(request()).await.unwrap();
            assert!(receipt.payment_id.starts_with("PAY-"));
        }

        let never = SimulatedPaymentProcessor::new(0.0);
        for _ in 0..20 {
            assert!(never.charge(request()).await.is_err());
        }
    }

    #[test]
    fn test_simulated_rate_is_clamped() {
        assert_eq!(SimulatedPaymentProcessor::new(1.5).success_rate(), 1.0);
        assert_eq!(SimulatedPaymentProcessor::new(-0.2).success_rate(), 0.0);
        assert_eq!(SimulatedPaymentProcessor::new(f64::NAN).success_rate(), 0.0);
        assert_eq!(SimulatedPaymentProcessor::default().success_rate(), 0.8);
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let processor: Arc<dyn PaymentProcessor> = Arc::new(InMemoryPaymentProcessor::new());
        assert!(processor.charge(request()).await.is_ok());
    }
}
