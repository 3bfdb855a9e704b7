//! External service traits and implementations for saga steps.

pub mod payment;

pub use payment::{
    ChargeRequest, InMemoryPaymentProcessor, PaymentBehavior, PaymentError, PaymentProcessor,
    PaymentReceipt, SimulatedPaymentProcessor,
};
