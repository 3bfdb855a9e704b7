//! Saga state machine.

use serde::{Deserialize, Serialize};

/// The state of an enrollment saga.
///
/// State transitions:
/// ```text
/// Validating ──► Creating ──► Charging ──┬──► Done
///      │             │                   └──► Compensating ──► Failed
///      └─────────────┴──────────────────────────────────────► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaState {
    /// Input is being checked; nothing has been written.
    #[default]
    Validating,

    /// The record (or enrollment date) is being written.
    Creating,

    /// The payment processor is being called.
    Charging,

    /// The charge failed and the write is being undone.
    Compensating,

    /// The charge succeeded (terminal state).
    Done,

    /// The saga ended without a successful charge (terminal state).
    Failed,
}

impl SagaState {
    /// Returns true if the saga may move from this state to `next`.
    pub fn can_transition_to(&self, next: SagaState) -> bool {
        use SagaState::*;
        matches!(
            (self, next),
            (Validating, Creating)
                | (Validating, Failed)
                | (Creating, Charging)
                | (Creating, Failed)
                | (Charging, Done)
                | (Charging, Compensating)
                | (Compensating, Failed)
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaState::Done | SagaState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaState::Validating => "Validating",
            SagaState::Creating => "Creating",
            SagaState::Charging => "Charging",
            SagaState::Compensating => "Compensating",
            SagaState::Done => "Done",
            SagaState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for SagaState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
