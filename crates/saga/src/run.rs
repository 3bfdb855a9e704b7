//! Tracks the states one saga execution passes through.

use std::fmt;

use crate::error::SagaError;
use crate::state::SagaState;

/// A single saga execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaRun {
    path: Vec<SagaState>,
}

impl SagaRun {
    /// Starts a run in `Validating`.
    pub fn new() -> Self {
        Self {
            path: vec![SagaState::Validating],
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> SagaState {
        // `path` starts non-empty and only grows.
        self.path.last().copied().unwrap_or_default()
    }

    /// Returns every state visited, in order.
    pub fn path(&self) -> &[SagaState] {
        &self.path
    }

    /// Moves to `next`, rejecting transitions the state machine forbids.
    pub fn advance(&mut self, next: SagaState) -> Result<(), SagaError> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(SagaError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        tracing::debug!(from = %current, to = %next, "saga transition");
        self.path.push(next);
        Ok(())
    }
}

impl Default for SagaRun {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SagaRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, state) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{state}")?;
        }
        Ok(())
    }
}
