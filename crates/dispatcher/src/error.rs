//! Dispatcher error types

use thiserror::Error;

use crate::worker::WorkerState;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Input or configuration rejected before a run existed
    #[error(transparent)]
    Rejected(#[from] contracts::ContractError),

    /// `start` called on a worker that is not idle
    #[error("worker cannot start from state {state:?}; a worker runs exactly once")]
    InvalidState { state: WorkerState },

    /// The run task panicked or was aborted
    #[error("run task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl DispatchError {
    /// Rejected because of malformed input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Rejected(e) if e.is_validation())
    }

    /// Rejected because of settings
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Rejected(e) if e.is_configuration())
    }
}
