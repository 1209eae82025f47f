//! Error types for the access control engine.

use crate::state_machine::LockState;
use smartlock_hardware::HardwareError;
use smartlock_storage::StorageError;

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: LockState, to: LockState },

    #[error("Invalid display line {line} (max {max})")]
    InvalidLine { line: usize, max: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),
}
