use thiserror::Error;

use crate::wire::WireError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("pool worker {worker} panicked: {reason}")]
    WorkerPanicked { worker: usize, reason: String },
    #[error("result slot {0} written twice")]
    SlotTaken(usize),
    #[error("result slot {index} out of range (len {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("slot failed: {0}")]
    Slot(#[from] SlotError),
    #[error("wire: {0}")]
    Wire(#[from] WireError),
}

/// Why a result slot holds no value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlotError {
    /// The instance terminated abnormally before producing a result.
    #[error("instance {index} crashed: {reason}")]
    Crashed { index: usize, reason: String },
    /// A result arrived but could not be reconstructed.
    #[error("instance {index} returned an unreadable result: {reason}")]
    Corrupt { index: usize, reason: String },
    /// Never dispatched because the run was cancelled.
    #[error("item {index} skipped after cancellation")]
    Skipped { index: usize },
    /// Dispatched but never reaped.
    #[error("instance {index} was never reaped")]
    Lost { index: usize },
}

impl SlotError {
    pub fn index(&self) -> usize {
        match self {
            SlotError::Crashed { index, .. }
            | SlotError::Corrupt { index, .. }
            | SlotError::Skipped { index }
            | SlotError::Lost { index } => *index,
        }
    }
}
