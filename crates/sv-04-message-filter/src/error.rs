//! Filter errors. Each halts the partition worker that hit it.

use shared_bus::LogError;
use shared_types::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    /// Reading input, committing or emitting failed.
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    /// A decoded message could not be re-encoded for output.
    #[error("Output encoding failed: {0}")]
    Encode(#[from] CodecError),

    #[error("Partition worker {partition} panicked: {reason}")]
    WorkerPanicked { partition: u32, reason: String },
}
