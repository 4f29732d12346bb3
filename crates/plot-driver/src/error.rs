//! Plot Driver Error Types

use rolling_history::HistoryError;
use thiserror::Error;

/// Errors building or running the plot driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlotError {
    /// Sample width not representable as an unsigned integer
    #[error("Unsupported sample width {0} bytes (expected 1, 2, 4 or 8)")]
    UnsupportedWidth(usize),

    /// Record size on the wire does not match the sample width
    #[error("Record size {record_size} does not match sample width {width}")]
    WidthMismatch { record_size: usize, width: usize },

    /// Record handed to the decoder has the wrong length
    #[error("Expected {expected} bytes to decode, got {actual}")]
    ShortRecord { expected: usize, actual: usize },

    /// Value does not fit the configured width
    #[error("Value {value} does not fit in {width} bytes")]
    Overflow { value: u64, width: usize },

    /// Plot length rejected
    #[error("Invalid plot length: {0}")]
    History(#[from] HistoryError),
}
