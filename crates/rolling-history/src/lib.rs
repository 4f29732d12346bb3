//! Rolling History
//!
//! Fixed-capacity FIFO window of sample values. The window is always
//! full: it starts out holding `capacity` default values and every push
//! evicts the oldest entry.

mod history;

pub use history::{HistoryError, RollingHistory};

/// Default window length (samples visible on the plot)
pub const DEFAULT_LENGTH: usize = 100;
