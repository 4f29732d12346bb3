//! Plot Driver
//!
//! Turns the latest raw record into a displayed point on every render
//! tick: decode, append to the rolling history, and prepare the series
//! and overlay text for the chart.

mod chart;
mod driver;
mod error;
mod format;

pub use chart::ChartConfig;
pub use driver::{PlotDriver, PlotFrame};
pub use error::PlotError;
pub use format::{ByteOrder, SampleFormat};
