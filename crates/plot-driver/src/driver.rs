//! Plot Driver Implementation

use crate::error::PlotError;
use crate::format::SampleFormat;
use rolling_history::RollingHistory;
use serial_link::Record;
use std::ops::Range;
use std::time::Instant;
use tracing::{debug, info};

/// Everything the display needs to draw one tick
#[derive(Debug, Clone, PartialEq)]
pub struct PlotFrame {
    /// Milliseconds since the previous tick; `None` on the first tick
    pub interval_ms: Option<u64>,
    /// Value decoded this tick
    pub value: u64,
    /// Interval overlay, e.g. "Plot Interval = 50ms"
    pub interval_text: String,
    /// Value overlay, e.g. "[Serial Value] = 300"
    pub value_text: String,
    /// (index, value) pairs, oldest first
    pub series: Vec<[f64; 2]>,
    /// Records replaced in the mailbox before any tick saw them
    pub overwritten: u64,
}

/// Decodes the latest record on every tick and keeps the plot window
pub struct PlotDriver {
    format: SampleFormat,
    history: RollingHistory<u64>,
    label: String,
    last_tick: Option<Instant>,
    last_sequence: Option<u64>,
    overwritten: u64,
    ticks: u64,
}

impl PlotDriver {
    /// Create a driver for `plot_length` points.
    ///
    /// Fails if the sample format cannot decode records of `record_size`
    /// bytes, so a mismatch is caught before any data is read.
    pub fn new(
        format: SampleFormat,
        plot_length: usize,
        record_size: usize,
        label: impl Into<String>,
    ) -> Result<Self, PlotError> {
        format.check_record_size(record_size)?;
        let history = RollingHistory::new(plot_length)?;

        info!(
            "Plot driver ready: {} points, {}-byte {:?}-endian samples",
            plot_length, format.width, format.byte_order
        );

        Ok(Self {
            format,
            history,
            label: label.into(),
            last_tick: None,
            last_sequence: None,
            overwritten: 0,
            ticks: 0,
        })
    }

    /// Decode `record`, append it to the window and build the frame to draw.
    ///
    /// The interval measures time between ticks, not between device
    /// samples. A record that has not changed since the last tick is
    /// appended again.
    pub fn on_tick(&mut self, record: &Record, now: Instant) -> Result<PlotFrame, PlotError> {
        let value = self.format.decode(record.bytes())?;

        let interval_ms = self
            .last_tick
            .map(|previous| now.saturating_duration_since(previous).as_millis() as u64);
        self.last_tick = Some(now);

        if let Some(previous) = self.last_sequence {
            let skipped = record.sequence().saturating_sub(previous).saturating_sub(1);
            if skipped > 0 {
                debug!("{} records overwritten between ticks", skipped);
            }
            self.overwritten += skipped;
        }
        self.last_sequence = Some(record.sequence());

        self.history.push(value);
        self.ticks += 1;

        Ok(PlotFrame {
            interval_ms,
            value,
            interval_text: interval_text(interval_ms),
            value_text: format!("[{}] = {}", self.label, value),
            series: self.series(),
            overwritten: self.overwritten,
        })
    }

    /// Current window as plot points, X = index
    pub fn series(&self) -> Vec<[f64; 2]> {
        self.history
            .iter()
            .enumerate()
            .map(|(index, value)| [index as f64, *value as f64])
            .collect()
    }

    /// Fixed X range of the plot
    pub fn x_range(&self) -> Range<usize> {
        0..self.history.capacity()
    }

    /// The rolling window
    pub fn history(&self) -> &RollingHistory<u64> {
        &self.history
    }

    /// Ticks processed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

fn interval_text(interval_ms: Option<u64>) -> String {
    match interval_ms {
        Some(ms) => format!("Plot Interval = {}ms", ms),
        None => "Plot Interval = --ms".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::ByteOrder;
    use std::time::Duration;

    fn driver(plot_length: usize) -> PlotDriver {
        PlotDriver::new(SampleFormat::default(), plot_length, 2, "Serial Value").unwrap()
    }

    fn record(value: u16, sequence: u64) -> Record {
        Record::new(value.to_le_bytes().to_vec(), sequence)
    }

    #[test]
    fn test_window_full_before_first_tick() {
        let driver = driver(200);
        assert_eq!(driver.history().len(), 200);
        assert_eq!(driver.series().len(), 200);
        assert!(driver.series().iter().all(|point| point[1] == 0.0));
        assert_eq!(driver.x_range(), 0..200);
    }

    #[test]
    fn test_decodes_wire_bytes() {
        let mut driver = driver(10);
        let frame = driver
            .on_tick(&Record::new(vec![0x2C, 0x01], 1), Instant::now())
            .unwrap();
        assert_eq!(frame.value, 300);
        assert_eq!(frame.value_text, "[Serial Value] = 300");
        assert_eq!(frame.series.last(), Some(&[9.0, 300.0]));
    }

    #[test]
    fn test_history_keeps_latest_values() {
        let mut driver = driver(3);
        let start = Instant::now();
        for (i, value) in [5u16, 7, 9, 11].into_iter().enumerate() {
            driver
                .on_tick(&record(value, i as u64 + 1), start + Duration::from_millis(i as u64))
                .unwrap();
        }
        assert_eq!(driver.history().to_vec(), vec![7, 9, 11]);
        assert_eq!(driver.ticks(), 4);
    }

    #[test]
    fn test_interval_between_ticks() {
        let mut driver = driver(5);
        let start = Instant::now();

        let first = driver.on_tick(&record(1, 1), start).unwrap();
        assert_eq!(first.interval_ms, None);
        assert_eq!(first.interval_text, "Plot Interval = --ms");

        let second = driver
            .on_tick(&record(2, 2), start + Duration::from_millis(50))
            .unwrap();
        assert_eq!(second.interval_ms, Some(50));
        assert_eq!(second.interval_text, "Plot Interval = 50ms");
    }

    #[test]
    fn test_counts_overwritten_records() {
        let mut driver = driver(5);
        let now = Instant::now();
        driver.on_tick(&record(1, 1), now).unwrap();
        driver.on_tick(&record(2, 4), now).unwrap();
        let frame = driver.on_tick(&record(2, 4), now).unwrap();
        assert_eq!(frame.overwritten, 2);
        assert_eq!(driver.history().to_vec(), vec![0, 0, 1, 2, 2]);
    }

    #[test]
    fn test_width_mismatch_caught_at_construction() {
        let format = SampleFormat::new(4, ByteOrder::Little).unwrap();
        let result = PlotDriver::new(format, 100, 2, "Serial Value");
        assert!(matches!(
            result,
            Err(PlotError::WidthMismatch {
                record_size: 2,
                width: 4
            })
        ));
    }

    #[test]
    fn test_zero_length_rejected() {
        let result = PlotDriver::new(SampleFormat::default(), 0, 2, "Serial Value");
        assert!(matches!(result, Err(PlotError::History(_))));
    }
}
