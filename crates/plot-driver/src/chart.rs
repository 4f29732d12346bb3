//! Chart configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fraction of the Y range added above and below the plot
const Y_MARGIN: f64 = 0.1;

/// Static chart appearance and render cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Window and chart title
    pub title: String,
    /// X axis label
    pub x_label: String,
    /// Y axis label
    pub y_label: String,
    /// Legend label of the line, also used in the value overlay
    pub line_label: String,
    /// Lower end of the expected value range
    pub y_min: f64,
    /// Upper end of the expected value range
    pub y_max: f64,
    /// Time between render ticks (milliseconds)
    pub render_interval_ms: u64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: "Arduino Analog Read".to_string(),
            x_label: "time".to_string(),
            y_label: "AnalogRead Value".to_string(),
            line_label: "Serial Value".to_string(),
            y_min: 0.0,
            y_max: 1000.0,
            render_interval_ms: 50,
        }
    }
}

impl ChartConfig {
    /// Render tick period
    pub fn render_interval(&self) -> Duration {
        Duration::from_millis(self.render_interval_ms.max(1))
    }

    /// Visible Y range: the value range padded by 10% on both sides
    pub fn y_bounds(&self) -> (f64, f64) {
        let margin = (self.y_max - self.y_min) * Y_MARGIN;
        (self.y_min - margin, self.y_max + margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_y_bounds_have_margin() {
        let chart = ChartConfig::default();
        assert_eq!(chart.y_bounds(), (-100.0, 1100.0));
    }

    #[test]
    fn test_render_interval_never_zero() {
        let chart = ChartConfig {
            render_interval_ms: 0,
            ..Default::default()
        };
        assert_eq!(chart.render_interval(), Duration::from_millis(1));
    }
}
