//! Connection configuration

use crate::error::LinkError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default serial device path
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";
/// Default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 38400;
/// Default record size (one unsigned 16-bit sample)
pub const DEFAULT_RECORD_SIZE: usize = 2;

const DEFAULT_READ_TIMEOUT_MS: u64 = 4000;
const DEFAULT_WARM_UP_MS: u64 = 1000;

/// Serial connection parameters, immutable once a session starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub port: String,
    /// Baud rate for serial communication
    pub baud_rate: u32,
    /// Bytes per record on the wire
    pub record_size: usize,
    /// Read timeout in milliseconds; also bounds shutdown latency
    pub read_timeout_ms: u64,
    /// Delay before flushing stale input and starting to read (milliseconds)
    pub warm_up_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            record_size: DEFAULT_RECORD_SIZE,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            warm_up_ms: DEFAULT_WARM_UP_MS,
        }
    }
}

impl ConnectionConfig {
    /// Create a config for a port with default timing
    pub fn new(port: impl Into<String>, baud_rate: u32, record_size: usize) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            record_size,
            ..Default::default()
        }
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Warm-up interval as a duration
    pub fn warm_up(&self) -> Duration {
        Duration::from_millis(self.warm_up_ms)
    }

    /// Reject parameters that can never produce a working session
    pub fn validate(&self) -> Result<(), LinkError> {
        if self.port.trim().is_empty() {
            return Err(LinkError::InvalidConfig("port name is empty".to_string()));
        }
        if self.baud_rate == 0 {
            return Err(LinkError::InvalidConfig("baud rate must be positive".to_string()));
        }
        if self.record_size == 0 {
            return Err(LinkError::InvalidConfig(
                "record size must be at least one byte".to_string(),
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(LinkError::InvalidConfig(
                "read timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ConnectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.record_size, 2);
        assert_eq!(config.read_timeout(), Duration::from_secs(4));
        assert_eq!(config.warm_up(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_empty_port() {
        let config = ConnectionConfig::new("  ", 9600, 2);
        assert!(matches!(config.validate(), Err(LinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_record_size() {
        let config = ConnectionConfig::new("/dev/ttyACM0", 57600, 0);
        assert!(matches!(config.validate(), Err(LinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_baud() {
        let config = ConnectionConfig::new("/dev/ttyACM0", 0, 2);
        assert!(config.validate().is_err());
    }
}
