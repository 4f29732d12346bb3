//! Serial Link Error Types

use thiserror::Error;

/// Errors that can occur while opening or streaming from a serial device
#[derive(Debug, Error)]
pub enum LinkError {
    /// Port missing, busy or not permitted
    #[error("Failed to connect to {port} at {baud_rate} baud: {reason}")]
    Connection {
        port: String,
        baud_rate: u32,
        reason: String,
    },

    /// Connection parameters rejected before opening
    #[error("Invalid connection config: {0}")]
    InvalidConfig(String),

    /// Device went away while streaming
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// Reader was stopped before delivering a record
    #[error("Serial reader stopped")]
    Stopped,

    /// Serial ports could not be listed
    #[error("Failed to enumerate serial ports: {0}")]
    Enumeration(String),

    /// Reader thread could not be spawned
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}
