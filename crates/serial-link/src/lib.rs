//! Serial Link
//!
//! Owns a serial connection on a dedicated background thread, reads
//! fixed-size binary records from it and publishes the most recent one
//! through a single-slot mailbox. Records arriving faster than the
//! consumer polls are overwritten; there is no queue.
//!
//! The wire carries no framing: every record is exactly `record_size`
//! bytes and alignment is assumed from the first byte read after the
//! input buffer flush. A single dropped or extra byte shifts every
//! following record.

mod config;
mod error;
mod mailbox;
mod port;
mod reader;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use config::ConnectionConfig;
pub use error::LinkError;
pub use mailbox::{LinkState, Mailbox, Record};
pub use port::{available_ports, open_port, PortSummary, RecordPort};
pub use reader::{SerialLink, SerialReader};
