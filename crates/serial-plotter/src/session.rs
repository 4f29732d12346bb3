//! Session lifecycle
//!
//! Opens the link, starts the reader and holds the caller until the
//! first record has landed, so rendering never starts on an empty
//! mailbox. The wait is bounded.

use serial_link::{ConnectionConfig, LinkError, Mailbox, RecordPort, SerialLink, SerialReader};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors starting a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Opening or streaming failed
    #[error(transparent)]
    Link(#[from] LinkError),

    /// Device opened but sent nothing in time
    #[error("No data received from {port} within {}ms", .waited.as_millis())]
    ReadyTimeout { port: String, waited: Duration },
}

/// A running acquisition session
pub struct Session {
    reader: SerialReader,
}

impl Session {
    /// Open the configured port and wait for the first record
    pub async fn start(config: &ConnectionConfig, ready_timeout: Duration) -> Result<Self, SessionError> {
        let link = SerialLink::open(config.clone())?;
        Self::start_with(link, ready_timeout).await
    }

    /// Start streaming from an already open link and wait for the first record
    pub async fn start_with<P: RecordPort + 'static>(
        link: SerialLink<P>,
        ready_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let port = link.config().port.clone();
        let mut reader = link.start()?;
        let mut mailbox = reader.mailbox();

        info!("Waiting for first record from {}", port);
        match tokio::time::timeout(ready_timeout, mailbox.wait_until_receiving()).await {
            Ok(Ok(())) => {
                info!("Receiving data from {}", port);
                Ok(Self { reader })
            }
            Ok(Err(e)) => {
                warn!("Reader on {} exited before any data: {}", port, e);
                reader.stop();
                Err(e.into())
            }
            Err(_) => {
                warn!("No data from {} after {:?}, giving up", port, ready_timeout);
                reader.stop();
                Err(SessionError::ReadyTimeout {
                    port,
                    waited: ready_timeout,
                })
            }
        }
    }

    /// Consumer side of the reader's mailbox
    pub fn mailbox(&self) -> Mailbox {
        self.reader.mailbox()
    }

    /// Whether the reader is still streaming
    pub fn is_running(&self) -> bool {
        self.reader.is_running()
    }

    /// Stop the reader and close the port. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.reader.is_running() {
            info!("Shutting down session on {}", self.reader.config().port);
        }
        self.reader.stop();
    }
}
