//! Single-slot mailbox between the reader thread and its consumer
//!
//! Built on a `watch` channel: every publish replaces the previous
//! snapshot, consumers only ever see the latest one. Records are
//! immutable once published, so a consumer never observes a record
//! that is half overwritten.

use crate::error::LinkError;
use std::sync::Arc;
use tokio::sync::watch;

/// Reader lifecycle as seen by the consumer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Port open, no record received yet
    Connecting,
    /// At least one record has landed
    Receiving,
    /// Reader exited after a stop request
    Stopped,
    /// Reader exited because the device failed
    Disconnected(String),
}

impl LinkState {
    /// Whether the reader thread has exited
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkState::Stopped | LinkState::Disconnected(_))
    }
}

/// One complete record as read from the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    bytes: Arc<[u8]>,
    sequence: u64,
}

impl Record {
    /// Wrap raw bytes read from the wire
    pub fn new(bytes: impl Into<Arc<[u8]>>, sequence: u64) -> Self {
        Self {
            bytes: bytes.into(),
            sequence,
        }
    }

    /// Raw record bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Count of records read before and including this one (starts at 1)
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Latest state published by the reader
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    state: LinkState,
    record: Option<Record>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            state: LinkState::Connecting,
            record: None,
        }
    }
}

/// Create a connected writer/mailbox pair
pub(crate) fn channel() -> (MailboxWriter, Mailbox) {
    let (tx, rx) = watch::channel(Snapshot::default());
    (MailboxWriter { tx, sequence: 0 }, Mailbox { rx })
}

/// Writing half, owned by the reader thread
pub(crate) struct MailboxWriter {
    tx: watch::Sender<Snapshot>,
    sequence: u64,
}

impl MailboxWriter {
    /// Replace the current record with a copy of `bytes`
    pub(crate) fn publish(&mut self, bytes: &[u8]) {
        self.sequence += 1;
        let record = Record::new(bytes, self.sequence);
        self.tx.send_modify(|snapshot| {
            snapshot.record = Some(record);
            snapshot.state = LinkState::Receiving;
        });
    }

    pub(crate) fn set_state(&self, state: LinkState) {
        self.tx.send_modify(|snapshot| snapshot.state = state);
    }
}

/// Reading half; cheap to clone, never blocks on `record` or `state`
#[derive(Debug, Clone)]
pub struct Mailbox {
    pub(crate) rx: watch::Receiver<Snapshot>,
}

impl Mailbox {
    /// Most recent record, if any has arrived
    pub fn record(&self) -> Option<Record> {
        self.rx.borrow().record.clone()
    }

    /// Current link state
    pub fn state(&self) -> LinkState {
        self.rx.borrow().state.clone()
    }

    /// Wait until the first record lands.
    ///
    /// Resolves with an error if the reader exits first. Callers bound
    /// the wait with their own timeout.
    pub async fn wait_until_receiving(&mut self) -> Result<(), LinkError> {
        let state = self
            .rx
            .wait_for(|snapshot| snapshot.state != LinkState::Connecting)
            .await
            .map_err(|_| LinkError::Stopped)?
            .state
            .clone();

        match state {
            LinkState::Receiving => Ok(()),
            LinkState::Disconnected(reason) => Err(LinkError::Disconnected(reason)),
            LinkState::Connecting | LinkState::Stopped => Err(LinkError::Stopped),
        }
    }

    /// Wait until a record with at least the given sequence number is published
    pub async fn wait_for_sequence(&mut self, sequence: u64) -> Result<Record, LinkError> {
        let snapshot = self
            .rx
            .wait_for(|snapshot| {
                snapshot.state.is_terminal()
                    || snapshot
                        .record
                        .as_ref()
                        .is_some_and(|record| record.sequence >= sequence)
            })
            .await
            .map_err(|_| LinkError::Stopped)?
            .clone();

        match snapshot.record {
            Some(record) if record.sequence >= sequence => Ok(record),
            _ => match snapshot.state {
                LinkState::Disconnected(reason) => Err(LinkError::Disconnected(reason)),
                _ => Err(LinkError::Stopped),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_connecting_without_record() {
        let (_writer, mailbox) = channel();
        assert_eq!(mailbox.state(), LinkState::Connecting);
        assert!(mailbox.record().is_none());
    }

    #[test]
    fn test_latest_record_wins() {
        let (mut writer, mailbox) = channel();
        writer.publish(&[0x01, 0x00]);
        writer.publish(&[0x02, 0x00]);
        writer.publish(&[0x2C, 0x01]);

        let record = mailbox.record().unwrap();
        assert_eq!(record.bytes(), &[0x2C, 0x01]);
        assert_eq!(record.sequence(), 3);
        assert_eq!(mailbox.state(), LinkState::Receiving);
    }

    #[test]
    fn test_published_record_is_a_snapshot() {
        let (mut writer, mailbox) = channel();
        let mut staging = vec![0xAA, 0xBB];
        writer.publish(&staging);
        let held = mailbox.record().unwrap();

        staging.copy_from_slice(&[0x11, 0x22]);
        writer.publish(&staging);

        assert_eq!(held.bytes(), &[0xAA, 0xBB]);
        assert_eq!(mailbox.record().unwrap().bytes(), &[0x11, 0x22]);
    }

    #[tokio::test]
    async fn test_wait_until_receiving_resolves_on_first_record() {
        let (mut writer, mut mailbox) = channel();
        writer.publish(&[0x00, 0x01]);
        assert!(mailbox.wait_until_receiving().await.is_ok());
    }

    #[tokio::test]
    async fn test_wait_until_receiving_reports_disconnect() {
        let (writer, mut mailbox) = channel();
        writer.set_state(LinkState::Disconnected("unplugged".to_string()));
        let err = mailbox.wait_until_receiving().await.unwrap_err();
        assert!(matches!(err, LinkError::Disconnected(reason) if reason == "unplugged"));
    }

    #[tokio::test]
    async fn test_wait_fails_when_writer_dropped() {
        let (writer, mut mailbox) = channel();
        drop(writer);
        assert!(matches!(
            mailbox.wait_until_receiving().await,
            Err(LinkError::Stopped)
        ));
    }
}
