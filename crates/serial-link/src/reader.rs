//! Background serial reader
//!
//! `SerialLink` is an open connection that is not yet streaming.
//! `SerialLink::start` moves the port onto a dedicated thread which
//! waits out the warm-up interval, flushes stale input and then reads
//! records back to back until stopped or the device fails.

use crate::config::ConnectionConfig;
use crate::error::LinkError;
use crate::mailbox::{self, LinkState, Mailbox, MailboxWriter};
use crate::port::{open_port, RecordPort};
use serialport::SerialPort;
use std::io::{self, ErrorKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Granularity of stop checks while warming up
const WARM_UP_POLL: Duration = Duration::from_millis(20);

/// Pause after a read that returned no bytes and no error
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(10);

/// An open serial connection, ready to start streaming
pub struct SerialLink<P> {
    config: ConnectionConfig,
    port: P,
}

impl SerialLink<Box<dyn SerialPort>> {
    /// Open the configured serial port
    pub fn open(config: ConnectionConfig) -> Result<Self, LinkError> {
        config.validate()?;
        let port = open_port(&config)?;
        Ok(Self { config, port })
    }
}

impl<P: RecordPort + 'static> SerialLink<P> {
    /// Wrap an already open port
    pub fn with_port(config: ConnectionConfig, port: P) -> Result<Self, LinkError> {
        config.validate()?;
        Ok(Self { config, port })
    }

    /// Connection parameters
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Move the port onto the reader thread and start streaming
    pub fn start(self) -> Result<SerialReader, LinkError> {
        let (writer, mailbox) = mailbox::channel();
        let stop = Arc::new(AtomicBool::new(false));

        let worker = Worker {
            port: self.port,
            record_size: self.config.record_size,
            warm_up: self.config.warm_up(),
            stop: stop.clone(),
            writer,
        };

        let handle = thread::Builder::new()
            .name("serial-reader".to_string())
            .spawn(move || worker.run())?;

        info!(
            "Serial reader started on {} ({} byte records)",
            self.config.port, self.config.record_size
        );

        Ok(SerialReader {
            config: self.config,
            mailbox,
            stop,
            handle: Some(handle),
        })
    }
}

/// Handle to a running reader thread
pub struct SerialReader {
    config: ConnectionConfig,
    mailbox: Mailbox,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SerialReader {
    /// Consumer side of the single-slot mailbox
    pub fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    /// Connection parameters
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Whether the reader thread is still running
    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Signal the reader to stop and wait for it to exit.
    ///
    /// An in-flight read is not interrupted, so this returns within one
    /// read timeout. The port is closed when the thread exits. Calling
    /// this again is a no-op.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        debug!("Stopping serial reader on {}", self.config.port);
        self.stop.store(true, Ordering::SeqCst);

        if handle.join().is_err() {
            error!("Serial reader thread panicked");
        }
        info!("Disconnected from {}", self.config.port);
    }
}

impl Drop for SerialReader {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State moved onto the reader thread
struct Worker<P> {
    port: P,
    record_size: usize,
    warm_up: Duration,
    stop: Arc<AtomicBool>,
    writer: MailboxWriter,
}

impl<P: RecordPort> Worker<P> {
    fn run(mut self) {
        if !self.wait_warm_up() {
            self.writer.set_state(LinkState::Stopped);
            return;
        }

        if let Err(e) = self.port.clear_input() {
            warn!("Failed to flush serial input buffer: {}", e);
        }

        let mut staging = vec![0u8; self.record_size];
        let outcome = loop {
            if self.stopping() {
                break LinkState::Stopped;
            }

            match self.fill(&mut staging) {
                Ok(true) => {
                    self.writer.publish(&staging);
                }
                Ok(false) => {}
                Err(e) => {
                    error!("Serial read failed, reader exiting: {}", e);
                    break LinkState::Disconnected(e.to_string());
                }
            }
        };

        debug!("Serial reader exiting: {:?}", outcome);
        self.writer.set_state(outcome);
    }

    /// Sleep through the warm-up interval. Returns false if stopped meanwhile.
    fn wait_warm_up(&self) -> bool {
        let deadline = Instant::now() + self.warm_up;
        loop {
            if self.stopping() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(WARM_UP_POLL.min(deadline - now));
        }
    }

    /// Read until `buf` holds exactly one record.
    ///
    /// Timeouts and empty reads keep the partial progress and retry.
    /// Returns `Ok(false)` if a stop was requested before the record
    /// completed.
    fn fill(&mut self, buf: &mut [u8]) -> io::Result<bool> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.port.read(&mut buf[filled..]) {
                // Some drivers report EOF instead of blocking for the timeout.
                Ok(0) => thread::sleep(EMPTY_READ_BACKOFF),
                Ok(n) => filled += n,
                Err(e) if is_transient(&e) => {}
                Err(e) => return Err(e),
            }

            if filled < buf.len() && self.stopping() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Errors that just mean "no bytes yet"
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ChannelPort;
    use proptest::prelude::*;

    fn test_config(record_size: usize) -> ConnectionConfig {
        ConnectionConfig {
            port: "mock".to_string(),
            baud_rate: 57600,
            record_size,
            read_timeout_ms: 10,
            warm_up_ms: 0,
        }
    }

    fn wait_for_state(mailbox: &Mailbox, want: impl Fn(&LinkState) -> bool) -> LinkState {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let state = mailbox.state();
            if want(&state) || Instant::now() > deadline {
                return state;
            }
            thread::sleep(Duration::from_millis(2));
        }
    }

    #[tokio::test]
    async fn test_mailbox_tracks_each_record() {
        let (port, feed) = ChannelPort::pair();
        let mut reader = SerialLink::with_port(test_config(2), port)
            .unwrap()
            .start()
            .unwrap();
        let mut mailbox = reader.mailbox();

        for (i, record) in [[0x2C, 0x01], [0xFF, 0xFF], [0x00, 0x00]].iter().enumerate() {
            feed.send(record.to_vec());
            let latest = mailbox.wait_for_sequence(i as u64 + 1).await.unwrap();
            assert_eq!(latest.bytes(), record);
        }

        reader.stop();
        assert_eq!(mailbox.state(), LinkState::Stopped);
    }

    #[tokio::test]
    async fn test_partial_reads_assemble_one_record() {
        let (port, feed) = ChannelPort::pair();
        let mut reader = SerialLink::with_port(test_config(4), port)
            .unwrap()
            .start()
            .unwrap();
        let mut mailbox = reader.mailbox();

        feed.send(vec![0xDE]);
        feed.send(vec![0xAD, 0xBE]);
        feed.send(vec![0xEF]);

        let record = mailbox.wait_for_sequence(1).await.unwrap();
        assert_eq!(record.bytes(), &[0xDE, 0xAD, 0xBE, 0xEF]);
        reader.stop();
    }

    #[tokio::test]
    async fn test_stale_input_is_flushed() {
        let (port, feed) = ChannelPort::with_stale_input(vec![0x99, 0x99, 0x99]);
        let mut reader = SerialLink::with_port(test_config(2), port)
            .unwrap()
            .start()
            .unwrap();
        let mut mailbox = reader.mailbox();

        feed.send(vec![0x2C, 0x01]);
        let record = mailbox.wait_for_sequence(1).await.unwrap();
        assert_eq!(record.bytes(), &[0x2C, 0x01]);
        reader.stop();
    }

    #[test]
    fn test_stop_closes_port_exactly_once() {
        let (port, feed) = ChannelPort::pair();
        let mut reader = SerialLink::with_port(test_config(2), port)
            .unwrap()
            .start()
            .unwrap();

        let started = Instant::now();
        reader.stop();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!reader.is_running());
        assert_eq!(feed.close_count(), 1);

        reader.stop();
        drop(reader);
        assert_eq!(feed.close_count(), 1);
    }

    #[test]
    fn test_stop_during_warm_up() {
        let (port, feed) = ChannelPort::pair();
        let config = ConnectionConfig {
            warm_up_ms: 60_000,
            ..test_config(2)
        };
        let mut reader = SerialLink::with_port(config, port).unwrap().start().unwrap();
        let mailbox = reader.mailbox();

        reader.stop();
        assert_eq!(mailbox.state(), LinkState::Stopped);
        assert_eq!(feed.close_count(), 1);
    }

    #[test]
    fn test_device_failure_reports_disconnect() {
        let (port, feed) = ChannelPort::pair();
        let reader = SerialLink::with_port(test_config(2), port)
            .unwrap()
            .start()
            .unwrap();
        let mailbox = reader.mailbox();

        feed.unplug();
        let state = wait_for_state(&mailbox, LinkState::is_terminal);
        assert!(matches!(state, LinkState::Disconnected(_)));
        assert!(mailbox.record().is_none());
    }

    #[test]
    fn test_empty_reads_back_off() {
        let (port, feed) = ChannelPort::pair();
        let mut reader = SerialLink::with_port(test_config(2), port)
            .unwrap()
            .start()
            .unwrap();
        let mailbox = reader.mailbox();

        feed.hang_up();
        thread::sleep(Duration::from_millis(200));
        let reads = feed.read_count();
        assert!(reads < 100, "{} reads in 200ms", reads);
        assert!(reader.is_running());
        assert_eq!(mailbox.state(), LinkState::Connecting);

        reader.stop();
        assert_eq!(mailbox.state(), LinkState::Stopped);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_start() {
        let (port, _feed) = ChannelPort::pair();
        let result = SerialLink::with_port(test_config(0), port);
        assert!(matches!(result, Err(LinkError::InvalidConfig(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_latest_record_matches_last_written(
            record_size in 1usize..9,
            count in 1usize..6,
            seed in any::<u8>(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let (port, feed) = ChannelPort::pair();
            let mut reader = SerialLink::with_port(test_config(record_size), port)
                .unwrap()
                .start()
                .unwrap();
            let mut mailbox = reader.mailbox();

            for i in 0..count {
                let record: Vec<u8> = (0..record_size)
                    .map(|b| seed.wrapping_add((i * record_size + b) as u8))
                    .collect();
                feed.send(record.clone());
                let latest = runtime
                    .block_on(mailbox.wait_for_sequence(i as u64 + 1))
                    .unwrap();
                prop_assert_eq!(latest.bytes(), record.as_slice());
            }

            reader.stop();
        }
    }
}
