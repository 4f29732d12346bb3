//! In-memory port for driving the reader without hardware
//!
//! Bytes sent through a [`PortFeed`] arrive at the port in the same
//! chunks, so tests can split records across reads. Dropping the feed
//! makes the device go silent; [`PortFeed::unplug`] makes every later
//! read fail like a removed USB adapter and [`PortFeed::hang_up`] makes
//! every later read return zero bytes.

use crate::port::RecordPort;
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

/// How long a read waits for bytes before timing out
const READ_POLL: Duration = Duration::from_millis(5);

/// Mock serial port fed from a channel
pub struct ChannelPort {
    rx: mpsc::Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    unplugged: Arc<AtomicBool>,
    hung_up: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

/// Test-side handle that feeds bytes into a [`ChannelPort`]
#[derive(Clone)]
pub struct PortFeed {
    tx: mpsc::Sender<Vec<u8>>,
    unplugged: Arc<AtomicBool>,
    hung_up: Arc<AtomicBool>,
    reads: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl ChannelPort {
    /// Create a port with an empty input buffer
    pub fn pair() -> (Self, PortFeed) {
        Self::with_stale_input(Vec::new())
    }

    /// Create a port whose driver buffer already holds `stale` bytes
    pub fn with_stale_input(stale: Vec<u8>) -> (Self, PortFeed) {
        let (tx, rx) = mpsc::channel();
        let unplugged = Arc::new(AtomicBool::new(false));
        let hung_up = Arc::new(AtomicBool::new(false));
        let reads = Arc::new(AtomicUsize::new(0));
        let closes = Arc::new(AtomicUsize::new(0));

        let port = Self {
            rx,
            pending: stale.into(),
            unplugged: unplugged.clone(),
            hung_up: hung_up.clone(),
            reads: reads.clone(),
            closes: closes.clone(),
        };
        let feed = PortFeed {
            tx,
            unplugged,
            hung_up,
            reads,
            closes,
        };
        (port, feed)
    }
}

impl Read for ChannelPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unplugged.load(Ordering::SeqCst) {
            return Err(io::Error::new(ErrorKind::BrokenPipe, "device unplugged"));
        }
        if self.hung_up.load(Ordering::SeqCst) {
            return Ok(0);
        }

        if self.pending.is_empty() {
            match self.rx.recv_timeout(READ_POLL) {
                Ok(bytes) => self.pending.extend(bytes),
                Err(_) => return Err(io::Error::new(ErrorKind::TimedOut, "read timed out")),
            }
        }

        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl RecordPort for ChannelPort {
    fn clear_input(&mut self) -> io::Result<()> {
        self.pending.clear();
        Ok(())
    }
}

impl Drop for ChannelPort {
    fn drop(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl PortFeed {
    /// Deliver one chunk of bytes to the port
    pub fn send(&self, bytes: Vec<u8>) {
        // The port may already be gone; bytes are then lost like on a real wire.
        let _ = self.tx.send(bytes);
    }

    /// Make every subsequent read fail
    pub fn unplug(&self) {
        self.unplugged.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent read return zero bytes
    pub fn hang_up(&self) {
        self.hung_up.store(true, Ordering::SeqCst);
    }

    /// Number of reads the port has served
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// How many times the port has been closed
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}
