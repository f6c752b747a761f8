//! Connection wrapper with pool bookkeeping

use std::fmt;
use std::time::{Duration, Instant};

use tracing::debug;
use uuid::Uuid;

use corral_core::{Result, Transport};

/// One live transport to the server plus pool-management metadata.
///
/// A connection is owned by exactly one place at a time: the caller that
/// checked it out, or the pool's idle cache while checked in.
pub struct Connection {
    id: Uuid,
    transport: Box<dyn Transport>,
    generation: u64,
    created_at: Instant,
    last_returned: Instant,
    closed: bool,
}

impl Connection {
    pub(crate) fn new(transport: Box<dyn Transport>, generation: u64) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            transport,
            generation,
            created_at: now,
            last_returned: now,
            closed: false,
        }
    }

    /// Unique id of this connection.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Pool generation this connection was created under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Time since the connection was established.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the connection was last returned to the pool.
    pub fn idle_time(&self) -> Duration {
        self.last_returned.elapsed()
    }

    /// Write an entire buffer to the server.
    pub async fn send(&mut self, buf: &[u8]) -> Result<()> {
        self.transport.send(buf).await
    }

    /// Read up to `buf.len()` bytes from the server, returning the count.
    pub async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.transport.recv(buf).await
    }

    /// Whether the transport has been terminated locally or closed by the peer.
    pub fn is_closed(&self) -> bool {
        self.closed || self.transport.is_closed()
    }

    /// Whether `close_quietly` already ran. Cheaper than `is_closed`, which
    /// probes the transport.
    pub(crate) fn is_marked_closed(&self) -> bool {
        self.closed
    }

    pub(crate) fn mark_returned(&mut self) {
        self.last_returned = Instant::now();
    }

    /// Terminate the transport. Close errors carry no information a caller
    /// could act on, so they are logged and swallowed.
    pub(crate) fn close_quietly(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(error) = self.transport.close() {
            debug!(id = %self.id, %error, "error closing discarded connection");
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
