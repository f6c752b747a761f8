//! Transport traits
//!
//! The pool does not speak the wire protocol itself. It hands out transports
//! created by a [`TransportFactory`] and probes them for liveness through the
//! [`Transport`] trait. Swapping the factory is how tests inject connection
//! failures without touching the pool.

use std::time::Duration;

use async_trait::async_trait;

use crate::{Result, ServerAddress};

/// Timeouts applied while establishing and using a transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectOptions {
    /// Maximum time to wait for transport establishment.
    pub connect_timeout: Option<Duration>,
    /// Per-operation I/O timeout, applied to each send and recv.
    pub socket_timeout: Option<Duration>,
}

/// One live, persistent byte stream to the server.
#[async_trait]
pub trait Transport: Send + std::fmt::Debug + 'static {
    /// Write an entire buffer to the server.
    async fn send(&mut self, buf: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes from the server, returning the count.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Non-blocking liveness probe.
    ///
    /// Must never block or perform I/O that waits; an idle transport that
    /// has been closed by the peer reports true.
    fn is_closed(&self) -> bool;

    /// Terminate the transport.
    ///
    /// Idempotent. Errors are reported so callers can log them, but a
    /// transport is considered closed after this returns regardless.
    fn close(&mut self) -> std::io::Result<()>;
}

/// Factory for establishing new transports.
///
/// Injected into the pool so tests can substitute a failing implementation.
#[async_trait]
pub trait TransportFactory: Send + Sync + 'static {
    /// Establish a new transport to `address` within the configured timeouts.
    async fn connect(
        &self,
        address: &ServerAddress,
        options: ConnectOptions,
    ) -> Result<Box<dyn Transport>>;
}

#[async_trait]
impl<T: TransportFactory> TransportFactory for std::sync::Arc<T> {
    async fn connect(
        &self,
        address: &ServerAddress,
        options: ConnectOptions,
    ) -> Result<Box<dyn Transport>> {
        (**self).connect(address, options).await
    }
}
