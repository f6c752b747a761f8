//! Pool configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use corral_core::{ConnectOptions, CorralError, Result};

/// Configuration for a connection pool
///
/// Immutable once a pool has been built from it. Invalid values are
/// rejected by [`PoolOptions::validate`] when the pool is constructed,
/// never during checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolOptions {
    /// Maximum number of concurrently open connections (None = unbounded)
    max_pool_size: Option<u32>,
    /// Timeout in milliseconds when waiting for a connection (None = wait forever)
    wait_queue_timeout_ms: Option<u64>,
    /// Cap on simultaneous waiters, as a multiple of `max_pool_size` (None = unbounded)
    wait_queue_multiple: Option<u32>,
    /// Timeout in milliseconds for establishing a new transport
    connect_timeout_ms: u64,
    /// Per-operation I/O timeout in milliseconds (None = no timeout)
    socket_timeout_ms: Option<u64>,
    /// Minimum idle time in milliseconds before a cached connection is
    /// liveness-checked on checkout
    check_interval_ms: u64,
}

impl PoolOptions {
    /// Create pool options with default values.
    pub fn new() -> Self {
        Self {
            max_pool_size: Some(100),
            wait_queue_timeout_ms: None,
            wait_queue_multiple: None,
            connect_timeout_ms: 20_000,
            socket_timeout_ms: None,
            check_interval_ms: 1_000,
        }
    }

    /// Set the maximum pool size (None = unbounded).
    pub fn with_max_pool_size(mut self, size: Option<u32>) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set the wait-queue timeout in milliseconds (None = wait forever).
    pub fn with_wait_queue_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.wait_queue_timeout_ms = timeout_ms;
        self
    }

    /// Set the waiter cap as a multiple of the pool size (None = unbounded).
    pub fn with_wait_queue_multiple(mut self, multiple: Option<u32>) -> Self {
        self.wait_queue_multiple = multiple;
        self
    }

    /// Set the connect timeout in milliseconds.
    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }

    /// Set the per-operation socket timeout in milliseconds (None = no timeout).
    pub fn with_socket_timeout_ms(mut self, timeout_ms: Option<u64>) -> Self {
        self.socket_timeout_ms = timeout_ms;
        self
    }

    /// Set the idle interval in milliseconds after which cached connections
    /// are liveness-checked before reuse. Zero means check on every checkout.
    pub fn with_check_interval_ms(mut self, interval_ms: u64) -> Self {
        self.check_interval_ms = interval_ms;
        self
    }

    /// Validate the options.
    ///
    /// Bounded sizes must be positive and the connect timeout non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_pool_size == Some(0) {
            return Err(CorralError::Configuration(
                "max_pool_size must be a positive integer".into(),
            ));
        }
        if self.wait_queue_multiple == Some(0) {
            return Err(CorralError::Configuration(
                "wait_queue_multiple must be a positive integer".into(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(CorralError::Configuration(
                "connect_timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Get the maximum pool size (None = unbounded).
    pub fn max_pool_size(&self) -> Option<u32> {
        self.max_pool_size
    }

    /// Get the wait-queue timeout (None = wait forever).
    pub fn wait_queue_timeout(&self) -> Option<Duration> {
        self.wait_queue_timeout_ms.map(Duration::from_millis)
    }

    /// Get the waiter cap multiple (None = unbounded).
    pub fn wait_queue_multiple(&self) -> Option<u32> {
        self.wait_queue_multiple
    }

    /// Get the connect timeout as a Duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Get the per-operation socket timeout, if any.
    pub fn socket_timeout(&self) -> Option<Duration> {
        self.socket_timeout_ms.map(Duration::from_millis)
    }

    /// Get the idle interval after which connections are liveness-checked.
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Absolute cap on simultaneous waiters, when both the pool size and the
    /// waiter multiple are bounded.
    pub(crate) fn max_waiters(&self) -> Option<usize> {
        match (self.max_pool_size, self.wait_queue_multiple) {
            (Some(max), Some(multiple)) => Some(max as usize * multiple as usize),
            _ => None,
        }
    }

    /// Timeouts handed to the transport factory.
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            connect_timeout: Some(self.connect_timeout()),
            socket_timeout: self.socket_timeout(),
        }
    }
}

impl Default for PoolOptions {
    /// Default pool options
    ///
    /// - max_pool_size: 100
    /// - wait_queue_timeout: none (wait forever)
    /// - wait_queue_multiple: none (unbounded waiters)
    /// - connect_timeout: 20 seconds
    /// - socket_timeout: none
    /// - check_interval: 1 second
    fn default() -> Self {
        Self::new()
    }
}
