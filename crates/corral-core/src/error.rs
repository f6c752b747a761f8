//! Error types for corral

use std::time::Duration;

use thiserror::Error;

/// Core error type for corral operations
#[derive(Error, Debug)]
pub enum CorralError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timed out waiting for a connection from the pool after {0:?}")]
    WaitQueueTimeout(Duration),

    #[error("Too many callers waiting for a connection (limit: {0})")]
    ExceededWaiters(usize),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl CorralError {
    /// Whether this error indicates the underlying transport is unusable.
    ///
    /// Callers use this to decide between recycling a connection (an
    /// application-level failure leaves the socket healthy) and discarding
    /// it (a transport-level failure means the socket must not be reused).
    pub fn is_transport(&self) -> bool {
        matches!(self, CorralError::Transport(_))
    }

    /// Whether this error is a pool admission or wait-queue rejection.
    pub fn is_pool_exhausted(&self) -> bool {
        matches!(
            self,
            CorralError::WaitQueueTimeout(_) | CorralError::ExceededWaiters(_)
        )
    }
}

/// Result type alias for corral operations
pub type Result<T> = std::result::Result<T, CorralError>;
