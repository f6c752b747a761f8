//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Snapshot of a connection pool's accounting, for tests and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Total live connections (idle + in use)
    total: usize,
    /// Connections checked in and available for reuse
    idle: usize,
    /// Connections currently checked out
    in_use: usize,
    /// Callers blocked waiting for a capacity slot
    waiting: usize,
    /// Pool generation at snapshot time
    generation: u64,
}

impl PoolStats {
    pub(crate) fn new(
        total: usize,
        idle: usize,
        in_use: usize,
        waiting: usize,
        generation: u64,
    ) -> Self {
        Self {
            total,
            idle,
            in_use,
            waiting,
            generation,
        }
    }

    /// Total number of live connections.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of idle connections.
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Number of checked-out connections.
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Number of waiting callers.
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    /// Pool generation when the snapshot was taken.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new(0, 0, 0, 0, 0)
    }
}
