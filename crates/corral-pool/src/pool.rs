//! Connection pool implementation

use std::collections::VecDeque;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tracing::{debug, trace, warn};

use corral_core::{CorralError, Result, ServerAddress, TransportFactory};

use crate::checkout::PooledConnection;
use crate::connection::Connection;
use crate::options::PoolOptions;
use crate::stats::PoolStats;

/// A bounded pool of connections to one server.
///
/// The pool caps concurrently open connections with a semaphore, caches
/// checked-in connections for reuse (most recently returned first), and
/// invalidates every outstanding connection at once by bumping its
/// generation on [`reset`](Pool::reset).
///
/// `Pool` is a cheap handle; clones share the same underlying state.
#[derive(Clone)]
pub struct Pool {
    shared: Arc<SharedPool>,
}

struct SharedPool {
    address: ServerAddress,
    options: PoolOptions,
    factory: Arc<dyn TransportFactory>,
    state: Mutex<PoolState>,
    /// Connections currently checked out.
    in_use: AtomicUsize,
    /// Callers currently blocked waiting for a capacity slot.
    waiting: AtomicUsize,
}

/// State guarded by the pool mutex. Critical sections stay short; semaphore
/// waits always happen outside the lock.
struct PoolState {
    /// Idle connections, most recently returned at the front.
    idle: VecDeque<Connection>,
    /// Bumped on every reset; connections stamped with an older value are
    /// discarded instead of reused.
    generation: u64,
    /// Sole authority for `max_pool_size`. Replaced wholesale when the pool
    /// is inherited across a process boundary.
    semaphore: Arc<Semaphore>,
    /// Process that owns this pool's accounting.
    owner_pid: u32,
}

fn permits_for(max_pool_size: Option<u32>) -> usize {
    max_pool_size.map_or(Semaphore::MAX_PERMITS, |max| max as usize)
}

impl Pool {
    /// Create a pool for `address`, establishing transports through `factory`.
    ///
    /// Fails with [`CorralError::Configuration`] if the options are invalid;
    /// no checkout ever reports a configuration problem.
    pub fn new<F: TransportFactory>(
        address: ServerAddress,
        options: PoolOptions,
        factory: F,
    ) -> Result<Self> {
        options.validate()?;
        let semaphore = Arc::new(Semaphore::new(permits_for(options.max_pool_size())));
        Ok(Self {
            shared: Arc::new(SharedPool {
                address,
                options,
                factory: Arc::new(factory),
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    generation: 0,
                    semaphore,
                    owner_pid: process::id(),
                }),
                in_use: AtomicUsize::new(0),
                waiting: AtomicUsize::new(0),
            }),
        })
    }

    /// Check out a connection, waiting up to the configured wait-queue
    /// timeout for a capacity slot.
    pub async fn get(&self) -> Result<PooledConnection> {
        self.get_with_timeout(self.shared.options.wait_queue_timeout())
            .await
    }

    /// Check out a connection with an explicit wait bound (None = wait
    /// forever), overriding the configured wait-queue timeout.
    pub async fn get_with_timeout(
        &self,
        wait_timeout: Option<Duration>,
    ) -> Result<PooledConnection> {
        let shared = &self.shared;

        let semaphore = {
            let mut state = shared.state.lock();
            self.flush_if_forked(&mut state);
            state.semaphore.clone()
        };

        // Admission control: a caller that would wait behind an already
        // saturated queue fails fast instead of consuming a timeout slot.
        // This is a pre-check; the caller is never enqueued.
        if let Some(limit) = shared.options.max_waiters() {
            if shared.waiting.load(Ordering::SeqCst) >= limit {
                return Err(CorralError::ExceededWaiters(limit));
            }
        }

        shared.waiting.fetch_add(1, Ordering::SeqCst);
        let acquired = match wait_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, semaphore.acquire_owned()).await {
                    Ok(acquired) => acquired,
                    Err(_) => {
                        shared.waiting.fetch_sub(1, Ordering::SeqCst);
                        return Err(CorralError::WaitQueueTimeout(timeout));
                    }
                }
            }
            None => semaphore.acquire_owned().await,
        };
        shared.waiting.fetch_sub(1, Ordering::SeqCst);
        // The semaphore is never closed; this guards the invariant anyway.
        let permit = acquired.map_err(|_| CorralError::Other("pool semaphore closed".into()))?;

        let conn = match self.take_idle() {
            Some(conn) => conn,
            // On connect failure the `?` drops `permit`, returning the
            // capacity slot before the transport error propagates.
            None => self.connect_new().await?,
        };

        shared.in_use.fetch_add(1, Ordering::SeqCst);
        trace!(id = %conn.id(), "connection checked out");
        Ok(PooledConnection::new(self.clone(), conn, permit))
    }

    /// Pop idle connections until one is usable: stale generations are
    /// dropped outright, and anything idle at least `check_interval` is
    /// liveness-probed before being handed out.
    fn take_idle(&self) -> Option<Connection> {
        loop {
            let (conn, generation) = {
                let mut state = self.shared.state.lock();
                let conn = state.idle.pop_front()?;
                (conn, state.generation)
            };
            let mut conn = conn;
            if conn.generation() != generation {
                debug!(id = %conn.id(), "discarding idle connection from an old generation");
                conn.close_quietly();
                continue;
            }
            if conn.idle_time() >= self.shared.options.check_interval() && conn.is_closed() {
                debug!(id = %conn.id(), "discarding dead idle connection");
                conn.close_quietly();
                continue;
            }
            return Some(conn);
        }
    }

    async fn connect_new(&self) -> Result<Connection> {
        let shared = &self.shared;
        let generation = shared.state.lock().generation;
        let transport = shared
            .factory
            .connect(&shared.address, shared.options.connect_options())
            .await?;
        let conn = Connection::new(transport, generation);
        debug!(id = %conn.id(), address = %shared.address, "established new connection");
        Ok(conn)
    }

    /// Return a connection to the pool.
    ///
    /// Never blocks and never fails outward. The connection is recycled to
    /// the front of the idle cache unless the caller asked for a discard,
    /// the connection was closed, or a reset happened while it was out.
    pub(crate) fn check_in(&self, mut conn: Connection, discard: bool) {
        let shared = &self.shared;
        // The counter may have been zeroed by a process-boundary flush while
        // this connection was checked out.
        let _ = shared
            .in_use
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            });

        if discard || conn.is_marked_closed() {
            trace!(id = %conn.id(), "connection discarded on check-in");
            conn.close_quietly();
            return;
        }

        let mut state = shared.state.lock();
        if conn.generation() != state.generation {
            drop(state);
            debug!(id = %conn.id(), "discarding connection checked in after a reset");
            conn.close_quietly();
            return;
        }
        conn.mark_returned();
        state.idle.push_front(conn);
    }

    /// Invalidate every connection issued so far.
    ///
    /// Idle connections are closed immediately. Checked-out connections are
    /// left to finish their current use; the generation test in check-in
    /// discards them instead of recycling them. Capacity accounting is not
    /// touched.
    pub fn reset(&self) {
        let (drained, generation) = {
            let mut state = self.shared.state.lock();
            state.generation += 1;
            let drained: Vec<Connection> = state.idle.drain(..).collect();
            (drained, state.generation)
        };
        debug!(generation, dropped = drained.len(), "pool reset");
        for mut conn in drained {
            conn.close_quietly();
        }
    }

    /// Discard all pool state if this process did not create it.
    ///
    /// Capacity accounting is only meaningful inside the creating process,
    /// and inherited transports must never be reused, so a new semaphore is
    /// installed and the counters start over.
    fn flush_if_forked(&self, state: &mut PoolState) {
        let pid = process::id();
        if state.owner_pid == pid {
            return;
        }
        warn!(
            owner = state.owner_pid,
            current = pid,
            "pool inherited across a process boundary; discarding state"
        );
        state.owner_pid = pid;
        state.generation += 1;
        state.idle.clear();
        state.semaphore = Arc::new(Semaphore::new(permits_for(
            self.shared.options.max_pool_size(),
        )));
        self.shared.in_use.store(0, Ordering::SeqCst);
        self.shared.waiting.store(0, Ordering::SeqCst);
    }

    /// Address this pool connects to.
    pub fn address(&self) -> &ServerAddress {
        &self.shared.address
    }

    /// Options this pool was built with.
    pub fn options(&self) -> &PoolOptions {
        &self.shared.options
    }

    /// Configured maximum pool size (None = unbounded).
    pub fn max_pool_size(&self) -> Option<u32> {
        self.shared.options.max_pool_size()
    }

    /// Number of idle connections available for reuse.
    pub fn idle_count(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Number of connections currently checked out.
    pub fn in_use_count(&self) -> usize {
        self.shared.in_use.load(Ordering::SeqCst)
    }

    /// Number of callers currently waiting for a capacity slot.
    pub fn wait_count(&self) -> usize {
        self.shared.waiting.load(Ordering::SeqCst)
    }

    /// Current pool generation.
    pub fn generation(&self) -> u64 {
        self.shared.state.lock().generation
    }

    /// Snapshot of the pool's current accounting.
    pub fn stats(&self) -> PoolStats {
        let (idle, generation) = {
            let state = self.shared.state.lock();
            (state.idle.len(), state.generation)
        };
        let in_use = self.shared.in_use.load(Ordering::SeqCst);
        let waiting = self.shared.waiting.load(Ordering::SeqCst);
        PoolStats::new(idle + in_use, idle, in_use, waiting, generation)
    }
}
