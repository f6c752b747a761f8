//! Scoped checkout guard

use std::fmt;
use std::ops::{Deref, DerefMut};

use tokio::sync::OwnedSemaphorePermit;

use crate::connection::Connection;
use crate::pool::Pool;

/// A connection checked out from a [`Pool`].
///
/// Dropping the guard returns the connection to the pool exactly once, on
/// every exit path. By default the connection is recycled into the idle
/// cache; a caller that observed a transport-level failure calls
/// [`discard`](PooledConnection::discard) (or
/// [`release`](PooledConnection::release) with `discard = true`) so a broken
/// socket is never cached. An application-level failure (a malformed
/// request, a decode error) leaves the transport healthy, so the guard
/// should simply drop.
///
/// ```ignore
/// let mut conn = pool.get().await?;
/// match run_request(&mut conn).await {
///     Err(e) if e.is_transport() => {
///         conn.discard();
///         Err(e)
///     }
///     other => other, // recycled on drop
/// }
/// ```
pub struct PooledConnection {
    pool: Pool,
    conn: Option<Connection>,
    permit: Option<OwnedSemaphorePermit>,
    discard: bool,
}

impl PooledConnection {
    pub(crate) fn new(pool: Pool, conn: Connection, permit: OwnedSemaphorePermit) -> Self {
        Self {
            pool,
            conn: Some(conn),
            permit: Some(permit),
            discard: false,
        }
    }

    /// Return the connection to the pool, recycling it when `discard` is
    /// false and closing it when true.
    pub fn release(mut self, discard: bool) {
        self.discard = discard;
    }

    /// Return the connection to the pool and close it.
    pub fn discard(self) {
        self.release(true);
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().expect("connection already released")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection already released")
    }
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("conn", &self.conn)
            .field("discard", &self.discard)
            .finish_non_exhaustive()
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.check_in(conn, self.discard);
        }
        // The capacity slot is released only after check-in, so the idle
        // cache never exceeds the number of unheld permits.
        self.permit.take();
    }
}
