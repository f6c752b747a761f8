//! Corral Pool - Bounded concurrent connection pooling
//!
//! This crate manages a fixed-capacity set of live connections shared across
//! many concurrent callers: admission control on waiters, semaphore-bounded
//! concurrency, LIFO idle caching with lazy health checks, and
//! generation-based bulk invalidation.
//!
//! # Example
//!
//! ```ignore
//! use corral_core::ServerAddress;
//! use corral_pool::{Pool, PoolOptions, TcpFactory};
//!
//! let options = PoolOptions::new()
//!     .with_max_pool_size(Some(20))
//!     .with_wait_queue_timeout_ms(Some(5_000));
//!
//! let pool = Pool::new(ServerAddress::with_default_port("db1"), options, TcpFactory)?;
//! let mut conn = pool.get().await?;
//! conn.send(&request).await?;
//! // Recycled into the idle cache on drop.
//! ```

mod checkout;
mod connection;
mod options;
mod pool;
mod stats;
mod tcp;


pub use checkout::PooledConnection;
pub use connection::Connection;
pub use options::PoolOptions;
pub use pool::Pool;
pub use stats::PoolStats;
pub use tcp::{TcpFactory, TcpTransport};
