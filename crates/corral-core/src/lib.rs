//! Corral Core - Core abstractions for the corral database driver
//!
//! This crate provides the fundamental traits and types the other corral
//! crates depend on:
//!
//! - `Transport` - Trait for one live byte stream to the server
//! - `TransportFactory` - Trait for establishing new transports
//! - `ServerAddress` - Network address of a server
//! - `CorralError` / `Result` - Common error handling

mod address;
mod error;
mod transport;

pub use address::{DEFAULT_PORT, ServerAddress};
pub use error::{CorralError, Result};
pub use transport::{ConnectOptions, Transport, TransportFactory};
