//! TCP transport implementation
//!
//! The default transport for production pools. Tests that need fault
//! injection plug their own [`TransportFactory`] in instead.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use corral_core::{ConnectOptions, Result, ServerAddress, Transport, TransportFactory};

/// A transport backed by one TCP stream.
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
    socket_timeout: Option<Duration>,
}

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is closed")
}

fn timeout_error(op: &str, timeout: Duration) -> io::Error {
    io::Error::new(
        io::ErrorKind::TimedOut,
        format!("{op} timed out after {timeout:?}"),
    )
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, buf: &[u8]) -> Result<()> {
        let socket_timeout = self.socket_timeout;
        let stream = self.stream.as_mut().ok_or_else(closed_error)?;
        match socket_timeout {
            Some(timeout) => tokio::time::timeout(timeout, stream.write_all(buf))
                .await
                .map_err(|_| timeout_error("send", timeout))??,
            None => stream.write_all(buf).await?,
        }
        Ok(())
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let socket_timeout = self.socket_timeout;
        let stream = self.stream.as_mut().ok_or_else(closed_error)?;
        let read = match socket_timeout {
            Some(timeout) => tokio::time::timeout(timeout, stream.read(buf))
                .await
                .map_err(|_| timeout_error("recv", timeout))??,
            None => stream.read(buf).await?,
        };
        Ok(read)
    }

    /// An idle transport should never have pending bytes; readability means
    /// the peer hung up or the stream is in an error state.
    fn is_closed(&self) -> bool {
        let Some(stream) = &self.stream else {
            return true;
        };
        let mut probe = [0u8; 1];
        match stream.try_read(&mut probe) {
            Ok(0) => true,
            Ok(_) => true,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => false,
            Err(_) => true,
        }
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the stream closes the descriptor synchronously.
        self.stream.take();
        Ok(())
    }
}

/// Factory that establishes [`TcpTransport`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpFactory;

#[async_trait]
impl TransportFactory for TcpFactory {
    async fn connect(
        &self,
        address: &ServerAddress,
        options: ConnectOptions,
    ) -> Result<Box<dyn Transport>> {
        let connect = TcpStream::connect((address.host(), address.port()));
        let stream = match options.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| timeout_error("connect", timeout))??,
            None => connect.await?,
        };
        stream.set_nodelay(true)?;
        Ok(Box::new(TcpTransport {
            stream: Some(stream),
            socket_timeout: options.socket_timeout,
        }))
    }
}
