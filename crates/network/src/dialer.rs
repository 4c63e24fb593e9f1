//! Outbound connection factory
//!
//! The gate never opens sockets itself; it asks a [`Dialer`]. Production code
//! uses [`DirectDialer`], tests plug in in-memory streams.

use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens backend connections
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    /// Stream type produced by this dialer
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Connect to `address` (`host:port`)
    async fn dial(&self, address: &str) -> io::Result<Self::Stream>;
}

/// Plain TCP dialer with a connect timeout
#[derive(Debug, Clone)]
pub struct DirectDialer {
    timeout: Duration,
    nodelay: bool,
}

impl DirectDialer {
    pub fn new(timeout: Duration, nodelay: bool) -> Self {
        Self { timeout, nodelay }
    }
}

#[async_trait]
impl Dialer for DirectDialer {
    type Stream = TcpStream;

    async fn dial(&self, address: &str) -> io::Result<TcpStream> {
        let stream = tokio::time::timeout(self.timeout, TcpStream::connect(address))
            .await
            .map_err(|_| {
                io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect timed out after {:?}", self.timeout),
                )
            })??;

        if self.nodelay {
            stream.set_nodelay(true)?;
        }
        Ok(stream)
    }
}
