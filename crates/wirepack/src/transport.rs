//! Transport abstraction and the TCP implementation.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::debug;
use wirepack_protocol::{Result, WirepackError};

/// How long a dial may take before it counts as failed.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// A duplex byte stream the supervisor can dial repeatedly.
///
/// `connect` yields independently owned read and write halves so the frame
/// reader and the packet writer run as separate tasks over one connection;
/// dropping both halves closes it.
pub trait Transport: Send + Sync {
    type ReadHalf: AsyncRead + Send + Unpin + 'static;
    type WriteHalf: AsyncWrite + Send + Unpin + 'static;

    /// Establishes a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established in time.
    fn connect(&self) -> impl Future<Output = Result<(Self::ReadHalf, Self::WriteHalf)>> + Send;
}

/// TCP transport configuration.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Remote address in `host:port` form.
    pub address: String,
    pub connect_timeout: Duration,
}

impl TcpConfig {
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// The shipped transport: one TCP connection per epoch.
#[derive(Debug)]
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    #[must_use]
    pub fn new(config: TcpConfig) -> Self {
        Self { config }
    }
}

impl Transport for TcpTransport {
    type ReadHalf = OwnedReadHalf;
    type WriteHalf = OwnedWriteHalf;

    async fn connect(&self) -> Result<(OwnedReadHalf, OwnedWriteHalf)> {
        let stream = tokio::time::timeout(
            self.config.connect_timeout,
            TcpStream::connect(&self.config.address),
        )
        .await
        .map_err(|_| WirepackError::ConnectTimeout)??;
        debug!(address = %self.config.address, "TCP connection established");
        Ok(stream.into_split())
    }
}
