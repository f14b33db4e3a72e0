//! Link transport seam and the TCP implementation for bridge rigs.
//!
//! The notification channel to the brain hub is a collaborator concern:
//! a BLE GATT transport implements the same pair of traits. What ships
//! here is the TCP transport used against serial/BLE bridge boxes and in
//! tests.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Transport that can locate and open the hub's notification link.
pub trait LinkTransport: Send {
    type Conn: LinkConnection;

    /// Try to locate `target` and connect within `timeout`. `Ok(None)`
    /// means the hub was not found this round; the session manager backs
    /// off and retries.
    fn connect(
        &mut self,
        target: &str,
        timeout: Duration,
    ) -> impl Future<Output = io::Result<Option<Self::Conn>>> + Send;
}

/// An open link. Notifications arrive as raw byte bursts in the
/// transport's own context; the session manager feeds them straight into
/// the frame accumulator without blocking.
pub trait LinkConnection: Send {
    /// Write one framed packet to the hub.
    fn write(&mut self, bytes: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Next notification payload; `Ok(None)` on orderly disconnect.
    fn next_notification(&mut self) -> impl Future<Output = io::Result<Option<Vec<u8>>>> + Send;
}

/// TCP transport: `target` is the bridge's socket address.
pub struct TcpLink;

impl LinkTransport for TcpLink {
    type Conn = TcpConnection;

    async fn connect(
        &mut self,
        target: &str,
        timeout: Duration,
    ) -> io::Result<Option<TcpConnection>> {
        match tokio::time::timeout(timeout, TcpStream::connect(target)).await {
            Ok(Ok(stream)) => Ok(Some(TcpConnection {
                stream,
                buf: vec![0u8; 4096],
            })),
            // Nobody listening yet is "not found", not a hard failure.
            Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => Ok(None),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(None),
        }
    }
}

pub struct TcpConnection {
    stream: TcpStream,
    buf: Vec<u8>,
}

impl LinkConnection for TcpConnection {
    async fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await
    }

    async fn next_notification(&mut self) -> io::Result<Option<Vec<u8>>> {
        let n = self.stream.read(&mut self.buf).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf[..n].to_vec()))
    }
}
