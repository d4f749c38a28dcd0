//! Framed EPP connection over any byte stream.

use crate::{Error, Result};
use async_trait::async_trait;
use epp_core::{read_frame, write_frame, Frame};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Upper bound on a graceful shutdown during [`Connection::close`].
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry host and port.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name, also used for TLS server name verification.
    pub host: String,
    /// TCP port (700 for EPP).
    pub port: u16,
}

impl Endpoint {
    /// Creates an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Opens connections to a registry endpoint.
///
/// Implementations must hand back a [`Connection`] whose greeting has
/// already been consumed.
#[async_trait]
pub trait Connect: Send + Sync {
    /// Underlying byte stream.
    type Stream: AsyncRead + AsyncWrite + Unpin + Send;

    /// Connects to `endpoint` and consumes the server greeting.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionFailed` or `Error::Timeout` if the endpoint
    /// cannot be reached, and `Error::Protocol` if the greeting frame is
    /// malformed.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Connection<Self::Stream>>;
}

/// One EPP connection: a byte stream plus frame send/receive.
pub struct Connection<S> {
    stream: Option<S>,
    peer: String,
    read_timeout: Duration,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wraps an established stream and consumes the server greeting.
    ///
    /// The greeting is read and discarded; its contents are not validated.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read within `read_timeout`.
    /// The stream is shut down before the error is returned.
    pub async fn establish(
        stream: S,
        peer: impl Into<String>,
        read_timeout: Duration,
    ) -> Result<Self> {
        let mut conn = Self {
            stream: Some(stream),
            peer: peer.into(),
            read_timeout,
        };

        match conn.recv().await {
            Ok(greeting) => {
                tracing::debug!(
                    peer = %conn.peer,
                    bytes = greeting.payload().len(),
                    "Consumed EPP greeting"
                );
                Ok(conn)
            }
            Err(e) => {
                conn.close().await;
                Err(e)
            }
        }
    }

    /// Remote peer description (`host:port`).
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Sends one frame.
    ///
    /// # Errors
    ///
    /// Returns `Error::ConnectionFailed` if the connection is closed or the
    /// write fails, and `Error::Timeout` if it does not complete in time.
    pub async fn send(&mut self, frame: &Frame) -> Result<()> {
        let deadline = self.read_timeout;
        let stream = self.stream_mut()?;

        match timeout(deadline, write_frame(stream, frame.payload())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(epp_core::Error::Io(msg))) => Err(Error::ConnectionFailed(msg)),
            Ok(Err(e)) => Err(Error::Protocol(e)),
            Err(_) => Err(Error::Timeout {
                operation: "frame send",
            }),
        }
    }

    /// Receives one frame.
    ///
    /// # Errors
    ///
    /// Returns `Error::Protocol` wrapping a framing error for malformed or
    /// truncated frames, and `Error::Timeout` if no complete frame arrives
    /// before the read deadline.
    pub async fn recv(&mut self) -> Result<Frame> {
        let deadline = self.read_timeout;
        let stream = self.stream_mut()?;

        match timeout(deadline, read_frame(stream)).await {
            Ok(frame) => Ok(frame?),
            Err(_) => Err(Error::Timeout {
                operation: "frame receive",
            }),
        }
    }

    /// Shuts the stream down. Safe to call more than once.
    pub async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        match timeout(CLOSE_TIMEOUT, stream.shutdown()).await {
            Ok(Ok(())) => tracing::debug!(peer = %self.peer, "EPP connection closed"),
            Ok(Err(e)) => tracing::debug!(peer = %self.peer, error = %e, "Shutdown error ignored"),
            Err(_) => tracing::debug!(peer = %self.peer, "Shutdown timed out; dropping stream"),
        }
    }

    fn stream_mut(&mut self) -> Result<&mut S> {
        self.stream
            .as_mut()
            .ok_or_else(|| Error::ConnectionFailed("connection closed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    const GREETING: &[u8] = b"<epp><greeting/></epp>";

    #[tokio::test]
    async fn test_establish_consumes_greeting() {
        let (client, mut server) = duplex(1024);
        write_frame(&mut server, GREETING).await.unwrap();
        write_frame(&mut server, b"<next/>").await.unwrap();

        let mut conn = Connection::establish(client, "test:700", Duration::from_secs(1))
            .await
            .expect("establish failed");

        // The greeting is gone; the next frame is the first one callers see.
        let frame = conn.recv().await.unwrap();
        assert_eq!(frame.payload(), b"<next/>");
    }

    #[tokio::test]
    async fn test_establish_fails_on_truncated_greeting() {
        let (client, mut server) = duplex(1024);
        server.write_all(&100u32.to_be_bytes()).await.unwrap();
        drop(server);

        let err = Connection::establish(client, "test:700", Duration::from_secs(1))
            .await
            .err()
            .expect("establish should fail");
        assert!(matches!(err, Error::Protocol(epp_core::Error::Framing(_))));
    }

    #[tokio::test]
    async fn test_recv_times_out() {
        let (client, mut server) = duplex(1024);
        write_frame(&mut server, GREETING).await.unwrap();

        let mut conn = Connection::establish(client, "test:700", Duration::from_millis(50))
            .await
            .unwrap();
        let err = conn.recv().await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        drop(server);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (client, mut server) = duplex(1024);
        write_frame(&mut server, GREETING).await.unwrap();

        let mut conn = Connection::establish(client, "test:700", Duration::from_secs(1))
            .await
            .unwrap();
        conn.close().await;
        conn.close().await;
        assert!(conn.is_closed());

        let err = conn.send(&Frame::new("<epp/>")).await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
        let err = conn.recv().await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(
            Endpoint::new("epp.nominet.uk", 700).to_string(),
            "epp.nominet.uk:700"
        );
    }
}
