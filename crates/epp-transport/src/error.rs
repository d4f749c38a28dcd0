//! Transport layer errors.

use thiserror::Error;

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Transport errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection failed: refused, reset, TLS handshake failure or closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// TLS client configuration could not be built.
    #[error("TLS configuration error: {0}")]
    TlsConfig(String),

    /// Operation exceeded its deadline.
    #[error("Operation timed out: {operation}")]
    Timeout {
        /// The operation that timed out.
        operation: &'static str,
    },

    /// Protocol error from core.
    #[error("Protocol error: {0}")]
    Protocol(#[from] epp_core::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the byte stream is no longer usable for further frames.
    ///
    /// True for connect, timeout and I/O failures and for malformed or
    /// truncated frames. Errors raised while reading a well-formed frame
    /// leave the stream in sync.
    pub fn is_stream_failure(&self) -> bool {
        match self {
            Error::ConnectionFailed(_)
            | Error::TlsConfig(_)
            | Error::Timeout { .. }
            | Error::Io(_) => true,
            Error::Protocol(core) => {
                matches!(core, epp_core::Error::Framing(_) | epp_core::Error::Io(_))
            }
        }
    }
}
