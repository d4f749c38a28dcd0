//! Operation errors.

use crate::policy::PolicyRefusal;
use thiserror::Error;

/// Result type alias.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors returned by registrar operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An EPP session for `operation` on `domain` failed.
    #[error("{operation} failed for {domain}: {source}")]
    Operation {
        /// Operation name, such as `is_domain_available`.
        operation: &'static str,
        /// Domain the operation targeted.
        domain: String,
        /// Underlying transport or protocol error.
        #[source]
        source: epp_transport::Error,
    },

    /// The registry does not offer this operation.
    #[error(transparent)]
    Policy(#[from] PolicyRefusal),

    /// The request is missing data the command needs. Nothing was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration is incomplete or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The TLS client could not be set up.
    #[error("Transport setup failed: {0}")]
    Transport(#[from] epp_transport::Error),
}

/// Coarse error category for callers that branch on the failure type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connect, TLS, timeout or stream failure.
    Connection,
    /// Malformed or truncated frame.
    Framing,
    /// Login rejected.
    Authentication,
    /// Operation refused by registry policy or unknown to the builder.
    UnsupportedOperation,
    /// Response lacked an expected field or held an unreadable value.
    Interpretation,
    /// The registry answered with a non-success result code.
    RegistryRejection,
    /// Local validation failed before anything was sent.
    InvalidRequest,
}

impl Error {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Operation { source, .. } | Error::Transport(source) => transport_kind(source),
            Error::Policy(_) => ErrorKind::UnsupportedOperation,
            Error::InvalidRequest(_) | Error::Config(_) => ErrorKind::InvalidRequest,
        }
    }

    /// Registry result code, for registry rejections.
    pub fn registry_code(&self) -> Option<u16> {
        match self {
            Error::Operation {
                source:
                    epp_transport::Error::Protocol(epp_core::Error::RegistryRejection { code, .. }),
                ..
            } => Some(*code),
            _ => None,
        }
    }
}

fn transport_kind(err: &epp_transport::Error) -> ErrorKind {
    use epp_transport::Error as T;
    match err {
        T::ConnectionFailed(_) | T::TlsConfig(_) | T::Timeout { .. } | T::Io(_) => {
            ErrorKind::Connection
        }
        T::Protocol(core) => core_kind(core),
    }
}

fn core_kind(err: &epp_core::Error) -> ErrorKind {
    use epp_core::Error as C;
    match err {
        C::Framing(_) => ErrorKind::Framing,
        C::Authentication(_) => ErrorKind::Authentication,
        C::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
        C::Interpretation(_) => ErrorKind::Interpretation,
        C::RegistryRejection { .. } => ErrorKind::RegistryRejection,
        C::InvalidRequest(_) | C::InvalidState { .. } => ErrorKind::InvalidRequest,
        C::Io(_) => ErrorKind::Connection,
    }
}
