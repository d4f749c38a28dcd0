//! Transport layer for EPP sessions.
//!
//! Implements EPP over TLS/TCP per RFC 5734:
//! - TLS connect with a hard timeout and configurable certificate policy
//! - Greeting consumption immediately after the handshake
//! - Frame send/receive with a read deadline
//! - The [`Connect`] seam used by the operation layer
//!
//! One [`Connection`] carries one session; nothing is pooled or reused.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod error;
pub mod tls;

pub use connection::{Connect, Connection, Endpoint};
pub use error::{Error, Result};
pub use tls::{TlsConnector, TlsOptions};
