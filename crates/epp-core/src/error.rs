//! Error types for protocol operations.

use crate::session::SessionState;
use thiserror::Error;

/// Result type alias for protocol operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Protocol operation errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Frame header or length mismatch, or a truncated stream.
    #[error("Framing error: {0}")]
    Framing(String),

    /// Login was answered with something other than result code 1000.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Command kind outside the supported set.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Expected field absent, or the response could not be read.
    #[error("Interpretation error: {0}")]
    Interpretation(String),

    /// Well-formed response carrying a non-success result code.
    #[error("Registry rejected command with result code {code}{}", detail(.message))]
    RegistryRejection {
        /// EPP result code.
        code: u16,
        /// Human readable `<msg>` text, when the registry sent one.
        message: Option<String>,
    },

    /// Request parameters missing or invalid for the command kind.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Operation attempted in the wrong session state.
    #[error("Invalid session state: expected {expected}, found {found}")]
    InvalidState {
        /// State(s) the operation requires.
        expected: &'static str,
        /// State the session was actually in.
        found: SessionState,
    },

    /// I/O error while writing a frame.
    #[error("I/O error: {0}")]
    Io(String),
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}
