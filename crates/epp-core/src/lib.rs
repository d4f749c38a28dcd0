//! Core protocol engine for the Extensible Provisioning Protocol (EPP).
//!
//! This crate implements the registrar side of EPP without owning any sockets:
//! - Frame encoding and decoding per RFC 5734 (4-byte big-endian total length)
//! - Command construction for the domain lifecycle (check, info, create, renew,
//!   transfer request, nameserver update) plus login/logout
//! - Targeted response interpretation (availability, dates, nameservers,
//!   auth-info, result codes)
//! - The per-operation session state machine
//!
//! Network I/O is handled by `epp-transport`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod frame;
pub mod response;
pub mod session;
pub mod xml;

pub use command::{build_command, CommandKind, CommandParams, Registrant};
pub use error::{Error, Result};
pub use frame::{read_frame, write_frame, Frame};
pub use response::{ParsedResult, ResultCode};
pub use session::{ClTrid, Credentials, Session, SessionState};
