//! Domain lifecycle operations for .uk domains over EPP.
//!
//! This crate is the operation layer on top of `epp-core` and
//! `epp-transport`:
//! - [`Registrar`] runs one full EPP session per operation
//!   (connect, login, command, logout, close)
//! - [`Domain`] and [`Contact`] are the records operations read and update
//! - [`PolicyRefusal`] covers operations the registry does not offer
//! - [`RegistrarConfig`] selects credentials, endpoint and TLS policy
//!
//! # Example
//!
//! ```no_run
//! use epp_registrar::{Domain, Registrar, RegistrarConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registrar = Registrar::new(&RegistrarConfig::from_env()?)?;
//! let available = registrar
//!     .is_domain_available(&Domain::new("example.co.uk"))
//!     .await?;
//! println!("available: {available}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod error;
pub mod policy;
pub mod registrar;

pub use config::RegistrarConfig;
pub use domain::{Contact, Domain};
pub use error::{Error, ErrorKind, Result};
pub use policy::PolicyRefusal;
pub use registrar::Registrar;
