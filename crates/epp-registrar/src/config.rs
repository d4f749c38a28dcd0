//! Registrar configuration.
//!
//! Loaded either through serde (any self-describing format) or from the
//! environment:
//!
//! | Variable        | Field       |
//! |-----------------|-------------|
//! | `EPP_USERNAME`  | `username`  |
//! | `EPP_PASSWORD`  | `password`  |
//! | `EPP_TEST_MODE` | `test_mode` |

use crate::{Error, Result};
use epp_core::Credentials;
use epp_transport::{Endpoint, TlsOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Production EPP host.
pub const PRODUCTION_HOST: &str = "epp.nominet.uk";

/// Testbed EPP host.
pub const TESTBED_HOST: &str = "testbed-epp.nominet.uk";

/// EPP port for both environments.
pub const EPP_PORT: u16 = 700;

/// Registrar settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Registrar tag (IPS tag), sent as the EPP client id.
    #[serde(default)]
    pub username: String,

    /// EPP password.
    #[serde(default)]
    pub password: Zeroizing<String>,

    /// Use the testbed endpoint. Also turns off certificate verification.
    #[serde(default)]
    pub test_mode: bool,

    /// Overrides the environment's host.
    #[serde(default)]
    pub host: Option<String>,

    /// Overrides the environment's port.
    #[serde(default)]
    pub port: Option<u16>,

    /// TCP connect plus TLS handshake limit, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Per-frame read/write deadline, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    epp_transport::tls::DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_read_timeout_secs() -> u64 {
    epp_transport::tls::DEFAULT_READ_TIMEOUT.as_secs()
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: Zeroizing::new(String::new()),
            test_mode: false,
            host: None,
            port: None,
            connect_timeout_secs: default_connect_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
        }
    }
}

impl fmt::Debug for RegistrarConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrarConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("test_mode", &self.test_mode)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("read_timeout_secs", &self.read_timeout_secs)
            .finish()
    }
}

impl RegistrarConfig {
    /// Creates a config with the given credentials and default settings.
    pub fn new(username: impl Into<String>, password: impl Into<String>, test_mode: bool) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
            test_mode,
            ..Self::default()
        }
    }

    /// Reads `EPP_USERNAME`, `EPP_PASSWORD` and `EPP_TEST_MODE`.
    ///
    /// `EPP_TEST_MODE` is true for `1`, `true` or `yes` (any case).
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the username or password is missing.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let username = lookup("EPP_USERNAME")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("EPP_USERNAME is not set".into()))?;
        let password = lookup("EPP_PASSWORD")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config("EPP_PASSWORD is not set".into()))?;
        let test_mode = lookup("EPP_TEST_MODE").is_some_and(|v| parse_flag(&v));

        Ok(Self::new(username, password, test_mode))
    }

    /// Session credentials.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.as_str(), self.test_mode)
    }

    /// Host and port for the selected environment, after overrides.
    pub fn endpoint(&self) -> Endpoint {
        let default_host = if self.test_mode {
            TESTBED_HOST
        } else {
            PRODUCTION_HOST
        };
        Endpoint::new(
            self.host.as_deref().unwrap_or(default_host),
            self.port.unwrap_or(EPP_PORT),
        )
    }

    /// TLS policy: verification is off only in test mode.
    pub fn tls_options(&self) -> TlsOptions {
        let options = if self.test_mode {
            TlsOptions::testbed()
        } else {
            TlsOptions::production()
        };
        options
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_read_timeout(Duration::from_secs(self.read_timeout_secs))
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
