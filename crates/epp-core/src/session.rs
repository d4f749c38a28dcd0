//! Session state machine.
//!
//! A [`Session`] is sans-I/O: it produces request frames and consumes
//! response frames, while the caller moves the bytes. One session carries
//! exactly one substantive command:
//!
//! ```text
//! Idle -> Connecting -> Connected -> LoggedIn -> CommandSent -> LoggedOut -> Closed
//! ```
//!
//! `close` is accepted from every state so teardown can run on any failure path.

use crate::command::{build_command, build_login, build_logout, CommandKind, CommandParams};
use crate::frame::Frame;
use crate::response::{self, ParsedResult, ResultCode};
use crate::{Error, Result};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

/// Registrar login credentials.
#[derive(Clone)]
pub struct Credentials {
    client_id: String,
    password: Zeroizing<String>,
    testbed: bool,
}

impl Credentials {
    /// Creates credentials. `testbed` selects the registry's test environment.
    pub fn new(client_id: impl Into<String>, password: impl Into<String>, testbed: bool) -> Self {
        Self {
            client_id: client_id.into(),
            password: Zeroizing::new(password.into()),
            testbed,
        }
    }

    /// Client identifier (registrar tag).
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Login password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether these credentials target the testbed.
    pub fn is_testbed(&self) -> bool {
        self.testbed
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("password", &"[REDACTED]")
            .field("testbed", &self.testbed)
            .finish()
    }
}

/// Client transaction identifier: `<tag>-<unix millis>-<sequence>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClTrid(String);

impl ClTrid {
    /// Builds an identifier from its parts.
    pub fn new(tag: &str, unix_millis: u128, sequence: u32) -> Self {
        Self(format!("{tag}-{unix_millis}-{sequence}"))
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClTrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Protocol lifecycle of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing opened yet.
    Idle,
    /// Transport connect and greeting in progress.
    Connecting,
    /// Greeting consumed, awaiting login.
    Connected,
    /// Login accepted with result code 1000.
    LoggedIn,
    /// The substantive command has been issued.
    CommandSent,
    /// Logout issued.
    LoggedOut,
    /// Transport released.
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "Idle",
            SessionState::Connecting => "Connecting",
            SessionState::Connected => "Connected",
            SessionState::LoggedIn => "LoggedIn",
            SessionState::CommandSent => "CommandSent",
            SessionState::LoggedOut => "LoggedOut",
            SessionState::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// Session state machine for one connect-to-close exchange.
pub struct Session {
    credentials: Credentials,
    state: SessionState,
    sequence: u32,
    command: Option<CommandKind>,
}

impl Session {
    /// Creates an idle session.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            state: SessionState::Idle,
            sequence: 0,
            command: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Marks the start of the transport connect.
    pub fn begin_connect(&mut self) -> Result<()> {
        self.expect(SessionState::Idle, "Idle")?;
        self.state = SessionState::Connecting;
        Ok(())
    }

    /// Marks the transport as connected with the greeting consumed.
    pub fn connected(&mut self) -> Result<()> {
        self.expect(SessionState::Connecting, "Connecting")?;
        self.state = SessionState::Connected;
        Ok(())
    }

    /// Builds the login frame.
    pub fn login_request(&mut self) -> Result<Frame> {
        self.expect(SessionState::Connected, "Connected")?;
        let cl_trid = self.next_cl_trid("login");
        Ok(Frame::new(build_login(&self.credentials, &cl_trid)))
    }

    /// Validates the login response.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` unless the response carries result
    /// code 1000. The session stays in `Connected`, so no command can follow.
    pub fn process_login_response(&mut self, frame: &Frame) -> Result<()> {
        self.expect(SessionState::Connected, "Connected")?;
        let xml = frame.as_xml().map_err(|e| Error::Authentication(e.to_string()))?;

        match response::result_code(xml) {
            Some(code) if code == ResultCode::SUCCESS => {
                tracing::debug!(client_id = %self.credentials.client_id(), "EPP login accepted");
                self.state = SessionState::LoggedIn;
                Ok(())
            }
            Some(code) => {
                let detail = response::result_message(xml)
                    .map(|m| format!(" ({m})"))
                    .unwrap_or_default();
                Err(Error::Authentication(format!(
                    "EPP login failed with result code {code}{detail}"
                )))
            }
            None => Err(Error::Authentication(
                "EPP login failed: no result code in response".into(),
            )),
        }
    }

    /// Builds the frame for the session's one substantive command.
    pub fn command_request(
        &mut self,
        kind: CommandKind,
        domain: &str,
        params: &CommandParams,
    ) -> Result<Frame> {
        self.expect(SessionState::LoggedIn, "LoggedIn")?;
        let cl_trid = self.next_cl_trid(kind.tag());
        let xml = build_command(kind, domain, params, &cl_trid)?;
        self.state = SessionState::CommandSent;
        self.command = Some(kind);
        Ok(Frame::new(xml))
    }

    /// Interprets the command response.
    ///
    /// # Errors
    ///
    /// Returns `Error::RegistryRejection` for a non-success result code and
    /// `Error::Interpretation` if no result code can be found.
    pub fn process_command_response(&mut self, frame: &Frame) -> Result<ParsedResult> {
        self.expect(SessionState::CommandSent, "CommandSent")?;
        let xml = frame.as_xml()?;
        let parsed = response::interpret(xml)?;

        match parsed.result_code {
            Some(code) if code.is_success() => Ok(parsed),
            Some(code) => Err(Error::RegistryRejection {
                code: code.value(),
                message: parsed.message,
            }),
            None => Err(Error::Interpretation(format!(
                "no result code in {} response",
                self.command.map_or("command", CommandKind::tag)
            ))),
        }
    }

    /// Builds the logout frame.
    pub fn logout_request(&mut self) -> Result<Frame> {
        match self.state {
            SessionState::LoggedIn | SessionState::CommandSent => {
                let cl_trid = self.next_cl_trid("logout");
                self.state = SessionState::LoggedOut;
                Ok(Frame::new(build_logout(&cl_trid)))
            }
            found => Err(Error::InvalidState {
                expected: "LoggedIn or CommandSent",
                found,
            }),
        }
    }

    /// Records the logout response. Never fails; the outcome is only logged.
    pub fn process_logout_response(&self, frame: &Frame) {
        let code = frame.as_xml().ok().and_then(response::result_code);
        match code {
            Some(code) if code.is_success() => tracing::debug!(%code, "EPP logout acknowledged"),
            Some(code) => tracing::warn!(%code, "EPP logout returned non-success result"),
            None => tracing::warn!("EPP logout response carried no result code"),
        }
    }

    /// Marks the transport as released. Valid from any state.
    pub fn close(&mut self) {
        self.state = SessionState::Closed;
    }

    fn expect(&self, expected: SessionState, label: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                expected: label,
                found: self.state,
            })
        }
    }

    fn next_cl_trid(&mut self, tag: &str) -> ClTrid {
        self.sequence = self.sequence.wrapping_add(1);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        ClTrid::new(tag, millis, self.sequence)
    }
}
