//! Domain lifecycle operations.
//!
//! Every operation opens its own session and runs it to completion:
//!
//! ```text
//! connect (greeting) -> login -> command -> response -> logout -> close
//! ```
//!
//! Logout is best effort and is skipped once the stream has failed. Close
//! always runs once a connection exists, on success and on every failure
//! path.

use crate::config::RegistrarConfig;
use crate::domain::Domain;
use crate::policy::PolicyRefusal;
use crate::{Error, ErrorKind, Result};
use epp_core::{CommandKind, CommandParams, Credentials, Frame, ParsedResult, Registrant, Session};
use epp_transport::{Connect, Connection, Endpoint, TlsConnector};

/// TLDs served by the registry.
pub const TLDS: [&str; 8] = [
    ".uk", ".co.uk", ".org.uk", ".me.uk", ".net.uk", ".ltd.uk", ".plc.uk", ".sch.uk",
];

/// Runs domain operations against one registry endpoint.
///
/// Immutable after construction; concurrent calls each open their own
/// connection.
pub struct Registrar<C = TlsConnector> {
    connector: C,
    endpoint: Endpoint,
    credentials: Credentials,
}

impl Registrar<TlsConnector> {
    /// Creates a registrar that connects over TLS as `config` describes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the TLS client cannot be configured.
    pub fn new(config: &RegistrarConfig) -> Result<Self> {
        let connector = TlsConnector::new(config.tls_options())?;
        Ok(Self::with_connector(config, connector))
    }
}

impl<C: Connect> Registrar<C> {
    /// Creates a registrar that opens connections through `connector`.
    pub fn with_connector(config: &RegistrarConfig, connector: C) -> Self {
        Self {
            connector,
            endpoint: config.endpoint(),
            credentials: config.credentials(),
        }
    }

    /// Endpoint operations connect to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// TLDs this registrar can manage.
    pub fn tlds() -> &'static [&'static str] {
        &TLDS
    }

    /// Checks whether `domain` can be registered.
    ///
    /// # Errors
    ///
    /// Returns an `Interpretation` error if the check response carries no
    /// availability flag.
    pub async fn is_domain_available(&self, domain: &Domain) -> Result<bool> {
        const OP: &str = "is_domain_available";
        let parsed = self
            .execute(OP, CommandKind::Check, &domain.name, &CommandParams::new())
            .await?;

        parsed.availability.ok_or_else(|| {
            failure(
                OP,
                &domain.name,
                epp_core::Error::Interpretation("Unable to determine domain availability".into())
                    .into(),
            )
        })
    }

    /// Fetches registration and expiry times and nameservers into `domain`.
    ///
    /// Fields the response does not carry are left untouched.
    pub async fn domain_details(&self, domain: &mut Domain) -> Result<()> {
        let parsed = self
            .execute(
                "domain_details",
                CommandKind::Info,
                &domain.name,
                &CommandParams::new(),
            )
            .await?;

        if let Some(created) = parsed.created {
            domain.registration_time = Some(created);
        }
        if let Some(expires) = parsed.expires {
            domain.expiration_time = Some(expires);
        }
        domain.fill_nameservers(&parsed.nameservers);
        Ok(())
    }

    /// Registers `domain` with its period and nameservers.
    pub async fn register_domain(&self, domain: &Domain) -> Result<()> {
        let mut params = CommandParams::new().nameservers(domain.nameservers());
        params.period = domain.registration_period;
        params.registrant = domain.contact_registrant.as_ref().map(Registrant::from);

        self.execute("register_domain", CommandKind::Create, &domain.name, &params)
            .await
            .map(drop)
    }

    /// Renews `domain` by its period (one year by default).
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` without connecting if the domain has
    /// no expiration time, which the registry needs to confirm the renewal.
    pub async fn renew_domain(&self, domain: &Domain) -> Result<()> {
        let expires = domain.expiration_time.ok_or_else(|| {
            Error::InvalidRequest(format!(
                "renewing {} requires its current expiration time",
                domain.name
            ))
        })?;
        let params = CommandParams::new()
            .period(domain.registration_period.unwrap_or(1))
            .cur_exp_date(expires.date_naive());

        self.execute("renew_domain", CommandKind::Renew, &domain.name, &params)
            .await
            .map(drop)
    }

    /// Requests a transfer of `domain` using its EPP code.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` without connecting if the domain has
    /// no EPP code.
    pub async fn transfer_domain(&self, domain: &Domain) -> Result<()> {
        let code = domain
            .epp_code
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                Error::InvalidRequest(format!("transferring {} requires an EPP code", domain.name))
            })?;
        let params = CommandParams::new().auth_code(code);

        self.execute("transfer_domain", CommandKind::Transfer, &domain.name, &params)
            .await
            .map(drop)
    }

    /// Adds the domain's ns1..ns4 as nameservers.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidRequest` without connecting if no nameserver
    /// slot is filled.
    pub async fn modify_nameservers(&self, domain: &Domain) -> Result<()> {
        let nameservers = domain.nameservers();
        if nameservers.is_empty() {
            return Err(Error::InvalidRequest(format!(
                "no nameservers given for {}",
                domain.name
            )));
        }
        let params = CommandParams::new().nameservers(nameservers);

        self.execute("modify_nameservers", CommandKind::UpdateNs, &domain.name, &params)
            .await
            .map(drop)
    }

    /// Reads the domain's auth-info code and stores it in `domain`.
    ///
    /// # Errors
    ///
    /// Returns an `Interpretation` error if the info response carries no
    /// auth-info password.
    pub async fn auth_code(&self, domain: &mut Domain) -> Result<String> {
        const OP: &str = "auth_code";
        let parsed = self
            .execute(OP, CommandKind::Info, &domain.name, &CommandParams::new())
            .await?;

        let code = parsed.auth_info.ok_or_else(|| {
            failure(
                OP,
                &domain.name,
                epp_core::Error::Interpretation("EPP code not found".into()).into(),
            )
        })?;
        domain.epp_code = Some(code.clone());
        Ok(code)
    }

    /// Whether the registry reports `domain` as an existing object.
    ///
    /// A registry rejection of the info command means `false`. Connection
    /// and protocol failures are returned as errors.
    pub async fn can_be_transferred(&self, domain: &Domain) -> Result<bool> {
        match self
            .execute(
                "can_be_transferred",
                CommandKind::Info,
                &domain.name,
                &CommandParams::new(),
            )
            .await
        {
            Ok(parsed) => Ok(parsed.has_domain_name),
            Err(e) if e.kind() == ErrorKind::RegistryRejection => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Always refused.
    pub fn delete_domain(&self, domain: &Domain) -> Result<()> {
        refuse(PolicyRefusal::Delete, domain)
    }

    /// Always refused.
    pub fn modify_contact(&self, domain: &Domain) -> Result<()> {
        refuse(PolicyRefusal::ModifyContact, domain)
    }

    /// Always refused.
    pub fn enable_privacy_protection(&self, domain: &Domain) -> Result<()> {
        refuse(PolicyRefusal::EnablePrivacy, domain)
    }

    /// Always refused.
    pub fn disable_privacy_protection(&self, domain: &Domain) -> Result<()> {
        refuse(PolicyRefusal::DisablePrivacy, domain)
    }

    /// Always refused.
    pub fn lock(&self, domain: &Domain) -> Result<()> {
        refuse(PolicyRefusal::Lock, domain)
    }

    /// Always refused.
    pub fn unlock(&self, domain: &Domain) -> Result<()> {
        refuse(PolicyRefusal::Unlock, domain)
    }

    /// Runs one full session for a single command.
    async fn execute(
        &self,
        operation: &'static str,
        kind: CommandKind,
        domain: &str,
        params: &CommandParams,
    ) -> Result<ParsedResult> {
        tracing::debug!(operation, domain, command = %kind, "Starting EPP operation");

        let mut session = Session::new(self.credentials.clone());
        let outcome = self.run_session(&mut session, kind, domain, params).await;
        session.close();

        match outcome {
            Ok(parsed) => {
                tracing::debug!(
                    operation,
                    domain,
                    code = ?parsed.result_code.map(|c| c.value()),
                    "EPP operation completed"
                );
                Ok(parsed)
            }
            Err(source) => Err(failure(operation, domain, source)),
        }
    }

    async fn run_session(
        &self,
        session: &mut Session,
        kind: CommandKind,
        domain: &str,
        params: &CommandParams,
    ) -> epp_transport::Result<ParsedResult> {
        session.begin_connect()?;
        let mut conn = self.connector.connect(&self.endpoint).await?;

        let outcome = Self::exchange(session, &mut conn, kind, domain, params).await;
        conn.close().await;
        outcome
    }

    async fn exchange(
        session: &mut Session,
        conn: &mut Connection<C::Stream>,
        kind: CommandKind,
        domain: &str,
        params: &CommandParams,
    ) -> epp_transport::Result<ParsedResult> {
        session.connected()?;

        conn.send(&session.login_request()?).await?;
        let reply = conn.recv().await?;
        session.process_login_response(&reply)?;

        let outcome = Self::command(session, conn, kind, domain, params).await;
        match &outcome {
            // The stream is unusable; close without logging out.
            Err(e) if e.is_stream_failure() => {
                tracing::debug!(error = %e, "Skipping EPP logout after stream failure");
            }
            _ => Self::logout(session, conn).await,
        }
        outcome
    }

    async fn command(
        session: &mut Session,
        conn: &mut Connection<C::Stream>,
        kind: CommandKind,
        domain: &str,
        params: &CommandParams,
    ) -> epp_transport::Result<ParsedResult> {
        conn.send(&session.command_request(kind, domain, params)?)
            .await?;
        let reply = conn.recv().await?;
        Ok(session.process_command_response(&reply)?)
    }

    async fn logout(session: &mut Session, conn: &mut Connection<C::Stream>) {
        let request = match session.logout_request() {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping EPP logout");
                return;
            }
        };

        let reply: epp_transport::Result<Frame> = async {
            conn.send(&request).await?;
            conn.recv().await
        }
        .await;

        match reply {
            Ok(frame) => session.process_logout_response(&frame),
            Err(e) => tracing::warn!(error = %e, "EPP logout failed"),
        }
    }
}

fn failure(operation: &'static str, domain: &str, source: epp_transport::Error) -> Error {
    tracing::error!(operation, domain, error = %source, "EPP operation failed");
    Error::Operation {
        operation,
        domain: domain.to_string(),
        source,
    }
}

fn refuse(refusal: PolicyRefusal, domain: &Domain) -> Result<()> {
    tracing::debug!(operation = refusal.operation(), domain = %domain.name, "Refused by registry policy");
    Err(Error::Policy(refusal))
}
