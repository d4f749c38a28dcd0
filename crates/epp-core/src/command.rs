//! EPP command construction.
//!
//! Commands are assembled from fixed templates. Every caller-supplied value
//! is rendered through [`Escaped`] so metacharacters cannot break out of the
//! element they belong to.

use crate::session::{ClTrid, Credentials};
use crate::xml::Escaped;
use crate::{Error, Result};
use chrono::NaiveDate;
use std::fmt::{self, Write as _};
use std::str::FromStr;

/// EPP base namespace.
pub const EPP_NS: &str = "urn:ietf:params:xml:ns:epp-1.0";
/// Domain object namespace (RFC 5731).
pub const DOMAIN_NS: &str = "urn:ietf:params:xml:ns:domain-1.0";
/// Contact object namespace (RFC 5733).
pub const CONTACT_NS: &str = "urn:ietf:params:xml:ns:contact-1.0";

/// Protocol version announced at login.
pub const PROTOCOL_VERSION: &str = "1.0";
/// Response language requested at login.
pub const LANGUAGE: &str = "en";

/// Registrant reference sent with `<domain:create>`.
///
/// The registry links the registrant out of band; contact details are not
/// submitted inline.
pub const REGISTRANT_PLACEHOLDER: &str = "auto";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

/// The fixed set of domain commands this client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// `<domain:check>` availability query.
    Check,
    /// `<domain:info>` lookup.
    Info,
    /// `<domain:create>` registration.
    Create,
    /// `<domain:renew>` term extension.
    Renew,
    /// `<transfer op="request">` inbound transfer.
    Transfer,
    /// `<domain:update>` adding nameservers.
    UpdateNs,
}

impl CommandKind {
    /// Every supported kind.
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Check,
        CommandKind::Info,
        CommandKind::Create,
        CommandKind::Renew,
        CommandKind::Transfer,
        CommandKind::UpdateNs,
    ];

    /// Short tag, also used as the clTRID prefix.
    pub fn tag(self) -> &'static str {
        match self {
            CommandKind::Check => "check",
            CommandKind::Info => "info",
            CommandKind::Create => "create",
            CommandKind::Renew => "renew",
            CommandKind::Transfer => "transfer",
            CommandKind::UpdateNs => "update_ns",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| Error::UnsupportedOperation(format!("unknown EPP command: {s}")))
    }
}

/// Registrant contact fields read from the host's contact record.
///
/// Carried with create requests; the current command template references the
/// registrant through [`REGISTRANT_PLACEHOLDER`] instead of sending these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registrant {
    /// Full name.
    pub name: String,
    /// Organisation, if any.
    pub org: Option<String>,
    /// Email address.
    pub email: String,
    /// First address line.
    pub address: String,
    /// City.
    pub city: String,
    /// Postal code.
    pub postcode: String,
    /// ISO 3166 country code.
    pub country: String,
    /// Phone as `<country code>.<number>`.
    pub phone: String,
}

/// Operation-specific request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandParams {
    /// Registration or renewal period in years.
    pub period: Option<u32>,
    /// Nameserver host names, in the order they should be sent.
    pub nameservers: Vec<String>,
    /// Auth-info password for transfers.
    pub auth_code: Option<String>,
    /// Current expiry date, required by renew.
    pub cur_exp_date: Option<NaiveDate>,
    /// Registrant details for create.
    pub registrant: Option<Registrant>,
}

impl CommandParams {
    /// Empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the period in years.
    #[must_use]
    pub fn period(mut self, years: u32) -> Self {
        self.period = Some(years);
        self
    }

    /// Sets the nameserver list.
    #[must_use]
    pub fn nameservers<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nameservers = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the transfer auth code.
    #[must_use]
    pub fn auth_code(mut self, code: impl Into<String>) -> Self {
        self.auth_code = Some(code.into());
        self
    }

    /// Sets the current expiry date for renew.
    #[must_use]
    pub fn cur_exp_date(mut self, date: NaiveDate) -> Self {
        self.cur_exp_date = Some(date);
        self
    }

    /// Sets registrant details for create.
    #[must_use]
    pub fn registrant(mut self, registrant: Registrant) -> Self {
        self.registrant = Some(registrant);
        self
    }
}

/// Builds the XML for one domain command.
///
/// # Errors
///
/// Returns `Error::InvalidRequest` when a parameter the command needs is
/// missing (renew without expiry date, transfer without auth code, nameserver
/// update with no hosts).
pub fn build_command(
    kind: CommandKind,
    domain: &str,
    params: &CommandParams,
    cl_trid: &ClTrid,
) -> Result<String> {
    let name = Escaped(domain);
    let body = match kind {
        CommandKind::Check => format!(
            "    <check>\n      <domain:check xmlns:domain=\"{DOMAIN_NS}\">\n        \
             <domain:name>{name}</domain:name>\n      </domain:check>\n    </check>\n"
        ),
        CommandKind::Info => format!(
            "    <info>\n      <domain:info xmlns:domain=\"{DOMAIN_NS}\">\n        \
             <domain:name>{name}</domain:name>\n      </domain:info>\n    </info>\n"
        ),
        CommandKind::Create => {
            let period = params.period.unwrap_or(1);
            let ns = host_objects(&params.nameservers);
            format!(
                "    <create>\n      <domain:create xmlns:domain=\"{DOMAIN_NS}\">\n        \
                 <domain:name>{name}</domain:name>\n        \
                 <domain:period unit=\"y\">{period}</domain:period>\n        \
                 <domain:ns>{ns}</domain:ns>\n        \
                 <domain:registrant>{REGISTRANT_PLACEHOLDER}</domain:registrant>\n      \
                 </domain:create>\n    </create>\n"
            )
        }
        CommandKind::Renew => {
            let cur_exp = params.cur_exp_date.ok_or_else(|| {
                Error::InvalidRequest("renew requires the current expiry date".into())
            })?;
            let period = params.period.unwrap_or(1);
            format!(
                "    <renew>\n      <domain:renew xmlns:domain=\"{DOMAIN_NS}\">\n        \
                 <domain:name>{name}</domain:name>\n        \
                 <domain:curExpDate>{}</domain:curExpDate>\n        \
                 <domain:period unit=\"y\">{period}</domain:period>\n      \
                 </domain:renew>\n    </renew>\n",
                cur_exp.format("%Y-%m-%d")
            )
        }
        CommandKind::Transfer => {
            let auth_code = params
                .auth_code
                .as_deref()
                .ok_or_else(|| Error::InvalidRequest("transfer requires an auth code".into()))?;
            format!(
                "    <transfer op=\"request\">\n      \
                 <domain:transfer xmlns:domain=\"{DOMAIN_NS}\">\n        \
                 <domain:name>{name}</domain:name>\n        <domain:authInfo>\n          \
                 <domain:pw>{}</domain:pw>\n        </domain:authInfo>\n      \
                 </domain:transfer>\n    </transfer>\n",
                Escaped(auth_code)
            )
        }
        CommandKind::UpdateNs => {
            if params.nameservers.is_empty() {
                return Err(Error::InvalidRequest(
                    "At least one nameserver is required".into(),
                ));
            }
            let ns = host_objects(&params.nameservers);
            format!(
                "    <update>\n      <domain:update xmlns:domain=\"{DOMAIN_NS}\">\n        \
                 <domain:name>{name}</domain:name>\n        <domain:add>\n          \
                 <domain:ns>{ns}</domain:ns>\n        </domain:add>\n      \
                 </domain:update>\n    </update>\n"
            )
        }
    };

    Ok(envelope(&body, cl_trid))
}

/// Builds the `<login>` command.
pub fn build_login(credentials: &Credentials, cl_trid: &ClTrid) -> String {
    let body = format!(
        "    <login>\n      <clID>{}</clID>\n      <pw>{}</pw>\n      <options>\n        \
         <version>{PROTOCOL_VERSION}</version>\n        <lang>{LANGUAGE}</lang>\n      \
         </options>\n      <svcs>\n        <objURI>{DOMAIN_NS}</objURI>\n        \
         <objURI>{CONTACT_NS}</objURI>\n      </svcs>\n    </login>\n",
        Escaped(credentials.client_id()),
        Escaped(credentials.password()),
    );
    envelope(&body, cl_trid)
}

/// Builds the `<logout>` command.
pub fn build_logout(cl_trid: &ClTrid) -> String {
    envelope("    <logout/>\n", cl_trid)
}

fn envelope(body: &str, cl_trid: &ClTrid) -> String {
    format!(
        "{XML_DECL}\n<epp xmlns=\"{EPP_NS}\">\n  <command>\n{body}    \
         <clTRID>{}</clTRID>\n  </command>\n</epp>",
        Escaped(cl_trid.as_str())
    )
}

fn host_objects(hosts: &[String]) -> String {
    let mut out = String::new();
    for host in hosts {
        // Writing into a String cannot fail.
        let _ = write!(out, "<domain:hostObj>{}</domain:hostObj>", Escaped(host));
    }
    out
}
