//! Response interpretation.
//!
//! Fields are pulled out with targeted patterns against the well-known
//! element names instead of schema validation, so responses that carry extra
//! elements or extensions are still read. Singular fields take the first
//! match; nameservers take every match in document order.

use crate::xml::unescape;
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

/// Nameserver slots available on a domain record.
pub const MAX_NAMESERVERS: usize = 4;

static RESULT_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(?:epp:)?result\s+code="(\d{4})""#).expect("invalid result code pattern")
});

static RESULT_MSG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(?:epp:)?msg(?:\s[^>]*)?>([^<]*)</(?:epp:)?msg>")
        .expect("invalid result message pattern")
});

static AVAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<domain:name\s[^>]*?\bavail="([^"]*)""#).expect("invalid avail pattern")
});

static CR_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<domain:crDate>([^<]+)</domain:crDate>").expect("invalid crDate pattern")
});

static EX_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<domain:exDate>([^<]+)</domain:exDate>").expect("invalid exDate pattern")
});

static HOST_OBJ: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<domain:hostObj>([^<]+)</domain:hostObj>").expect("invalid hostObj pattern")
});

static AUTH_PW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<domain:authInfo>.*?<domain:pw(?:\s[^>]*)?>([^<]+)</domain:pw>")
        .expect("invalid authInfo pattern")
});

static DOMAIN_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<domain:name>[^<]+</domain:name>").expect("invalid name pattern"));

/// EPP result code (RFC 5730 §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(u16);

impl ResultCode {
    /// "Command completed successfully".
    pub const SUCCESS: ResultCode = ResultCode(1000);
    /// "Command completed successfully; action pending".
    pub const SUCCESS_PENDING: ResultCode = ResultCode(1001);
    /// "Command completed successfully; ending session".
    pub const SUCCESS_ENDING_SESSION: ResultCode = ResultCode(1500);
    /// "Authentication error".
    pub const AUTHENTICATION_ERROR: ResultCode = ResultCode(2200);
    /// "Object does not exist".
    pub const OBJECT_DOES_NOT_EXIST: ResultCode = ResultCode(2303);

    /// Wraps a raw code.
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Numeric value.
    pub const fn value(self) -> u16 {
        self.0
    }

    /// 1xxx codes report success.
    pub const fn is_success(self) -> bool {
        self.0 >= 1000 && self.0 < 2000
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sparse set of fields found in one response.
///
/// `None` means the element was not present, which is not an error here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedResult {
    /// `avail` flag from a check response.
    pub availability: Option<bool>,
    /// `domain:crDate`.
    pub created: Option<DateTime<Utc>>,
    /// `domain:exDate`.
    pub expires: Option<DateTime<Utc>>,
    /// `domain:hostObj` values, at most [`MAX_NAMESERVERS`].
    pub nameservers: Vec<String>,
    /// `domain:pw` under `domain:authInfo`.
    pub auth_info: Option<String>,
    /// `result code`.
    pub result_code: Option<ResultCode>,
    /// First `<msg>` text.
    pub message: Option<String>,
    /// Whether info data named the domain.
    pub has_domain_name: bool,
}

/// Extracts every known field.
///
/// # Errors
///
/// Returns `Error::Interpretation` if a date is present but unreadable or an
/// `avail` attribute holds something other than a boolean.
pub fn interpret(xml: &str) -> Result<ParsedResult> {
    let availability = match first_capture(&AVAIL, xml) {
        Some(raw) => Some(parse_avail(&raw)?),
        None => None,
    };

    Ok(ParsedResult {
        availability,
        created: creation_date(xml)?,
        expires: expiry_date(xml)?,
        nameservers: nameservers(xml),
        auth_info: first_capture(&AUTH_PW, xml),
        result_code: result_code(xml),
        message: result_message(xml),
        has_domain_name: has_domain_name(xml),
    })
}

/// First result code in the response.
pub fn result_code(xml: &str) -> Option<ResultCode> {
    RESULT_CODE
        .captures(xml)
        .and_then(|c| c[1].parse().ok())
        .map(ResultCode)
}

/// First `<msg>` text in the response.
pub fn result_message(xml: &str) -> Option<String> {
    first_capture(&RESULT_MSG, xml).filter(|m| !m.trim().is_empty())
}

/// Availability from a check response.
///
/// # Errors
///
/// Returns `Error::Interpretation` if there is no `avail` attribute or its
/// value is not a boolean.
pub fn availability(xml: &str) -> Result<bool> {
    let raw = first_capture(&AVAIL, xml).ok_or_else(|| {
        Error::Interpretation("Unable to determine domain availability".into())
    })?;
    parse_avail(&raw)
}

/// Creation date, if present.
pub fn creation_date(xml: &str) -> Result<Option<DateTime<Utc>>> {
    first_capture(&CR_DATE, xml)
        .map(|raw| parse_timestamp(&raw))
        .transpose()
}

/// Expiry date, if present.
pub fn expiry_date(xml: &str) -> Result<Option<DateTime<Utc>>> {
    first_capture(&EX_DATE, xml)
        .map(|raw| parse_timestamp(&raw))
        .transpose()
}

/// Nameserver host names in document order, capped at [`MAX_NAMESERVERS`].
pub fn nameservers(xml: &str) -> Vec<String> {
    HOST_OBJ
        .captures_iter(xml)
        .take(MAX_NAMESERVERS)
        .map(|c| unescape(c[1].trim()).into_owned())
        .collect()
}

/// Auth-info password, for callers that need it.
///
/// # Errors
///
/// Returns `Error::Interpretation` if the response has no auth-info password.
pub fn auth_info(xml: &str) -> Result<String> {
    first_capture(&AUTH_PW, xml)
        .ok_or_else(|| Error::Interpretation("EPP code not found".into()))
}

/// Whether the response contains a `<domain:name>` element with text.
pub fn has_domain_name(xml: &str) -> bool {
    DOMAIN_NAME.is_match(xml)
}

fn first_capture(re: &Regex, xml: &str) -> Option<String> {
    re.captures(xml)
        .map(|c| unescape(c[1].trim()).into_owned())
}

fn parse_avail(raw: &str) -> Result<bool> {
    match raw {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(Error::Interpretation(format!(
            "unrecognised avail value: {other:?}"
        ))),
    }
}

/// Parses the timestamp forms registries emit: RFC 3339, ISO date-time with
/// no offset (taken as UTC), and bare dates (midnight UTC).
fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(naive.and_utc());
    }
    Err(Error::Interpretation(format!("unparsable date: {raw:?}")))
}
