//! Domain and contact records.
//!
//! These are the host application's view of a domain. Operations read
//! request data from them and write registry answers back into them.

use chrono::{DateTime, Utc};
use epp_core::response::MAX_NAMESERVERS;
use epp_core::Registrant;
use serde::{Deserialize, Serialize};

/// A domain record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Fully qualified name, such as `example.co.uk`.
    pub name: String,
    /// First nameserver.
    #[serde(default)]
    pub ns1: Option<String>,
    /// Second nameserver.
    #[serde(default)]
    pub ns2: Option<String>,
    /// Third nameserver.
    #[serde(default)]
    pub ns3: Option<String>,
    /// Fourth nameserver.
    #[serde(default)]
    pub ns4: Option<String>,
    /// When the registry created the domain.
    #[serde(default)]
    pub registration_time: Option<DateTime<Utc>>,
    /// When the registration expires.
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
    /// Auth-info (EPP) code.
    #[serde(default)]
    pub epp_code: Option<String>,
    /// Registration or renewal period in years.
    #[serde(default)]
    pub registration_period: Option<u32>,
    /// Registrant contact.
    #[serde(default)]
    pub contact_registrant: Option<Contact>,
}

impl Domain {
    /// Creates a record with only a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets nameserver slots in order. Hosts past the fourth are ignored.
    #[must_use]
    pub fn with_nameservers<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let hosts: Vec<String> = hosts.into_iter().map(Into::into).collect();
        self.fill_nameservers(&hosts);
        self
    }

    /// Sets the registration period.
    #[must_use]
    pub fn with_period(mut self, years: u32) -> Self {
        self.registration_period = Some(years);
        self
    }

    /// Sets the expiry time.
    #[must_use]
    pub fn with_expiration(mut self, at: DateTime<Utc>) -> Self {
        self.expiration_time = Some(at);
        self
    }

    /// Sets the auth-info code.
    #[must_use]
    pub fn with_epp_code(mut self, code: impl Into<String>) -> Self {
        self.epp_code = Some(code.into());
        self
    }

    /// Sets the registrant contact.
    #[must_use]
    pub fn with_registrant(mut self, contact: Contact) -> Self {
        self.contact_registrant = Some(contact);
        self
    }

    /// Non-empty nameservers in slot order.
    pub fn nameservers(&self) -> Vec<String> {
        [&self.ns1, &self.ns2, &self.ns3, &self.ns4]
            .into_iter()
            .flatten()
            .filter(|ns| !ns.trim().is_empty())
            .cloned()
            .collect()
    }

    /// Writes `hosts` into ns1..ns4 in order.
    ///
    /// Slots beyond the supplied hosts keep their previous value.
    pub fn fill_nameservers(&mut self, hosts: &[String]) {
        let slots = [&mut self.ns1, &mut self.ns2, &mut self.ns3, &mut self.ns4];
        for (slot, host) in slots.into_iter().zip(hosts.iter().take(MAX_NAMESERVERS)) {
            *slot = Some(host.clone());
        }
    }
}

/// A contact record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Email address.
    pub email: String,
    /// Organisation.
    #[serde(default)]
    pub company: Option<String>,
    /// First address line.
    pub address1: String,
    /// Second address line.
    #[serde(default)]
    pub address2: Option<String>,
    /// City.
    pub city: String,
    /// County or state.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code.
    pub zip: String,
    /// ISO 3166 country code.
    pub country: String,
    /// Dialling code, such as `44`.
    #[serde(default)]
    pub tel_cc: Option<String>,
    /// Phone number.
    pub tel: String,
}

impl Contact {
    /// `first last`, skipping empty parts.
    pub fn full_name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Phone as `<cc>.<number>`, or the bare number without a dialling code.
    pub fn phone(&self) -> String {
        match self.tel_cc.as_deref().map(str::trim) {
            Some(cc) if !cc.is_empty() => format!("{cc}.{}", self.tel.trim()),
            _ => self.tel.trim().to_string(),
        }
    }
}

impl From<&Contact> for Registrant {
    fn from(contact: &Contact) -> Self {
        Registrant {
            name: contact.full_name(),
            org: contact.company.clone().filter(|c| !c.trim().is_empty()),
            email: contact.email.clone(),
            address: contact.address1.clone(),
            city: contact.city.clone(),
            postcode: contact.zip.clone(),
            country: contact.country.clone(),
            phone: contact.phone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> Contact {
        Contact {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.co.uk".into(),
            company: Some(String::new()),
            address1: "1 Analytical Way".into(),
            city: "London".into(),
            zip: "N1 1AA".into(),
            country: "GB".into(),
            tel_cc: Some("44".into()),
            tel: "2071234567".into(),
            ..Contact::default()
        }
    }

    #[test]
    fn test_nameservers_skip_empty_slots() {
        let domain = Domain {
            ns1: Some("ns1.example.com".into()),
            ns2: None,
            ns3: Some(" ".into()),
            ns4: Some("ns4.example.com".into()),
            ..Domain::new("example.co.uk")
        };
        assert_eq!(domain.nameservers(), vec!["ns1.example.com", "ns4.example.com"]);
    }

    #[test]
    fn test_fill_nameservers_caps_and_keeps_rest() {
        let mut domain = Domain::new("example.co.uk").with_nameservers(["a", "b", "c", "d", "e"]);
        assert_eq!(domain.nameservers(), vec!["a", "b", "c", "d"]);

        domain.fill_nameservers(&["x".to_string()]);
        assert_eq!(domain.ns1.as_deref(), Some("x"));
        assert_eq!(domain.ns2.as_deref(), Some("b"));
    }

    #[test]
    fn test_registrant_from_contact() {
        let registrant = Registrant::from(&contact());
        assert_eq!(registrant.name, "Ada Lovelace");
        assert_eq!(registrant.org, None);
        assert_eq!(registrant.phone, "44.2071234567");
        assert_eq!(registrant.postcode, "N1 1AA");
    }

    #[test]
    fn test_phone_without_dialling_code() {
        let contact = Contact {
            tel_cc: None,
            ..contact()
        };
        assert_eq!(contact.phone(), "2071234567");

        let contact = Contact {
            tel_cc: Some(" ".into()),
            ..contact
        };
        assert_eq!(contact.phone(), "2071234567");
    }

    #[test]
    fn test_serde_round_trip() {
        let domain = Domain::new("example.co.uk")
            .with_period(2)
            .with_registrant(contact());
        let json = serde_json::to_string(&domain).unwrap();
        let back: Domain = serde_json::from_str(&json).unwrap();
        assert_eq!(back, domain);

        let minimal: Domain = serde_json::from_str(r#"{"name": "example.co.uk"}"#).unwrap();
        assert_eq!(minimal, Domain::new("example.co.uk"));
    }
}
