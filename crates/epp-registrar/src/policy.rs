//! Operations the registry does not offer over EPP.
//!
//! These fail immediately; no connection is opened.

use thiserror::Error;

/// A refused operation. The message is shown to end users as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum PolicyRefusal {
    /// Domains cannot be deleted; they lapse at expiry.
    #[error("Domain deletion is not supported by Nominet. Domains must be allowed to expire.")]
    Delete,

    /// Contact changes go through the registry's own web services.
    #[error("Contact modification must be done through Nominet's online services.")]
    ModifyContact,

    /// No WHOIS privacy service exists for the namespace.
    #[error("Privacy protection is not available for .uk domains")]
    EnablePrivacy,

    /// No WHOIS privacy service exists for the namespace.
    #[error("Privacy protection is not available for .uk domains")]
    DisablePrivacy,

    /// Locks are applied by the registry.
    #[error("Domain locking is managed automatically by Nominet")]
    Lock,

    /// Locks are removed by the registry.
    #[error("Domain unlocking is managed automatically by Nominet")]
    Unlock,
}

impl PolicyRefusal {
    /// Every refusal.
    pub const ALL: [PolicyRefusal; 6] = [
        PolicyRefusal::Delete,
        PolicyRefusal::ModifyContact,
        PolicyRefusal::EnablePrivacy,
        PolicyRefusal::DisablePrivacy,
        PolicyRefusal::Lock,
        PolicyRefusal::Unlock,
    ];

    /// Operation name used in logs.
    pub fn operation(self) -> &'static str {
        match self {
            PolicyRefusal::Delete => "delete_domain",
            PolicyRefusal::ModifyContact => "modify_contact",
            PolicyRefusal::EnablePrivacy => "enable_privacy",
            PolicyRefusal::DisablePrivacy => "disable_privacy",
            PolicyRefusal::Lock => "lock",
            PolicyRefusal::Unlock => "unlock",
        }
    }
}
