//! Escaping conformance for every command kind.
//!
//! Any string that reaches the wire must be well-formed XML text: the five
//! metacharacters may only appear as entities.

use epp_core::command::{build_command, build_login, CommandKind, CommandParams};
use epp_core::session::{ClTrid, Credentials};
use epp_core::{response, xml};

const HOSTILE: &[&str] = &[
    "plain.co.uk",
    "a&b.co.uk",
    "<script>.co.uk",
    "quote\"d.co.uk",
    "apos'd.co.uk",
    "]]><domain:name>injected</domain:name><![CDATA[",
    "&amp;already-escaped",
    "mixed&<>\"'all",
];

/// Strips the markup the builder itself emits and checks the remaining
/// character data holds no raw metacharacters.
fn assert_text_is_escaped(document: &str) {
    let mut in_tag = false;
    let mut in_quote = false;
    let mut text = String::new();
    for ch in document.chars() {
        match ch {
            '<' if !in_tag => in_tag = true,
            '>' if in_tag && !in_quote => in_tag = false,
            '"' if in_tag => in_quote = !in_quote,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    for raw in ['<', '>', '"', '\''] {
        assert!(!text.contains(raw), "raw {raw:?} in character data: {text}");
    }
    // Every ampersand must start a known entity.
    for (idx, _) in text.match_indices('&') {
        let rest = &text[idx..];
        assert!(
            ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"]
                .iter()
                .any(|e| rest.starts_with(e)),
            "bare ampersand in: {rest}"
        );
    }
}

#[test]
fn test_all_commands_escape_domain_names() {
    let params = CommandParams::new()
        .period(1)
        .nameservers(["ns1.example.com"])
        .auth_code("code")
        .cur_exp_date(chrono::NaiveDate::from_ymd_opt(2030, 6, 1).unwrap());

    for kind in CommandKind::ALL {
        for name in HOSTILE {
            let xml = build_command(kind, name, &params, &ClTrid::new(kind.tag(), 0, 1)).unwrap();
            assert_text_is_escaped(&xml);
            assert_eq!(xml.matches("<domain:name>").count(), 1, "{kind}: {name}");
        }
    }
}

#[test]
fn test_nameservers_and_auth_code_escaped() {
    for value in HOSTILE {
        let params = CommandParams::new()
            .nameservers([*value, "ns2.example.com"])
            .auth_code(*value);

        for kind in [CommandKind::Create, CommandKind::UpdateNs, CommandKind::Transfer] {
            let xml = build_command(kind, "example.co.uk", &params, &ClTrid::new("t", 0, 1))
                .unwrap();
            assert_text_is_escaped(&xml);
        }
    }
}

#[test]
fn test_escaped_nameservers_read_back_verbatim() {
    let params = CommandParams::new().nameservers(["a&b.example", "c<d.example"]);
    let xml = build_command(
        CommandKind::Create,
        "example.co.uk",
        &params,
        &ClTrid::new("create", 0, 1),
    )
    .unwrap();

    assert_eq!(
        response::nameservers(&xml),
        vec!["a&b.example".to_string(), "c<d.example".to_string()]
    );
}

#[test]
fn test_login_credentials_escaped() {
    for value in HOSTILE {
        let xml = build_login(&Credentials::new(*value, *value, false), &ClTrid::new("login", 0, 1));
        assert_text_is_escaped(&xml);
        assert!(xml.contains(&format!("<clID>{}</clID>", xml::escape(value))));
    }
}
