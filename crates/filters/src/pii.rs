//! Redaction of personally identifiable information

use regex::Regex;
use std::sync::OnceLock;

/// Replacement for email addresses
pub const EMAIL_SENTINEL: &str = "|||EMAIL|||";
/// Replacement for IPv4 addresses
pub const IP_SENTINEL: &str = "|||IP|||";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
static IPV4_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._-]+@[A-Za-z0-9._-]+\.[A-Za-z]{2,}")
            .expect("Failed to compile email regex")
    })
}

fn get_ipv4_regex() -> &'static Regex {
    IPV4_REGEX.get_or_init(|| {
        Regex::new(r"\b(?:\d{1,3}\.){3}\d{1,3}\b").expect("Failed to compile IPv4 regex")
    })
}

/// Mask email and IPv4 addresses in `text`.
///
/// Best effort: only the shapes matched by the two patterns are redacted.
/// Sentinels never match either pattern, so masking is idempotent.
pub fn mask_pii(text: &str) -> String {
    let masked = get_email_regex().replace_all(text, EMAIL_SENTINEL);
    get_ipv4_regex()
        .replace_all(&masked, IP_SENTINEL)
        .into_owned()
}

/// True if `text` still contains something shaped like an email or IPv4 address
pub fn contains_pii(text: &str) -> bool {
    get_email_regex().is_match(text) || get_ipv4_regex().is_match(text)
}
