//! Log Redaction
//!
//! Scrubs API keys and bearer tokens from strings before they are logged
//! or shown to the user. Provider errors can echo request headers or URLs.

use once_cell::sync::Lazy;
use regex::Regex;

static API_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(sk-[a-zA-Z0-9_\-]{16,})|(Bearer\s+[a-zA-Z0-9\-\._~+/]+=*)").unwrap()
});
static KEY_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)((?:api_?key|token)=)[^&\s]+").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = API_KEY_RE.replace_all(input, "[REDACTED_TOKEN]");
    KEY_PARAM_RE
        .replace_all(&redacted, "${1}[REDACTED_TOKEN]")
        .into_owned()
}
