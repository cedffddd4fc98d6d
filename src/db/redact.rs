//! Masking of credentials in command text before it is stored.
//!
//! Three pattern classes run in a fixed order, each exactly once over the
//! whole input: password flags, `key=value` assignments, and passwords in a
//! URL authority. Within a class the quoted forms are tried before the bare
//! form so a quoted value containing spaces is masked as a whole.

use regex::Regex;
use std::sync::LazyLock;

/// Replacement for every masked value.
pub const MASK: &str = "****";

static PASSWORD_FLAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\B(-p|--password|--pass|--pwd)\s+(?:"[^"]*"|'[^']*'|\S+)"#)
        .expect("password flag pattern")
});

static KEY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(NEO4J_PASSWORD|DB_PASSWORD|POSTGRES_PASSWORD|password|pwd|pass|token|api_key|apikey|secret)=(?:"[^"]*"|'[^']*'|\S+)"#,
    )
    .expect("key=value pattern")
});

static URL_CREDENTIALS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(://[^:/@\s]+:)([^@\s]+)(@)").expect("url credentials pattern")
});

/// Returns `command` with credential values replaced by [`MASK`] and trailing
/// whitespace removed. Flags, keys, URL users and hosts are kept.
pub fn redact_secrets(command: &str) -> String {
    let masked = PASSWORD_FLAG_RE.replace_all(command, format!("${{1}} {MASK}"));
    let masked = KEY_VALUE_RE.replace_all(&masked, format!("${{1}}={MASK}"));
    let masked = URL_CREDENTIALS_RE.replace_all(&masked, format!("${{1}}{MASK}${{3}}"));
    masked.trim_end().to_string()
}
