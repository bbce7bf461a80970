//! Secret redaction for logs and `DESCRIBE` output.

use crate::types::{OptionMap, OptionValue};
use regex::Regex;
use std::sync::OnceLock;

/// Replacement shown in place of secret values.
pub const REDACTED: &str = "[REDACTED]";

const SECRET_MARKERS: [&str; 4] = ["api_key", "secret", "token", "password"];

/// True when an option name refers to a credential (e.g. `openai_api_key`).
///
/// `max_tokens` is a limit, not a secret.
pub fn is_secret_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    if key.ends_with("_tokens") {
        return false;
    }
    SECRET_MARKERS.iter().any(|marker| key.contains(marker))
}

/// Copy of `options` with every secret value replaced.
pub fn redact_options(options: &OptionMap) -> OptionMap {
    options
        .iter()
        .map(|(key, value)| {
            let value = if is_secret_key(key) && *value != OptionValue::Null {
                OptionValue::String(REDACTED.to_string())
            } else {
                value.clone()
            };
            (key.clone(), value)
        })
        .collect()
}

/// Masks quoted values assigned to secret-looking keys in statement text.
pub fn redact_sql(sql: &str) -> String {
    static SECRET_ASSIGNMENT: OnceLock<Regex> = OnceLock::new();
    let re = SECRET_ASSIGNMENT.get_or_init(|| {
        Regex::new(r"(?i)(\b\w*(?:api_key|secret|token|password)\w*\s*=\s*)'(?:[^']|'')*'")
            .expect("Invalid regex pattern")
    });

    re.replace_all(sql, |caps: &regex::Captures<'_>| {
        let key = caps[1].trim_end_matches(|c: char| c == '=' || c.is_whitespace());
        if is_secret_key(key) {
            format!("{}'{REDACTED}'", &caps[1])
        } else {
            caps[0].to_string()
        }
    })
    .into_owned()
}
