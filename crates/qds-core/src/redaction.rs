//! Redaction of secrets before payloads reach the logs

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const MASK: &str = "***";

static TOKEN_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static PASSWORD_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
static CLOUD_KEY_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

fn token_regex() -> Option<&'static Regex> {
    TOKEN_REGEX
        .get_or_init(|| {
            Regex::new(r#"(?i)(x-auth-token|api[_-]?token|auth[_-]?token|token)[=:\s]+['"]?([a-zA-Z0-9_.-]{8,})['"]?"#)
                .ok()
        })
        .as_ref()
}

fn password_regex() -> Option<&'static Regex> {
    PASSWORD_REGEX
        .get_or_init(|| Regex::new(r#"(?i)(password|passwd|pwd)[=:\s]+['"]?([^\s'"]{3,})['"]?"#).ok())
        .as_ref()
}

fn cloud_key_regex() -> Option<&'static Regex> {
    CLOUD_KEY_REGEX
        .get_or_init(|| {
            Regex::new(r#"(?i)(access[_-]?key|secret[_-]?key|storage[_-]?access[_-]?key)[=:\s]+['"]?([a-zA-Z0-9/+=_-]{8,})['"]?"#)
                .ok()
        })
        .as_ref()
}

/// Mask credentials embedded in free text (`token=...`, `password: ...`)
pub fn redact_sensitive(input: &str) -> String {
    let mut result = input.to_string();

    for regex in [token_regex(), password_regex(), cloud_key_regex()]
        .into_iter()
        .flatten()
    {
        result = regex.replace_all(&result, "$1=***").to_string();
    }

    result
}

/// Mask sensitive fields of a JSON payload in place
pub fn redact_json_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if is_sensitive_key(key) {
                    *val = Value::String(MASK.to_string());
                } else {
                    redact_json_value(val);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_json_value(item);
            }
        }
        Value::String(s) => {
            *s = redact_sensitive(s);
        }
        _ => {}
    }
}

/// Field names that hold credentials in QDS payloads
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    key.contains("token")
        || key.contains("password")
        || key.contains("passwd")
        || key.contains("secret")
        || key.contains("access_key")
        || key == "api_key"
        || key == "storage_access_key"
}
