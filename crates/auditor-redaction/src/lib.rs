//! PII redactor (§4.2): pattern-based redaction of sensitive substrings and
//! whole sensitive-named fields. Deterministic and idempotent:
//! `redact(redact(x)) == redact(x)` for any `x`.

pub mod patterns;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use patterns::{is_sensitive_field_name, DEFAULT_PII_PATTERNS};

const REDACTED_MARKER: &str = "[REDACTED]";

static COMPILED_PATTERNS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    DEFAULT_PII_PATTERNS
        .iter()
        .map(|def| {
            (
                def.id,
                Regex::new(def.regex).unwrap_or_else(|e| {
                    panic!("failed to compile PII pattern {}: {e}", def.id);
                }),
            )
        })
        .collect()
});

/// Redact PII substrings from free text, applying each pattern in the fixed
/// order defined by [`patterns::DEFAULT_PII_PATTERNS`].
#[must_use]
pub fn redact_string(text: &str) -> String {
    let mut redacted = text.to_string();
    for (_, regex) in COMPILED_PATTERNS.iter() {
        redacted = regex.replace_all(&redacted, REDACTED_MARKER).into_owned();
    }
    redacted
}

/// Redact a `serde_json::Value`, recursing through objects and arrays.
///
/// Object values whose key matches [`is_sensitive_field_name`] are replaced
/// wholesale with `"[REDACTED]"`, regardless of their content or shape;
/// everything else is redacted structurally (strings via [`redact_string`],
/// numbers/bools passed through unchanged since they carry no PII patterns).
#[must_use]
pub fn redact_value(value: &Value) -> Value {
    redact_value_with_field(value, None)
}

fn redact_value_with_field(value: &Value, field_name: Option<&str>) -> Value {
    if let Some(name) = field_name {
        if is_sensitive_field_name(name) {
            return Value::String(REDACTED_MARKER.to_string());
        }
    }

    match value {
        Value::String(s) => Value::String(redact_string(s)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| redact_value_with_field(v, None))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                out.insert(key.clone(), redact_value_with_field(val, Some(key)));
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_email() {
        let out = redact_string("contact jane.doe@example.com for info");
        assert!(!out.contains("jane.doe@example.com"));
        assert!(out.contains(REDACTED_MARKER));
    }

    #[test]
    fn redacts_titled_name() {
        let out = redact_string("Signature: Mr. John Smith");
        assert!(!out.contains("John Smith"));
    }

    #[test]
    fn is_idempotent_on_free_text() {
        let text = "Email jane@example.com, phone 020-7946-0958, card 4111 1111 1111 1111";
        let once = redact_string(text);
        let twice = redact_string(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn sensitive_field_value_replaced_wholesale() {
        let input = json!({"customer_ssn": "123-45-6789", "name": "ACME Corp"});
        let out = redact_value(&input);
        assert_eq!(out["customer_ssn"], json!("[REDACTED]"));
        assert_eq!(out["name"], json!("ACME Corp"));
    }

    #[test]
    fn recurses_through_nested_objects_and_arrays() {
        let input = json!({
            "customer": {"password": "hunter2", "email": "a@b.com"},
            "notes": ["call a@b.com", "fine"]
        });
        let out = redact_value(&input);
        assert_eq!(out["customer"]["password"], json!("[REDACTED]"));
        assert!(!out["customer"]["email"].as_str().unwrap().contains("a@b.com"));
        assert!(!out["notes"][0].as_str().unwrap().contains("a@b.com"));
        assert_eq!(out["notes"][1], json!("fine"));
    }

    #[test]
    fn redact_value_is_idempotent() {
        let input = json!({"customer_ssn": "123-45-6789", "email": "a@b.com"});
        let once = redact_value(&input);
        let twice = redact_value(&once);
        assert_eq!(once, twice);
    }

    proptest::proptest! {
        #[test]
        fn redact_string_is_idempotent_for_arbitrary_text(text in ".{0,200}") {
            let once = redact_string(&text);
            let twice = redact_string(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
