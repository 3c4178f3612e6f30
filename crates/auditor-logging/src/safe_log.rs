//! The safety pass applied to every log record before it leaves the process
//! (§4.3): forbidden fields are dropped entirely, long fields are truncated,
//! and whatever remains is run through the PII redactor.

use auditor_redaction::redact_value;
use serde_json::{Map, Value};

/// Fields that are never logged, no matter what calls into [`sanitize_data`].
/// These typically carry raw document content that must never reach disk.
pub static FORBIDDEN_FIELDS: &[&str] = &[
    "markdown",
    "rawText",
    "ocrText",
    "extractedText",
    "documentContent",
    "pageContent",
    "base64",
    "base64Data",
    "documentData",
];

/// Fields whose string values are truncated rather than dropped, since they
/// are useful for debugging but can be unbounded (LLM prompts/responses).
pub static TRUNCATED_FIELDS: &[&str] = &["prompt", "response", "error", "errorText"];

const TRUNCATION_LIMIT: usize = 500;

fn truncate_field_value(value: &str) -> String {
    if value.chars().count() <= TRUNCATION_LIMIT {
        return value.to_string();
    }
    let total = value.chars().count();
    let head: String = value.chars().take(TRUNCATION_LIMIT).collect();
    format!("{head}[truncated, {total} chars total]")
}

/// Apply the forbidden-field filter, long-field truncation, and PII
/// redaction to a structured log `data` payload, in that order.
///
/// Only top-level keys are checked against [`FORBIDDEN_FIELDS`] and
/// [`TRUNCATED_FIELDS`]; nested redaction by field name is handled
/// recursively by [`redact_value`].
#[must_use]
pub fn sanitize_data(data: &Value) -> Value {
    let Value::Object(map) = data else {
        return redact_value(data);
    };

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        if FORBIDDEN_FIELDS.contains(&key.as_str()) {
            continue;
        }
        let truncated = if TRUNCATED_FIELDS.contains(&key.as_str()) {
            match value {
                Value::String(s) => Value::String(truncate_field_value(s)),
                other => other.clone(),
            }
        } else {
            value.clone()
        };
        out.insert(key.clone(), redact_value(&truncated));
    }
    Value::Object(out)
}

/// Test helper (§4.3): assert that `data`, once sanitized, contains none of
/// the forbidden fields and no occurrence of any raw secret substrings
/// supplied by the caller.
#[must_use]
pub fn check_logging_safety(data: &Value, must_not_contain: &[&str]) -> Vec<String> {
    let sanitized = sanitize_data(data);
    let serialized = sanitized.to_string();
    let mut violations = Vec::new();

    for forbidden in FORBIDDEN_FIELDS {
        if let Value::Object(map) = &sanitized {
            if map.contains_key(*forbidden) {
                violations.push(format!("forbidden field leaked: {forbidden}"));
            }
        }
    }

    for needle in must_not_contain {
        if !needle.is_empty() && serialized.contains(needle) {
            violations.push(format!("raw value leaked: {needle}"));
        }
    }

    violations
}
