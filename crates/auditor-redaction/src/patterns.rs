//! Canonical PII pattern definitions (§4.2), applied in a fixed order so that
//! redaction is deterministic regardless of pattern evaluation order.

/// A single named PII pattern: an id for diagnostics/tests and the regex text.
#[derive(Debug, Clone, Copy)]
pub struct PiiPatternDef {
    pub id: &'static str,
    pub regex: &'static str,
}

/// Patterns in the fixed order required by §4.2: email, generic phone,
/// regional phone, SSN, national insurance, credit card, IPv4, date of
/// birth, bank account, titled name.
pub static DEFAULT_PII_PATTERNS: &[PiiPatternDef] = &[
    PiiPatternDef {
        id: "email",
        regex: r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}",
    },
    PiiPatternDef {
        id: "phone_generic",
        regex: r"\+?\d{1,3}[-.\s]?\(?\d{2,4}\)?[-.\s]?\d{3,4}[-.\s]?\d{3,4}",
    },
    PiiPatternDef {
        id: "phone_uk",
        regex: r"\b0\d{2,4}[-.\s]?\d{3,4}[-.\s]?\d{3,4}\b",
    },
    PiiPatternDef {
        id: "ssn",
        regex: r"\b\d{3}-\d{2}-\d{4}\b",
    },
    PiiPatternDef {
        id: "national_insurance",
        regex: r"(?i)\b[A-CEGHJ-PR-TW-Z]{2}\d{6}[A-D]\b",
    },
    PiiPatternDef {
        id: "credit_card",
        regex: r"\b\d{4}[- ]\d{4}[- ]\d{4}[- ]\d{4}\b",
    },
    PiiPatternDef {
        id: "ipv4",
        regex: r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b",
    },
    PiiPatternDef {
        id: "date_of_birth",
        regex: r"\b(0[1-9]|[12]\d|3[01])[/-](0[1-9]|1[0-2])[/-](19|20)\d{2}\b",
    },
    PiiPatternDef {
        id: "bank_account",
        regex: r"\b\d{8,17}\b",
    },
    PiiPatternDef {
        id: "titled_name",
        regex: r"\b(?:Mr|Mrs|Ms|Miss|Dr|Prof)\.?\s+[A-Z][a-zA-Z'-]+(?:\s+[A-Z][a-zA-Z'-]+)?\b",
    },
];

/// Substrings that, when contained in a normalized (lowercased, `_`-joined)
/// field name, mark that field's *entire value* as sensitive regardless of
/// content.
pub static SENSITIVE_FIELD_NAME_SUBSTRINGS: &[&str] = &[
    "password",
    "secret",
    "token",
    "apikey",
    "authorization",
    "credential",
    "private_key",
    "ssn",
    "credit_card",
    "cvv",
    "pin",
    "dob",
    "nino",
];

/// Normalize a field name for matching: lowercase, strip non-alphanumerics to `_`.
#[must_use]
pub fn normalize_field_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
    out
}

/// Whether `field_name` should have its entire value replaced by `[REDACTED]`.
#[must_use]
pub fn is_sensitive_field_name(field_name: &str) -> bool {
    let normalized = normalize_field_name(field_name);
    SENSITIVE_FIELD_NAME_SUBSTRINGS
        .iter()
        .any(|s| normalized.contains(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_case_and_punctuation() {
        assert_eq!(normalize_field_name("Credit-Card#"), "credit_card_");
    }

    #[test]
    fn detects_sensitive_field_names() {
        assert!(is_sensitive_field_name("customer_ssn"));
        assert!(is_sensitive_field_name("API_KEY"));
        assert!(!is_sensitive_field_name("customer_name"));
    }

    #[test]
    fn default_patterns_compile() {
        for def in DEFAULT_PII_PATTERNS {
            regex::Regex::new(def.regex).unwrap_or_else(|e| {
                panic!("pattern {} failed to compile: {e}", def.id);
            });
        }
    }
}
