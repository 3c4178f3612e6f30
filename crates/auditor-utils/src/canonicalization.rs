//! Deterministic JSON emission for artifacts.
//!
//! All on-disk artifacts are emitted as JCS-canonical JSON (RFC 8785) so that
//! re-serializing the same logical value always produces byte-identical
//! output, independent of in-memory struct field order.

use serde::Serialize;

use crate::error::AuditError;

/// Serialize `value` as JCS-canonical JSON text.
pub fn emit_jcs<T: Serialize>(value: &T) -> Result<String, AuditError> {
    let json_value = serde_json::to_value(value)
        .map_err(|e| AuditError::Contract {
            upstream: "canonicalization".into(),
            reason: e.to_string(),
        })?;
    let bytes = serde_json_canonicalizer::to_vec(&json_value).map_err(|e| AuditError::Contract {
        upstream: "canonicalization".into(),
        reason: e.to_string(),
    })?;
    String::from_utf8(bytes).map_err(|e| AuditError::Contract {
        upstream: "canonicalization".into(),
        reason: e.to_string(),
    })
}
