//! `SelectionTrace` artifact construction and persistence (§3, §4.10, §6).
//! Written on every selection, whether or not a template was selected.

use crate::tokenize::tokenize;
use crate::types::{InputSignals, SelectionResult, SelectionScore, SelectionTrace, SignalWeights};
use auditor_utils::atomic_write::write_file_atomic;
use auditor_utils::canonicalization::emit_jcs;
use auditor_utils::paths::selection_trace_path;
use auditor_utils::AuditError;
use camino::Utf8Path;

const ARTIFACT_VERSION: &str = "1.0.0";
const TOKEN_SAMPLE_LIMIT: usize = 20;

#[must_use]
pub fn build_trace(
    document_text: &str,
    document_id: &str,
    timestamp: chrono::DateTime<chrono::Utc>,
    outcome: &SelectionResult,
    candidates: &[SelectionScore],
    weights: &SignalWeights,
) -> SelectionTrace {
    let tokens = tokenize(document_text);
    let token_sample: Vec<String> = tokens.iter().take(TOKEN_SAMPLE_LIMIT).cloned().collect();

    SelectionTrace {
        artifact_version: ARTIFACT_VERSION.to_string(),
        timestamp,
        document_id: document_id.to_string(),
        input_signals: InputSignals {
            token_count: tokens.len(),
            token_sample,
            document_length: document_text.len(),
        },
        outcome: outcome.clone(),
        candidates: candidates.to_vec(),
        weights_used: weights.clone(),
    }
}

/// Serializes `trace` as canonical JSON and writes it to its conventional
/// path under `base_dir/artifacts/selection/` (§6).
///
/// # Errors
/// Returns [`AuditError::Contract`] on serialization failure, or
/// [`AuditError::Io`] if the write fails.
pub fn write_trace(base_dir: &Utf8Path, trace: &SelectionTrace, epoch_ms: u128) -> Result<(), AuditError> {
    let path = selection_trace_path(base_dir, &trace.document_id, epoch_ms);
    let json = emit_jcs(trace)?;
    write_file_atomic(&path, &json)
}
