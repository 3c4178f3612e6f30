//! Canonical AuditReport shapes for pipeline-level failures (§4.12, §7).
//! Adapter errors never propagate past the orchestrator for audit-time
//! operations — they become an `AuditReport` with `success`-equivalent
//! `overallResult=REVIEW_QUEUE` and an `errorCode`.

use crate::types::{AuditReport, Finding, OverallResult, ReasonCode};
use auditor_calibration::guardrails::Severity;
use auditor_dlq::{DeadLetterQueue, NewFailedJob, Stage};
use std::collections::BTreeMap;

const ANALYSIS_PIPELINE_FIELD: &str = "Analysis Pipeline";

/// Maps the breaker's upstream name to the DLQ stage it failed in. The OCR
/// breaker is named "ocr"; every LLM-backed breaker ("llm-analyzer",
/// "llm-interpreter") failed during analysis.
fn stage_for_upstream(upstream: &str) -> Stage {
    match upstream {
        "ocr" => Stage::Ocr,
        _ => Stage::Analysis,
    }
}

fn system_finding(reason_code: ReasonCode, why_it_matters: &str) -> Finding {
    Finding {
        rule_id: None,
        field_name: ANALYSIS_PIPELINE_FIELD.to_string(),
        severity: Severity::S1,
        reason_code,
        raw_snippet: String::new(),
        normalised_snippet: String::new(),
        confidence: 0.0,
        page_number: None,
        bounding_box: None,
        why_it_matters: why_it_matters.to_string(),
        suggested_fix: "Retry the document once the underlying error is resolved".to_string(),
    }
}

/// Any non-breaker error surviving retries (§4.12, §7): `REVIEW_QUEUE`,
/// score 0, a single `PIPELINE_ERROR` finding, `errorCode=PROCESSING_ERROR`.
#[must_use]
pub fn pipeline_error_report(correlation_id: Option<String>, reason: &str) -> AuditReport {
    AuditReport {
        overall_result: OverallResult::ReviewQueue,
        score: 0.0,
        findings: vec![system_finding(ReasonCode::PipelineError, reason)],
        extracted_fields: BTreeMap::new(),
        summary: format!("Processing failed: {reason}"),
        processing_ms: 0,
        model: None,
        correlation_id,
        retry_attempts: 0,
        error_code: Some("PROCESSING_ERROR".to_string()),
    }
}

/// Circuit-breaker-open shape (§4.12, §7): `errorCode=CIRCUIT_BREAKER_OPEN`,
/// plus a best-effort DLQ entry when a document id is supplied. A DLQ write
/// failure is logged and never masks the original error.
pub fn circuit_open_report(
    correlation_id: Option<String>,
    document_id: Option<&str>,
    upstream: &str,
    dlq: Option<&DeadLetterQueue>,
) -> AuditReport {
    if let (Some(document_id), Some(dlq)) = (document_id, dlq) {
        dlq.add(NewFailedJob {
            document_id: document_id.to_string(),
            correlation_id: correlation_id.clone(),
            stage: stage_for_upstream(upstream),
            error: auditor_dlq::JobError {
                message: format!("circuit breaker open for {upstream}"),
                code: Some("CIRCUIT_BREAKER_OPEN".to_string()),
            },
            max_attempts: 3,
            metadata: serde_json::Map::new(),
        });
    }

    AuditReport {
        overall_result: OverallResult::ReviewQueue,
        score: 0.0,
        findings: vec![system_finding(
            ReasonCode::PipelineError,
            &format!("Upstream {upstream} is temporarily unavailable (circuit breaker open)"),
        )],
        extracted_fields: BTreeMap::new(),
        summary: format!("{upstream} circuit breaker is open"),
        processing_ms: 0,
        model: None,
        correlation_id,
        retry_attempts: 0,
        error_code: Some("CIRCUIT_BREAKER_OPEN".to_string()),
    }
}

/// Rate-limit-rejected shape (§4.6, §7): `errorCode=RATE_LIMIT_EXCEEDED`, no
/// DLQ entry — a throttled document is expected to be retried by the caller,
/// not treated as a processing failure.
#[must_use]
pub fn rate_limited_report(correlation_id: Option<String>, retry_after_secs: u64) -> AuditReport {
    AuditReport {
        overall_result: OverallResult::ReviewQueue,
        score: 0.0,
        findings: vec![system_finding(
            ReasonCode::PipelineError,
            &format!("Processing rate limit exceeded, retry after {retry_after_secs}s"),
        )],
        extracted_fields: BTreeMap::new(),
        summary: "Document rejected by the processing rate limiter".to_string(),
        processing_ms: 0,
        model: None,
        correlation_id,
        retry_attempts: 0,
        error_code: Some("RATE_LIMIT_EXCEEDED".to_string()),
    }
}
