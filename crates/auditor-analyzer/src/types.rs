//! Canonical analyzer output types (§3, §4.12).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    MissingField,
    UnreadableField,
    LowConfidence,
    InvalidFormat,
    Conflict,
    OutOfPolicy,
    IncompleteEvidence,
    OcrFailure,
    PipelineError,
    SpecGap,
    SecurityRisk,
}

pub use auditor_calibration::guardrails::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub field_name: String,
    pub severity: Severity,
    pub reason_code: ReasonCode,
    pub raw_snippet: String,
    pub normalised_snippet: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    pub why_it_matters: String,
    pub suggested_fix: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverallResult {
    Pass,
    Fail,
    ReviewQueue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub overall_result: OverallResult,
    pub score: f64,
    pub findings: Vec<Finding>,
    pub extracted_fields: BTreeMap<String, String>,
    pub summary: String,
    pub processing_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub retry_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

/// Ordering for Finding lists (§4.12): severity asc, then reasonCode asc,
/// then fieldName asc.
#[must_use]
pub fn finding_sort_key(finding: &Finding) -> (Severity, ReasonCode, String) {
    (finding.severity, finding.reason_code, finding.field_name.clone())
}
