//! Wire-facing types for the LLM interpreter adapter contract (§4.8).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalFinding {
    pub rule_id: String,
    pub field_name: String,
    pub severity: String,
    pub reason_code: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalAuditReportSummary {
    pub findings: Vec<CanonicalFinding>,
    pub validated_fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InterpretInput {
    pub audit_report: Option<CanonicalAuditReportSummary>,
    pub extracted_fields: Option<serde_json::Value>,
    /// Raw OCR text. Only ever forwarded upstream when BOTH
    /// `InterpretOptions::include_raw_ocr` is set AND the process-level
    /// `ENABLE_RAW_OCR_INSIGHTS` flag is enabled.
    pub raw_ocr_text: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InterpretOptions {
    pub include_raw_ocr: bool,
    pub max_insights: Option<u32>,
    pub min_confidence: Option<f64>,
    pub skip_retry: bool,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub message: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_field: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationResult {
    pub insights: Vec<Insight>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsMetadata {
    pub processing_ms: u64,
    pub input_artifacts: Vec<String>,
}

/// Advisory artifact. `is_advisory_only` is always `true` and is never
/// merged into a canonical `AuditReport` (§3, §4.8 hard invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsArtifact {
    pub version: String,
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub correlation_id: Option<String>,
    pub model: String,
    pub is_advisory_only: bool,
    pub insights: Vec<Insight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub metadata: InsightsMetadata,
}

#[derive(Debug, Clone)]
pub struct ApiKeyValidation {
    pub valid: bool,
    pub error: Option<String>,
}
