//! Calibration data model (§3, §4.11).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    Ocr,
    Regex,
    Inference,
    ImageQa,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedField {
    pub field_id: String,
    pub value: String,
    pub confidence: f64,
    pub source: ExtractionSource,
    pub extracted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_match: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdLevel {
    Strict,
    Standard,
    Lenient,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationProfile {
    pub level: ThresholdLevel,
    pub global_min_confidence: f64,
    pub critical_field_min_confidence: f64,
    pub review_threshold: f64,
    pub require_roi_for_critical_fields: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCalibration {
    pub field_id: String,
    pub min_confidence: f64,
    pub review_threshold: f64,
    pub is_critical: bool,
    pub allowed_methods: Vec<ExtractionSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_pattern: Option<String>,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDecision {
    Accepted,
    NeedsReview,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibratedField {
    pub field_id: String,
    pub raw_confidence: f64,
    pub adjusted_confidence: f64,
    pub decision: FieldDecision,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    A,
    B,
    C,
    D,
    F,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub score: f64,
    pub grade: QualityGrade,
    pub issues: Vec<String>,
    pub anomaly_detected: bool,
    pub passed_quality_gates: bool,
    pub recommendations: Vec<String>,
}
