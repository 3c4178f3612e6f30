//! Per-field penalty application, decisions, and quality assessment (§4.11).

use crate::types::{
    CalibratedField, ExtractedField, FieldCalibration, FieldDecision, QualityAssessment, QualityGrade,
};
use regex::Regex;

/// Penalty for extraction via a method not in the field's `allowedMethods`.
const ALPHA_WRONG_SOURCE: f64 = 20.0;
/// Penalty for a value that fails its declared validation pattern.
const BETA_PATTERN_MISMATCH: f64 = 25.0;
/// Penalty for a critical field with no ROI match.
const GAMMA_CRITICAL_NO_ROI: f64 = 15.0;

const ANOMALY_REJECTED_RATIO_THRESHOLD: f64 = 0.4;

/// Applies the three penalties to one extracted field and decides
/// accepted/needsReview/rejected against its calibration.
#[must_use]
pub fn calibrate_field(extracted: &ExtractedField, calibration: &FieldCalibration) -> CalibratedField {
    let mut adjusted = extracted.confidence;
    let mut notes = Vec::new();

    if !calibration.allowed_methods.contains(&extracted.source) {
        adjusted -= ALPHA_WRONG_SOURCE;
        notes.push(format!("-{ALPHA_WRONG_SOURCE} penalty: source {:?} not in allowed methods", extracted.source));
    }

    if let Some(pattern) = &calibration.validation_pattern {
        let matches = Regex::new(pattern).is_ok_and(|re| re.is_match(&extracted.value));
        if !matches {
            adjusted -= BETA_PATTERN_MISMATCH;
            notes.push(format!("-{BETA_PATTERN_MISMATCH} penalty: value fails validation pattern"));
        }
    }

    if calibration.is_critical && extracted.roi_match == Some(false) {
        adjusted -= GAMMA_CRITICAL_NO_ROI;
        notes.push(format!("-{GAMMA_CRITICAL_NO_ROI} penalty: critical field has no ROI match"));
    }

    let adjusted = adjusted.max(0.0);

    let decision = if adjusted >= calibration.min_confidence {
        FieldDecision::Accepted
    } else if adjusted >= calibration.review_threshold {
        FieldDecision::NeedsReview
    } else {
        FieldDecision::Rejected
    };

    CalibratedField {
        field_id: extracted.field_id.clone(),
        raw_confidence: extracted.confidence,
        adjusted_confidence: adjusted,
        decision,
        notes,
    }
}

/// Aggregates per-field calibration results into a `QualityAssessment`.
#[must_use]
pub fn assess_quality(fields: &[CalibratedField], calibrations: &[FieldCalibration]) -> QualityAssessment {
    let total = fields.len().max(1) as f64;
    let accepted = fields.iter().filter(|f| f.decision == FieldDecision::Accepted).count() as f64;
    let rejected = fields.iter().filter(|f| f.decision == FieldDecision::Rejected).count();
    let score = (accepted / total * 100.0).clamp(0.0, 100.0);

    let grade = match score {
        s if s >= 90.0 => QualityGrade::A,
        s if s >= 80.0 => QualityGrade::B,
        s if s >= 70.0 => QualityGrade::C,
        s if s >= 60.0 => QualityGrade::D,
        _ => QualityGrade::F,
    };

    let anomaly_detected = (rejected as f64 / total) > ANOMALY_REJECTED_RATIO_THRESHOLD;

    let missing_critical: Vec<&str> = calibrations
        .iter()
        .filter(|c| c.is_critical)
        .filter(|c| {
            fields
                .iter()
                .find(|f| f.field_id == c.field_id)
                .is_none_or(|f| f.decision == FieldDecision::Rejected)
        })
        .map(|c| c.field_id.as_str())
        .collect();

    let passed_quality_gates = missing_critical.is_empty();

    let mut issues = Vec::new();
    let mut recommendations = Vec::new();
    for field in fields.iter().filter(|f| f.decision != FieldDecision::Accepted) {
        issues.push(format!("{} is {:?} (adjusted confidence {:.1})", field.field_id, field.decision, field.adjusted_confidence));
    }
    if !missing_critical.is_empty() {
        recommendations.push(format!("Re-scan or manually verify critical fields: {}", missing_critical.join(", ")));
    }
    if anomaly_detected {
        recommendations.push("High rejection rate detected; review OCR quality for this document".to_string());
    }

    QualityAssessment { score, grade, issues, anomaly_detected, passed_quality_gates, recommendations }
}
