//! Guardrails G001-G004 and the stop-behavior evaluator (§4.11).

use crate::types::{CalibratedField, FieldCalibration, FieldDecision};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    S0,
    S1,
    S2,
    S3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopBehavior {
    StopImmediately,
    ReviewQueue,
    ContinueFlagged,
    Continue,
}

/// Severity to stop-behavior is a total, constant function (§4.11).
#[must_use]
pub fn stop_behavior_for(severity: Severity) -> StopBehavior {
    match severity {
        Severity::S0 => StopBehavior::StopImmediately,
        Severity::S1 => StopBehavior::ReviewQueue,
        Severity::S2 => StopBehavior::ContinueFlagged,
        Severity::S3 => StopBehavior::Continue,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailResult {
    pub id: &'static str,
    pub severity: Severity,
    pub passed: bool,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailEvaluation {
    pub results: Vec<GuardrailResult>,
    pub should_stop: bool,
    pub overall_behavior: StopBehavior,
    pub stop_reasons: Vec<String>,
}

/// Evaluates G001-G004 against the calibrated fields and folds them into the
/// maximum-precedence stop behavior. `duplicate_field_ids` names any field
/// id the analyzer extracted more than once (conflict detection for G003).
#[must_use]
pub fn evaluate(
    fields: &[CalibratedField],
    calibrations: &[FieldCalibration],
    duplicate_field_ids: &[String],
    anomaly_score: f64,
    anomaly_threshold: f64,
) -> GuardrailEvaluation {
    let g001 = GuardrailResult {
        id: "G001",
        severity: Severity::S0,
        passed: !fields.is_empty(),
        detail: if fields.is_empty() {
            "no fields were extracted".to_string()
        } else {
            format!("{} field(s) extracted", fields.len())
        },
    };

    let critical_ids: Vec<&str> = calibrations.iter().filter(|c| c.is_critical).map(|c| c.field_id.as_str()).collect();
    let critical_below_threshold: Vec<&str> = critical_ids
        .iter()
        .filter(|id| {
            fields
                .iter()
                .find(|f| &f.field_id == *id)
                .is_none_or(|f| f.decision != FieldDecision::Accepted)
        })
        .copied()
        .collect();
    let g002 = GuardrailResult {
        id: "G002",
        severity: Severity::S1,
        passed: critical_below_threshold.is_empty(),
        detail: if critical_below_threshold.is_empty() {
            "all critical fields meet minimum confidence".to_string()
        } else {
            format!("critical fields below threshold: {}", critical_below_threshold.join(", "))
        },
    };

    let g003 = GuardrailResult {
        id: "G003",
        severity: Severity::S2,
        passed: duplicate_field_ids.is_empty(),
        detail: if duplicate_field_ids.is_empty() {
            "no duplicate extractions".to_string()
        } else {
            format!("duplicate extractions for: {}", duplicate_field_ids.join(", "))
        },
    };

    let g004 = GuardrailResult {
        id: "G004",
        severity: Severity::S2,
        passed: anomaly_score < anomaly_threshold,
        detail: format!("anomaly score {anomaly_score:.2} (threshold {anomaly_threshold:.2})"),
    };

    let results = vec![g001, g002, g003, g004];

    let mut failed: Vec<&GuardrailResult> = results.iter().filter(|r| !r.passed).collect();
    failed.sort_by_key(|r| r.id);

    let overall_behavior = failed
        .iter()
        .map(|r| stop_behavior_for(r.severity))
        .min_by_key(|b| match b {
            StopBehavior::StopImmediately => 0,
            StopBehavior::ReviewQueue => 1,
            StopBehavior::ContinueFlagged => 2,
            StopBehavior::Continue => 3,
        })
        .unwrap_or(StopBehavior::Continue);

    let should_stop = !failed.is_empty();
    let stop_reasons = failed.iter().map(|r| r.id.to_string()).collect();

    GuardrailEvaluation { results, should_stop, overall_behavior, stop_reasons }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExtractionSource;

    fn calibration(field_id: &str) -> FieldCalibration {
        FieldCalibration {
            field_id: field_id.to_string(),
            min_confidence: 70.0,
            review_threshold: 40.0,
            is_critical: true,
            allowed_methods: vec![ExtractionSource::Ocr],
            validation_pattern: None,
            max_retries: 2,
        }
    }

    fn accepted_field(field_id: &str) -> CalibratedField {
        CalibratedField {
            field_id: field_id.to_string(),
            raw_confidence: 90.0,
            adjusted_confidence: 90.0,
            decision: FieldDecision::Accepted,
            notes: Vec::new(),
        }
    }

    #[test]
    fn no_fields_triggers_g001_stop_immediately() {
        let evaluation = evaluate(&[], &[], &[], 0.0, 1.0);
        assert!(evaluation.should_stop);
        assert_eq!(evaluation.overall_behavior, StopBehavior::StopImmediately);
        assert!(evaluation.stop_reasons.contains(&"G001".to_string()));
    }

    #[test]
    fn all_gates_pass_when_healthy() {
        let calibrations = vec![calibration("date")];
        let fields = vec![accepted_field("date")];
        let evaluation = evaluate(&fields, &calibrations, &[], 0.0, 1.0);
        assert!(!evaluation.should_stop);
        assert_eq!(evaluation.overall_behavior, StopBehavior::Continue);
    }

    #[test]
    fn duplicate_extraction_triggers_g003_continue_flagged() {
        let calibrations = vec![calibration("date")];
        let fields = vec![accepted_field("date")];
        let evaluation = evaluate(&fields, &calibrations, &["date".to_string()], 0.0, 1.0);
        assert!(evaluation.should_stop);
        assert_eq!(evaluation.overall_behavior, StopBehavior::ContinueFlagged);
    }

    #[test]
    fn stop_reasons_are_sorted() {
        let calibrations = vec![calibration("date")];
        let evaluation = evaluate(&[], &calibrations, &["date".to_string()], 5.0, 1.0);
        assert_eq!(evaluation.stop_reasons, vec!["G001".to_string(), "G002".to_string(), "G003".to_string(), "G004".to_string()]);
    }
}
