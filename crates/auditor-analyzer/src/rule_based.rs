//! Rule-based fallback analyzer (§4.12): used whenever no LLM interpreter is
//! configured or the LLM path fails. Deliberately lenient about missing
//! fields — never blocks processing just because a field wasn't found, so a
//! document with enough content still gets a usable report — but a field
//! that was found and fails its rule (bad format, low-confidence
//! calibration) still drives `overall_result` by its worst severity.

use crate::types::{AuditReport, BoundingBox, Finding, OverallResult, ReasonCode};
use auditor_calibration::guardrails::Severity;
use auditor_calibration::{CalibratedField, ExtractedField, FieldDecision};
use auditor_templates::types::SpecJson;
use regex::Regex;
use std::collections::BTreeMap;

const MIN_CONTENT_LENGTH: usize = 50;
const MIN_WORD_COUNT: usize = 10;

/// Runs the lenient rule-based fallback over `spec`'s rules against the
/// already-extracted and calibrated fields, producing canonical findings.
#[must_use]
pub fn analyze(
    spec: &SpecJson,
    text: &str,
    extracted: &[ExtractedField],
    calibrated: &[CalibratedField],
    correlation_id: Option<String>,
    processing_ms: u64,
) -> AuditReport {
    let trimmed = text.trim();
    let word_count = trimmed.split_whitespace().count();

    if trimmed.is_empty() {
        return AuditReport {
            overall_result: OverallResult::Fail,
            score: 0.0,
            findings: vec![Finding {
                rule_id: None,
                field_name: "Document".to_string(),
                severity: Severity::S0,
                reason_code: ReasonCode::OcrFailure,
                raw_snippet: String::new(),
                normalised_snippet: String::new(),
                confidence: 0.0,
                page_number: None,
                bounding_box: None,
                why_it_matters: "No text could be extracted from the document".to_string(),
                suggested_fix: "Re-scan the document at a higher resolution".to_string(),
            }],
            extracted_fields: BTreeMap::new(),
            summary: "Document produced no extractable text".to_string(),
            processing_ms,
            model: None,
            correlation_id,
            retry_attempts: 0,
            error_code: Some("OCR_FAILURE".to_string()),
        };
    }

    let mut findings = Vec::new();
    let extracted_by_id: BTreeMap<&str, &ExtractedField> =
        extracted.iter().map(|f| (f.field_id.as_str(), f)).collect();
    let calibrated_by_id: BTreeMap<&str, &CalibratedField> =
        calibrated.iter().map(|f| (f.field_id.as_str(), f)).collect();

    for rule in spec.rules.iter().filter(|r| r.enabled) {
        let field = spec.fields.iter().find(|f| f.id == rule.field);
        let Some(field) = field else { continue };
        let label_present = text.to_lowercase().contains(&field.label.to_lowercase());

        if !label_present && field.required {
            findings.push(Finding {
                rule_id: Some(rule.rule_id.clone()),
                field_name: field.id.clone(),
                severity: map_severity(rule.severity),
                reason_code: ReasonCode::MissingField,
                raw_snippet: String::new(),
                normalised_snippet: String::new(),
                confidence: 0.0,
                page_number: None,
                bounding_box: None,
                why_it_matters: format!("{} is required but was not found in the document", field.label),
                suggested_fix: format!("Ensure the document includes a clearly labeled {}", field.label),
            });
            continue;
        }

        if let Some(pattern) = &rule.pattern {
            if let Some(extracted_field) = extracted_by_id.get(rule.field.as_str()) {
                if extracted_field.extracted {
                    let matches = Regex::new(pattern).is_ok_and(|re| re.is_match(&extracted_field.value));
                    if !matches {
                        findings.push(Finding {
                            rule_id: Some(rule.rule_id.clone()),
                            field_name: field.id.clone(),
                            severity: map_severity(rule.severity),
                            reason_code: ReasonCode::InvalidFormat,
                            raw_snippet: extracted_field.value.clone(),
                            normalised_snippet: extracted_field.value.to_lowercase(),
                            confidence: extracted_field.confidence,
                            page_number: None,
                            bounding_box: None,
                            why_it_matters: format!("{} does not match the expected format", field.label),
                            suggested_fix: "Correct the value to match the expected format".to_string(),
                        });
                    }
                }
            }
        }

        if let Some(calibrated_field) = calibrated_by_id.get(rule.field.as_str()) {
            if calibrated_field.decision == FieldDecision::NeedsReview {
                findings.push(Finding {
                    rule_id: Some(rule.rule_id.clone()),
                    field_name: field.id.clone(),
                    severity: Severity::S2,
                    reason_code: ReasonCode::LowConfidence,
                    raw_snippet: String::new(),
                    normalised_snippet: String::new(),
                    confidence: calibrated_field.adjusted_confidence,
                    page_number: None,
                    bounding_box: None,
                    why_it_matters: format!("{} was extracted with low confidence", field.label),
                    suggested_fix: "Manually verify this field before relying on the report".to_string(),
                });
            }
        }
    }

    findings.sort_by_key(crate::types::finding_sort_key);

    let detected_count = extracted.iter().filter(|f| f.extracted).count().max(1);
    let total_fields = spec.fields.len().max(1);
    let detection_ratio = detected_count as f64 / total_fields as f64;
    let length_component = (word_count as f64 / 200.0).min(1.0);
    let score = ((detection_ratio * 70.0) + (length_component * 30.0)).clamp(0.0, 100.0);

    let content_heuristic = || {
        if trimmed.len() >= MIN_CONTENT_LENGTH && word_count >= MIN_WORD_COUNT {
            OverallResult::Pass
        } else {
            OverallResult::ReviewQueue
        }
    };

    // Missing-field findings stay lenient (the whole point of the fallback
    // is to never block on field gaps the LLM would have filled in), but a
    // field that was found and is actively wrong — bad format, low
    // confidence, whatever else a rule can flag — still has to count.
    let worst_blocking_severity = findings
        .iter()
        .filter(|f| f.reason_code != ReasonCode::MissingField)
        .map(|f| f.severity)
        .min();

    let overall_result = match worst_blocking_severity {
        Some(Severity::S0 | Severity::S1) => OverallResult::Fail,
        Some(Severity::S2) => OverallResult::ReviewQueue,
        Some(Severity::S3) | None => content_heuristic(),
    };

    let extracted_fields = extracted
        .iter()
        .filter(|f| f.extracted)
        .map(|f| (f.field_id.clone(), f.value.clone()))
        .collect();

    AuditReport {
        overall_result,
        score,
        findings,
        extracted_fields,
        summary: format!("Rule-based review: {detected_count}/{total_fields} fields detected"),
        processing_ms,
        model: None,
        correlation_id,
        retry_attempts: 0,
        error_code: None,
    }
}

fn map_severity(severity: auditor_templates::types::Severity) -> Severity {
    use auditor_templates::types::Severity as SpecSeverity;
    match severity {
        SpecSeverity::Critical => Severity::S0,
        SpecSeverity::Major => Severity::S1,
        SpecSeverity::Minor => Severity::S2,
        SpecSeverity::Info => Severity::S3,
    }
}
