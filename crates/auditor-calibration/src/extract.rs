//! Lightweight field extraction (§4.13 step 6 precursor): turns raw OCR text
//! into the `ExtractedField` list calibration operates on, ahead of the
//! analyzer's own rule evaluation. Both the rule-based analyzer fallback and
//! the pipeline's calibration stage consume the same extracted fields so the
//! two stages never disagree about what was found in the document.

use crate::types::{ExtractedField, ExtractionSource};
use auditor_templates::types::SpecJson;
use regex::Regex;

const LABEL_AND_PATTERN_CONFIDENCE: f64 = 92.0;
const LABEL_ONLY_CONFIDENCE: f64 = 55.0;
const NOT_FOUND_CONFIDENCE: f64 = 0.0;

/// Extracts one field per spec field by label-containment search over
/// `text`, validating against the field's rule pattern when one is declared.
#[must_use]
pub fn extract_fields(spec: &SpecJson, text: &str) -> Vec<ExtractedField> {
    let lower_text = text.to_lowercase();

    spec.fields
        .iter()
        .map(|field| {
            let label_lower = field.label.to_lowercase();
            let label_index = lower_text.find(&label_lower);

            let Some(idx) = label_index else {
                return ExtractedField {
                    field_id: field.id.clone(),
                    value: String::new(),
                    confidence: NOT_FOUND_CONFIDENCE,
                    source: ExtractionSource::Ocr,
                    extracted: false,
                    roi_match: None,
                };
            };

            let trailing = &text[idx + field.label.len().min(text.len() - idx)..];
            let value = trailing
                .trim_start_matches([':', ' ', '\t'])
                .split(['.', '\n'])
                .next()
                .unwrap_or("")
                .trim()
                .to_string();

            let pattern = spec.rules.iter().find(|r| r.field == field.id).and_then(|r| r.pattern.as_deref());
            let matches_pattern = pattern
                .and_then(|p| Regex::new(p).ok())
                .is_some_and(|re| re.is_match(&value));

            let confidence = if pattern.is_none() || matches_pattern {
                LABEL_AND_PATTERN_CONFIDENCE
            } else {
                LABEL_ONLY_CONFIDENCE
            };

            ExtractedField {
                field_id: field.id.clone(),
                value,
                confidence,
                source: ExtractionSource::Ocr,
                extracted: true,
                roi_match: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_value_following_label() {
        let spec = auditor_templates::default_template::build();
        let text = "Job Number: JOB-000123. Asset ID: A1.";
        let fields = extract_fields(&spec, text);
        let job = fields.iter().find(|f| f.field_id == "jobReference").unwrap();
        assert!(job.extracted);
        assert_eq!(job.value, "JOB-000123");
        assert!((job.confidence - LABEL_AND_PATTERN_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_label_yields_unextracted_field() {
        let spec = auditor_templates::default_template::build();
        let fields = extract_fields(&spec, "nothing relevant here");
        let job = fields.iter().find(|f| f.field_id == "jobReference").unwrap();
        assert!(!job.extracted);
        assert_eq!(job.confidence, 0.0);
    }

    #[test]
    fn value_failing_pattern_gets_lower_confidence() {
        let spec = auditor_templates::default_template::build();
        let text = "Job Number: NOT-A-VALID-NUMBER.";
        let fields = extract_fields(&spec, text);
        let job = fields.iter().find(|f| f.field_id == "jobReference").unwrap();
        assert!(job.extracted);
        assert!((job.confidence - LABEL_ONLY_CONFIDENCE).abs() < f64::EPSILON);
    }
}
