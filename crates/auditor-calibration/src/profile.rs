//! `CalibrationProfile` and per-field `FieldCalibration` derivation (§4.11).

use crate::types::{CalibrationProfile, ExtractionSource, FieldCalibration, ThresholdLevel};
use auditor_templates::types::SpecJson;

/// Fields always treated as critical regardless of a spec's own `required`
/// flag (§4.11): a job sheet is not auditable without these even if a
/// user-authored template forgot to mark them required.
pub const ALWAYS_CRITICAL: &[&str] = &["signature", "engineerSignOff", "date"];

const DEFAULT_MAX_RETRIES: u32 = 2;

#[must_use]
pub fn profile_for_level(level: ThresholdLevel) -> CalibrationProfile {
    match level {
        ThresholdLevel::Strict => CalibrationProfile {
            level,
            global_min_confidence: 75.0,
            critical_field_min_confidence: 90.0,
            review_threshold: 60.0,
            require_roi_for_critical_fields: true,
        },
        ThresholdLevel::Standard => CalibrationProfile {
            level,
            global_min_confidence: 60.0,
            critical_field_min_confidence: 75.0,
            review_threshold: 45.0,
            require_roi_for_critical_fields: false,
        },
        ThresholdLevel::Lenient => CalibrationProfile {
            level,
            global_min_confidence: 45.0,
            critical_field_min_confidence: 60.0,
            review_threshold: 30.0,
            require_roi_for_critical_fields: false,
        },
    }
}

/// Builds one `FieldCalibration` per field declared in `spec`, unioning
/// [`ALWAYS_CRITICAL`] into the critical set regardless of the spec's own
/// `required` flags.
#[must_use]
pub fn calibrations_for_spec(spec: &SpecJson, profile: &CalibrationProfile) -> Vec<FieldCalibration> {
    spec.fields
        .iter()
        .map(|field| {
            let is_critical = field.required || ALWAYS_CRITICAL.contains(&field.id.as_str());
            let min_confidence = if is_critical {
                profile.critical_field_min_confidence
            } else {
                profile.global_min_confidence
            };
            let validation_pattern = spec
                .rules
                .iter()
                .find(|r| r.field == field.id && r.pattern.is_some())
                .and_then(|r| r.pattern.clone());

            FieldCalibration {
                field_id: field.id.clone(),
                min_confidence,
                review_threshold: profile.review_threshold,
                is_critical,
                allowed_methods: vec![
                    ExtractionSource::Ocr,
                    ExtractionSource::Regex,
                    ExtractionSource::Inference,
                    ExtractionSource::ImageQa,
                ],
                validation_pattern,
                max_retries: DEFAULT_MAX_RETRIES,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_monotonic_strict_to_lenient() {
        let strict = profile_for_level(ThresholdLevel::Strict);
        let standard = profile_for_level(ThresholdLevel::Standard);
        let lenient = profile_for_level(ThresholdLevel::Lenient);

        assert!(strict.global_min_confidence > standard.global_min_confidence);
        assert!(standard.global_min_confidence > lenient.global_min_confidence);
        assert!(strict.critical_field_min_confidence > standard.critical_field_min_confidence);
        assert!(standard.critical_field_min_confidence > lenient.critical_field_min_confidence);
        assert!(strict.review_threshold > standard.review_threshold);
        assert!(standard.review_threshold > lenient.review_threshold);
    }

    #[test]
    fn always_critical_fields_are_unioned_in() {
        let spec = auditor_templates::default_template::build();
        let profile = profile_for_level(ThresholdLevel::Standard);
        let calibrations = calibrations_for_spec(&spec, &profile);
        let date_calibration = calibrations.iter().find(|c| c.field_id == "date").unwrap();
        assert!(date_calibration.is_critical);
    }
}
