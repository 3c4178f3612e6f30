//! Field calibration, quality assessment, and pipeline guardrails (§4.11).

pub mod calibrate;
pub mod extract;
pub mod guardrails;
pub mod profile;
pub mod types;

pub use calibrate::{assess_quality, calibrate_field};
pub use extract::extract_fields;
pub use guardrails::{evaluate as evaluate_guardrails, GuardrailEvaluation, Severity, StopBehavior};
pub use profile::{calibrations_for_spec, profile_for_level, ALWAYS_CRITICAL};
pub use types::{CalibratedField, CalibrationProfile, ExtractedField, FieldCalibration, FieldDecision, QualityAssessment, QualityGrade, ThresholdLevel};
