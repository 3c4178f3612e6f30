//! Activation gates (§4.9): all seven must pass before a draft
//! `TemplateVersion` may transition to `active`. Every gate carries a
//! machine-readable fix path so a caller can remediate without digging
//! through the gate definitions below.

use crate::fixtures::{self, FixtureSummary};
use crate::roi;
use crate::types::TemplateVersion;

const CRITICAL_FIELDS: &[&str] = &["jobReference", "assetId", "date", "engineerSignOff"];
const MIN_SELECTION_TOKENS: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateViolation {
    pub gate: &'static str,
    pub message: String,
    pub fix_path: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiPresence {
    Present,
    Missing,
    AllowedMissing,
}

#[derive(Debug, Clone)]
pub struct SelectionSummary {
    pub has_required_tokens: bool,
    pub has_form_code_regex: bool,
    pub token_count: usize,
}

#[derive(Debug, Clone)]
pub struct ActivationReport {
    pub version_id: String,
    pub violations: Vec<GateViolation>,
    pub fixture_summary: Option<FixtureSummaryView>,
    pub roi_presence: Vec<(String, RoiPresence)>,
    pub selection_summary: SelectionSummary,
}

#[derive(Debug, Clone)]
pub struct FixtureSummaryView {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub required_failed: usize,
}

impl From<&FixtureSummary> for FixtureSummaryView {
    fn from(s: &FixtureSummary) -> Self {
        Self { total: s.total, passed: s.passed, failed: s.failed, required_failed: s.required_failed }
    }
}

impl ActivationReport {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Evaluates all seven activation gates against `version` and produces the
/// `ActivationReport` artifact. Does not mutate `version`'s status; the
/// caller flips `status` to `Active` only if `report.passed()`.
#[must_use]
pub fn evaluate(version: &TemplateVersion) -> ActivationReport {
    let mut violations = Vec::new();

    let token_count = version.selection_config.required_tokens_all.len()
        + version.selection_config.required_tokens_any.len()
        + version.selection_config.optional_tokens.len();

    if !version.selection_config.is_non_empty() {
        violations.push(GateViolation {
            gate: "selection_config_non_empty",
            message: "selection config has no required-all, required-any, or form-code tokens".to_string(),
            fix_path: "Add at least one requiredTokensAll, requiredTokensAny, or formCodeRegex entry",
        });
    }

    let field_ids: Vec<&str> = version.spec.fields.iter().map(|f| f.id.as_str()).collect();
    let missing_critical: Vec<&str> = CRITICAL_FIELDS
        .iter()
        .filter(|f| !field_ids.contains(f))
        .copied()
        .collect();
    if !missing_critical.is_empty() {
        violations.push(GateViolation {
            gate: "critical_fields_present",
            message: format!("missing critical fields: {}", missing_critical.join(", ")),
            fix_path: "Add the missing critical fields to the spec",
        });
    }

    if version.spec.rules.is_empty() {
        violations.push(GateViolation {
            gate: "at_least_one_rule",
            message: "spec has no validation rules".to_string(),
            fix_path: "Add at least one validation rule",
        });
    }

    let fixture_summary = match &version.fixture_pack {
        None => {
            violations.push(GateViolation {
                gate: "fixture_pack_exists",
                message: "no fixture pack attached to this version".to_string(),
                fix_path: "Create fixture pack",
            });
            None
        }
        Some(pack) => {
            let summary = fixtures::run(&version.spec, pack);
            if !summary.all_required_pass() {
                violations.push(GateViolation {
                    gate: "fixture_pack_passes",
                    message: format!(
                        "{} required fixture case(s) failed out of {}",
                        summary.required_failed, summary.total
                    ),
                    fix_path: "Fix the spec or rules until all required fixture cases pass",
                });
            }
            Some(FixtureSummaryView::from(&summary))
        }
    };

    let mut roi_presence = Vec::new();
    if let Some(roi_config) = &version.roi_config {
        let validation = roi::validate(roi_config);
        if !validation.is_valid() {
            violations.push(GateViolation {
                gate: "roi_valid",
                message: format!("{} ROI violation(s)", validation.violations.len()),
                fix_path: "Fix ROI region coordinates",
            });
        }
        if roi_config.require_critical_rois {
            let present_fields: Vec<&str> = roi_config.regions.iter().map(|r| r.field.as_str()).collect();
            let mut missing_critical_rois = Vec::new();
            for critical in CRITICAL_FIELDS {
                let presence = if present_fields.contains(critical) {
                    RoiPresence::Present
                } else if roi_config.allowed_missing_rois.iter().any(|a| a == critical) {
                    RoiPresence::AllowedMissing
                } else {
                    missing_critical_rois.push(*critical);
                    RoiPresence::Missing
                };
                roi_presence.push(((*critical).to_string(), presence));
            }
            if !missing_critical_rois.is_empty() {
                violations.push(GateViolation {
                    gate: "critical_rois_present",
                    message: format!("missing critical ROIs: {}", missing_critical_rois.join(", ")),
                    fix_path: "MISSING_CRITICAL_ROIS: add ROI regions for the missing critical fields or list them in allowedMissingRois",
                });
            }
        }
    }

    if token_count < MIN_SELECTION_TOKENS {
        violations.push(GateViolation {
            gate: "min_selection_tokens",
            message: format!("selection config has {token_count} tokens, need at least {MIN_SELECTION_TOKENS}"),
            fix_path: "Add more selection tokens",
        });
    }

    let selection_summary = SelectionSummary {
        has_required_tokens: !version.selection_config.required_tokens_all.is_empty()
            || !version.selection_config.required_tokens_any.is_empty(),
        has_form_code_regex: version.selection_config.form_code_regex.is_some(),
        token_count,
    };

    ActivationReport {
        version_id: version.version_id.clone(),
        violations,
        fixture_summary,
        roi_presence,
        selection_summary,
    }
}
