//! Fixture runner (§4.9, §8). Validates a template version's `SpecJson`
//! against its attached `FixturePack` using a deterministic token-containment
//! mock matcher. This matcher is deliberately NOT the production analyzer —
//! it only checks that labeled fields/reason codes appear in the input text
//! as substrings, which is enough to gate activation without depending on
//! the LLM or the rule engine. Runtime scoring always goes through the real
//! analyzer.

use crate::types::{ExpectedOutcome, FixtureCase, FixturePack, SpecJson};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseResult {
    pub case_id: String,
    pub required: bool,
    pub passed: bool,
    pub predicted_outcome: ExpectedOutcome,
    pub predicted_reason_codes: Vec<String>,
    pub detail: String,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub required_failed: usize,
    pub case_results: Vec<CaseResult>,
}

impl FixtureSummary {
    #[must_use]
    pub fn all_required_pass(&self) -> bool {
        self.required_failed == 0
    }
}

/// Runs every case in `pack` against `spec` with the mock matcher.
#[must_use]
pub fn run(spec: &SpecJson, pack: &FixturePack) -> FixtureSummary {
    let mut summary = FixtureSummary { total: pack.cases.len(), ..Default::default() };

    for case in &pack.cases {
        let result = run_case(spec, case);
        if result.passed {
            summary.passed += 1;
        } else {
            summary.failed += 1;
            if result.required {
                summary.required_failed += 1;
            }
        }
        summary.case_results.push(result);
    }

    summary
}

fn run_case(spec: &SpecJson, case: &FixtureCase) -> CaseResult {
    let lower_text = case.input_text.to_lowercase();

    let mut missing_required_fields = Vec::new();
    for field in spec.fields.iter().filter(|f| f.required) {
        let expected_value = case.expected_fields.get(&field.id);
        let label_hit = lower_text.contains(&field.label.to_lowercase());
        let value_hit = expected_value.is_some_and(|v| lower_text.contains(&v.to_lowercase()));
        if !label_hit && !value_hit {
            missing_required_fields.push(field.id.clone());
        }
    }

    let predicted_reason_codes: Vec<String> = if missing_required_fields.is_empty() {
        Vec::new()
    } else {
        vec!["MISSING_FIELD".to_string()]
    };

    let predicted_outcome = if case.input_text.trim().is_empty() {
        ExpectedOutcome::Fail
    } else if !missing_required_fields.is_empty() {
        ExpectedOutcome::ReviewQueue
    } else {
        ExpectedOutcome::Pass
    };

    let outcome_matches = predicted_outcome == case.expected_outcome;
    let reason_codes_subset = case
        .expected_reason_codes
        .iter()
        .all(|expected| predicted_reason_codes.contains(expected));

    let passed = outcome_matches && reason_codes_subset;

    let detail = if passed {
        "ok".to_string()
    } else {
        format!(
            "expected outcome {:?} with reason codes {:?}, got {:?} with {:?} (missing fields: {:?})",
            case.expected_outcome, case.expected_reason_codes, predicted_outcome,
            predicted_reason_codes, missing_required_fields
        )
    };

    CaseResult {
        case_id: case.case_id.clone(),
        required: case.required,
        passed,
        predicted_outcome,
        predicted_reason_codes,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::default_template;
    use std::collections::BTreeMap;

    fn pack(cases: Vec<FixtureCase>) -> FixturePack {
        FixturePack { pack_version: 1, hash_sha256: "deadbeef".to_string(), cases }
    }

    #[test]
    fn matching_document_passes() {
        let spec = default_template::build();
        let mut expected_fields = BTreeMap::new();
        expected_fields.insert("jobReference".to_string(), "JOB-000123".to_string());
        let case = FixtureCase {
            case_id: "case1".to_string(),
            description: "complete sheet".to_string(),
            input_text: "Engineer Sign-off: yes. Date of Service: 01/02/2026. Serial Number: SN-12345-AB. Technician: Jo. Work Description: fix it. Time In: 09:00. Time Out: 10:00. Customer: Acme. Job Number: JOB-000123. Asset ID: A1".to_string(),
            expected_outcome: ExpectedOutcome::Pass,
            expected_reason_codes: Vec::new(),
            expected_fields,
            required: true,
        };
        let summary = run(&spec, &pack(vec![case]));
        assert!(summary.all_required_pass());
        assert_eq!(summary.passed, 1);
    }

    #[test]
    fn empty_document_expects_fail() {
        let spec = default_template::build();
        let case = FixtureCase {
            case_id: "case2".to_string(),
            description: "blank".to_string(),
            input_text: String::new(),
            expected_outcome: ExpectedOutcome::Fail,
            expected_reason_codes: Vec::new(),
            expected_fields: BTreeMap::new(),
            required: true,
        };
        let summary = run(&spec, &pack(vec![case]));
        assert!(summary.all_required_pass());
    }

    #[test]
    fn missing_required_field_flags_required_failure_when_expectation_wrong() {
        let spec = default_template::build();
        let case = FixtureCase {
            case_id: "case3".to_string(),
            description: "incomplete, wrongly expected pass".to_string(),
            input_text: "Customer: Acme".to_string(),
            expected_outcome: ExpectedOutcome::Pass,
            expected_reason_codes: Vec::new(),
            expected_fields: BTreeMap::new(),
            required: true,
        };
        let summary = run(&spec, &pack(vec![case]));
        assert!(!summary.all_required_pass());
        assert_eq!(summary.required_failed, 1);
    }
}
