//! Candidate ranking, confidence bands, and ambiguity detection (§4.10).

use crate::scoring::{combine_signals, score_tokens};
use crate::tokenize::tokenize;
use crate::types::{ConfidenceBand, SelectionResult, SelectionScore, SignalWeights};
use auditor_templates::types::TemplateVersion;

const HIGH_THRESHOLD: f64 = 80.0;
const MEDIUM_THRESHOLD: f64 = 60.0;
const AMBIGUITY_GAP: f64 = 10.0;

#[must_use]
fn band_for_score(score: f64) -> ConfidenceBand {
    if score >= HIGH_THRESHOLD {
        ConfidenceBand::High
    } else if score >= MEDIUM_THRESHOLD {
        ConfidenceBand::Medium
    } else {
        ConfidenceBand::Low
    }
}

/// Scores every candidate template version against `document_text`, orders
/// them deterministically (score desc, then `templateId` asc), and derives
/// the overall selection outcome including ambiguity and auto-processing
/// eligibility.
#[must_use]
pub fn select(document_text: &str, candidates: &[TemplateVersion], weights: &SignalWeights) -> SelectionResult {
    let tokens = tokenize(document_text);

    let mut scored: Vec<SelectionScore> = candidates
        .iter()
        .map(|candidate| {
            let token_result = score_tokens(document_text, &tokens, &candidate.selection_config);
            let combined = combine_signals(token_result.score, None, None, None, weights);
            SelectionScore {
                template_id: candidate.slug.clone(),
                version_id: candidate.version_id.clone(),
                score: combined,
                matched_tokens: token_result.matched_tokens,
                missing_required: token_result.missing_required,
                confidence_band: band_for_score(combined),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.template_id.cmp(&b.template_id))
    });

    let top_score = scored.first().map(|s| s.score);
    let runner_up_score = scored.get(1).map(|s| s.score);
    let gap = match (top_score, runner_up_score) {
        (Some(top), Some(runner_up)) => Some(top - runner_up),
        _ => None,
    };

    let candidate_count = scored.iter().filter(|s| s.score > 0.0).count();
    let ambiguous = gap.is_some_and(|g| g < AMBIGUITY_GAP) && candidate_count > 1;

    let confidence_band = match top_score {
        Some(top) if top >= HIGH_THRESHOLD => ConfidenceBand::High,
        Some(top) if top >= MEDIUM_THRESHOLD && gap.is_some_and(|g| g >= AMBIGUITY_GAP) => ConfidenceBand::Medium,
        _ => ConfidenceBand::Low,
    };

    let auto_processing_allowed = confidence_band == ConfidenceBand::High && !ambiguous;

    let selected = scored.first().filter(|s| s.score > 0.0).cloned();

    let block_reason = if selected.is_none() {
        Some("no candidate template scored above zero".to_string())
    } else if ambiguous {
        Some(format!("ambiguous selection: gap {:.1} between top two candidates", gap.unwrap_or(0.0)))
    } else if confidence_band == ConfidenceBand::Low {
        Some("top candidate confidence band is LOW".to_string())
    } else {
        None
    };

    SelectionResult {
        selected,
        confidence_band,
        top_score,
        runner_up_score,
        gap,
        candidates: scored,
        ambiguous,
        auto_processing_allowed,
        block_reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_templates::types::{AuditFields, OptionalToken, SelectionConfig, VersionStatus};

    fn candidate(slug: &str, version_id: &str, required_all: Vec<&str>) -> TemplateVersion {
        candidate_with_optional(slug, version_id, required_all, Vec::new())
    }

    fn candidate_with_optional(
        slug: &str,
        version_id: &str,
        required_all: Vec<&str>,
        optional_tokens: Vec<OptionalToken>,
    ) -> TemplateVersion {
        TemplateVersion {
            version_id: version_id.to_string(),
            slug: slug.to_string(),
            spec: auditor_templates::default_template::build(),
            selection_config: SelectionConfig {
                required_tokens_all: required_all.into_iter().map(str::to_string).collect(),
                optional_tokens,
                ..Default::default()
            },
            roi_config: None,
            status: VersionStatus::Active,
            change_note: "c".to_string(),
            audit: AuditFields {
                creator: "system".to_string(),
                created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
                updated_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
            },
            fixture_pack: None,
        }
    }

    #[test]
    fn single_clear_winner_is_high_confidence_and_auto_processed() {
        let candidates = vec![candidate_with_optional(
            "alpha",
            "v1",
            vec!["jobsheet"],
            vec![OptionalToken { token: "engineer".to_string(), weight: 25.0 }],
        )];
        let weights = SignalWeights::default();
        let result = select("this is a jobsheet document signed by the engineer", &candidates, &weights);
        assert_eq!(result.confidence_band, ConfidenceBand::High);
        assert!(result.auto_processing_allowed);
        assert_eq!(result.selected.unwrap().template_id, "alpha");
    }

    #[test]
    fn no_matching_candidate_yields_low_band_and_block_reason() {
        let candidates = vec![candidate("alpha", "v1", vec!["invoice"])];
        let weights = SignalWeights::default();
        let result = select("unrelated text", &candidates, &weights);
        assert_eq!(result.confidence_band, ConfidenceBand::Low);
        assert!(result.selected.is_none());
        assert!(result.block_reason.is_some());
    }

    #[test]
    fn deterministic_ordering_breaks_ties_by_template_id() {
        let candidates = vec![
            candidate("zeta", "v1", vec!["jobsheet"]),
            candidate("alpha", "v1", vec!["jobsheet"]),
        ];
        let weights = SignalWeights::default();
        let result = select("jobsheet", &candidates, &weights);
        assert_eq!(result.candidates[0].template_id, "alpha");
        assert_eq!(result.candidates[1].template_id, "zeta");
    }
}
