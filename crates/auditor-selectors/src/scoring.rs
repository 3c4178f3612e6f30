//! Per-candidate scoring (§4.10).

use crate::types::SignalWeights;
use auditor_templates::types::SelectionConfig;
use regex::Regex;
use std::collections::HashSet;

const FORM_CODE_BONUS: f64 = 30.0;
/// Base contribution once every configured required-token condition is
/// satisfied. Chosen so required-contribution + form-code bonus + maximum
/// optional-token weight stays within the `[0,100]` ceiling (§4.10).
const REQUIRED_CONTRIBUTION: f64 = 60.0;

#[derive(Debug, Clone, Default)]
pub struct TokenScoreResult {
    pub score: f64,
    pub matched_tokens: Vec<String>,
    pub missing_required: Vec<String>,
}

/// Fail-closed token scoring for a single candidate (§4.10): missing any
/// `requiredTokensAll` or, when `requiredTokensAny` is non-empty, matching
/// none of it, forces score 0. Otherwise the form-code bonus and weighted
/// optional-token contributions accumulate, clamped to `[0,100]`.
#[must_use]
pub fn score_tokens(document_text: &str, tokens: &[String], config: &SelectionConfig) -> TokenScoreResult {
    let token_set: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    let missing_required: Vec<String> = config
        .required_tokens_all
        .iter()
        .filter(|t| !token_set.contains(t.as_str()))
        .cloned()
        .collect();

    if !missing_required.is_empty() {
        return TokenScoreResult { score: 0.0, matched_tokens: Vec::new(), missing_required };
    }

    if !config.required_tokens_any.is_empty()
        && !config.required_tokens_any.iter().any(|t| token_set.contains(t.as_str()))
    {
        return TokenScoreResult { score: 0.0, matched_tokens: Vec::new(), missing_required: Vec::new() };
    }

    let mut matched_tokens: Vec<String> = config
        .required_tokens_all
        .iter()
        .chain(config.required_tokens_any.iter().filter(|t| token_set.contains(t.as_str())))
        .cloned()
        .collect();

    let mut score = if config.required_tokens_all.is_empty() && config.required_tokens_any.is_empty() {
        0.0
    } else {
        REQUIRED_CONTRIBUTION
    };
    if let Some(pattern) = &config.form_code_regex {
        if let Ok(re) = Regex::new(pattern) {
            if re.is_match(document_text) {
                score += FORM_CODE_BONUS;
            }
        }
    }

    for optional in &config.optional_tokens {
        if token_set.contains(optional.token.as_str()) {
            score += optional.weight;
            matched_tokens.push(optional.token.clone());
        }
    }

    TokenScoreResult { score: score.clamp(0.0, 100.0), matched_tokens, missing_required: Vec::new() }
}

/// Combines available signals by their configured weights (§4.10). Absent
/// signals (layout/roi/plausibility are not yet computed by any adapter in
/// this codebase) are excluded and the remaining weights renormalized so the
/// combined score still lies in `[0,100]`.
#[must_use]
pub fn combine_signals(
    token_score: f64,
    layout_score: Option<f64>,
    roi_score: Option<f64>,
    plausibility_score: Option<f64>,
    weights: &SignalWeights,
) -> f64 {
    let mut weighted_sum = weights.token_weight * token_score;
    let mut weight_total = weights.token_weight;

    if let Some(layout) = layout_score {
        weighted_sum += weights.layout_weight * layout;
        weight_total += weights.layout_weight;
    }
    if let Some(roi) = roi_score {
        weighted_sum += weights.roi_weight * roi;
        weight_total += weights.roi_weight;
    }
    if let Some(plausibility) = plausibility_score {
        weighted_sum += weights.plausibility_weight * plausibility;
        weight_total += weights.plausibility_weight;
    }

    if weight_total <= 0.0 {
        return 0.0;
    }
    (weighted_sum / weight_total).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_templates::types::OptionalToken;

    #[test]
    fn missing_required_all_fails_closed() {
        let config = SelectionConfig {
            required_tokens_all: vec!["jobsheet".to_string()],
            ..Default::default()
        };
        let result = score_tokens("irrelevant", &["other".to_string()], &config);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.missing_required, vec!["jobsheet"]);
    }

    #[test]
    fn required_any_none_matched_fails_closed() {
        let config = SelectionConfig {
            required_tokens_any: vec!["invoice".to_string(), "receipt".to_string()],
            ..Default::default()
        };
        let result = score_tokens("irrelevant", &["jobsheet".to_string()], &config);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn form_code_and_optional_tokens_accumulate_and_clamp() {
        let config = SelectionConfig {
            required_tokens_all: vec!["jobsheet".to_string()],
            optional_tokens: vec![
                OptionalToken { token: "engineer".to_string(), weight: 50.0 },
                OptionalToken { token: "signature".to_string(), weight: 50.0 },
            ],
            form_code_regex: Some(r"FORM-\d{4}".to_string()),
            ..Default::default()
        };
        let result = score_tokens(
            "FORM-1234",
            &["jobsheet".to_string(), "engineer".to_string(), "signature".to_string()],
            &config,
        );
        assert_eq!(result.score, 100.0);
    }

    #[test]
    fn combine_signals_renormalizes_when_signals_missing() {
        let weights = SignalWeights::default();
        let combined = combine_signals(80.0, None, None, None, &weights);
        assert!((combined - 80.0).abs() < 1e-9);
    }

    #[test]
    fn combine_signals_weights_all_four() {
        let weights = SignalWeights::default();
        let combined = combine_signals(100.0, Some(100.0), Some(100.0), Some(100.0), &weights);
        assert!((combined - 100.0).abs() < 1e-9);
    }
}
