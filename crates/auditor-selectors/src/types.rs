//! Selection data model (§3, §4.10).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionScore {
    pub template_id: String,
    pub version_id: String,
    pub score: f64,
    pub matched_tokens: Vec<String>,
    pub missing_required: Vec<String>,
    pub confidence_band: ConfidenceBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub selected: Option<SelectionScore>,
    pub confidence_band: ConfidenceBand,
    pub top_score: Option<f64>,
    pub runner_up_score: Option<f64>,
    pub gap: Option<f64>,
    pub candidates: Vec<SelectionScore>,
    pub ambiguous: bool,
    pub auto_processing_allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalWeights {
    pub version: String,
    pub effective_at: chrono::DateTime<chrono::Utc>,
    pub token_weight: f64,
    pub layout_weight: f64,
    pub roi_weight: f64,
    pub plausibility_weight: f64,
}

pub const SIGNAL_WEIGHTS_VERSION: &str = "2026-01-selection-weights-v1";

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            version: SIGNAL_WEIGHTS_VERSION.to_string(),
            effective_at: chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"),
            token_weight: 0.40,
            layout_weight: 0.20,
            roi_weight: 0.25,
            plausibility_weight: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSignals {
    pub token_count: usize,
    pub token_sample: Vec<String>,
    pub document_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionTrace {
    pub artifact_version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub document_id: String,
    pub input_signals: InputSignals,
    pub outcome: SelectionResult,
    pub candidates: Vec<SelectionScore>,
    pub weights_used: SignalWeights,
}
