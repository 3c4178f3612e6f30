//! LLM interpreter adapter contract (§4.8): produces advisory insights that
//! MUST NEVER influence the canonical `AuditReport`. Selected once at
//! process start from config, like the OCR adapter.

pub mod http;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use auditor_utils::AuditError;
use types::{ApiKeyValidation, InsightsArtifact, InterpretInput, InterpretOptions, InterpretationResult};

#[async_trait]
pub trait LlmInterpreterAdapter: Send + Sync {
    async fn interpret(
        &self,
        input: &InterpretInput,
        options: &InterpretOptions,
    ) -> Result<InterpretationResult, AuditError>;

    async fn validate_api_key(&self) -> ApiKeyValidation;

    fn generate_artifact(
        &self,
        result: &InterpretationResult,
        input_artifacts: &[String],
        correlation_id: Option<String>,
    ) -> InsightsArtifact;
}

/// Filter by `minConfidence` then clamp to `maxInsights` (§4.8). Applied by
/// every adapter implementation on the raw interpretation result before it
/// is returned to the caller.
#[must_use]
pub fn apply_insight_limits(
    mut insights: Vec<types::Insight>,
    min_confidence: Option<f64>,
    max_insights: Option<u32>,
) -> Vec<types::Insight> {
    if let Some(min) = min_confidence {
        insights.retain(|i| i.confidence >= min);
    }
    if let Some(max) = max_insights {
        insights.truncate(max as usize);
    }
    insights
}

/// Whether raw OCR text may be included in an upstream interpret call: both
/// the per-call option and the process-level flag must agree (§4.8).
#[must_use]
pub fn raw_ocr_forwarding_allowed(options: &InterpretOptions, process_flag_enabled: bool) -> bool {
    options.include_raw_ocr && process_flag_enabled
}
