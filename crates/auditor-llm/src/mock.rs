//! An in-memory interpreter adapter used by tests and offline runs.

use async_trait::async_trait;
use chrono::Utc;

use crate::types::{
    ApiKeyValidation, Insight, InsightsArtifact, InsightsMetadata, InterpretInput, InterpretOptions,
    InterpretationResult,
};
use crate::{apply_insight_limits, LlmInterpreterAdapter};
use auditor_utils::AuditError;

pub struct MockLlmInterpreterAdapter {
    canned_insights: Vec<Insight>,
}

impl MockLlmInterpreterAdapter {
    #[must_use]
    pub fn with_insights(canned_insights: Vec<Insight>) -> Self {
        Self { canned_insights }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self { canned_insights: Vec::new() }
    }
}

#[async_trait]
impl LlmInterpreterAdapter for MockLlmInterpreterAdapter {
    async fn interpret(
        &self,
        _input: &InterpretInput,
        options: &InterpretOptions,
    ) -> Result<InterpretationResult, AuditError> {
        let filtered = apply_insight_limits(
            self.canned_insights.clone(),
            options.min_confidence,
            options.max_insights,
        );
        Ok(InterpretationResult {
            insights: filtered,
            model: "mock-interpreter-v1".to_string(),
            processing_time_ms: Some(3),
        })
    }

    async fn validate_api_key(&self) -> ApiKeyValidation {
        ApiKeyValidation { valid: true, error: None }
    }

    fn generate_artifact(
        &self,
        result: &InterpretationResult,
        input_artifacts: &[String],
        correlation_id: Option<String>,
    ) -> InsightsArtifact {
        InsightsArtifact {
            version: "1.0.0".to_string(),
            generated_at: Utc::now(),
            correlation_id,
            model: result.model.clone(),
            is_advisory_only: true,
            insights: result.insights.clone(),
            summary: None,
            metadata: InsightsMetadata {
                processing_ms: result.processing_time_ms.unwrap_or(0),
                input_artifacts: input_artifacts.to_vec(),
            },
        }
    }
}
