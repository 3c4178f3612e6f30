//! HTTP-backed interpreter adapter shaped after a Gemini-style generate API.

use async_trait::async_trait;
use auditor_redaction::redact_string;
use auditor_utils::AuditError;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};

use crate::types::{
    ApiKeyValidation, Insight, InsightsArtifact, InsightsMetadata, InterpretInput, InterpretOptions,
    InterpretationResult,
};
use crate::{apply_insight_limits, raw_ocr_forwarding_allowed, LlmInterpreterAdapter};

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

/// Parsed insight line from the model's structured text response, shaped
/// `confidence|field|message`.
fn parse_insights(text: &str) -> Vec<Insight> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let mut parts = line.splitn(3, '|');
            let confidence: f64 = parts.next()?.trim().parse().ok()?;
            let field = parts.next()?.trim();
            let message = parts.next()?.trim();
            Some(Insight {
                id: format!("insight-{idx}"),
                message: message.to_string(),
                confidence,
                related_field: if field.is_empty() { None } else { Some(field.to_string()) },
            })
        })
        .collect()
}

pub struct HttpLlmInterpreterAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    process_raw_ocr_flag_enabled: bool,
}

impl HttpLlmInterpreterAdapter {
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        process_raw_ocr_flag_enabled: bool,
    ) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build LLM HTTP client"),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            process_raw_ocr_flag_enabled,
        }
    }
}

#[async_trait]
impl LlmInterpreterAdapter for HttpLlmInterpreterAdapter {
    async fn interpret(
        &self,
        input: &InterpretInput,
        options: &InterpretOptions,
    ) -> Result<InterpretationResult, AuditError> {
        let include_raw_ocr = raw_ocr_forwarding_allowed(options, self.process_raw_ocr_flag_enabled);
        let mut prompt_sections = Vec::new();
        if let Some(report) = &input.audit_report {
            prompt_sections.push(serde_json::to_string(report).unwrap_or_default());
        }
        if let Some(fields) = &input.extracted_fields {
            prompt_sections.push(fields.to_string());
        }
        if include_raw_ocr {
            if let Some(raw) = &input.raw_ocr_text {
                prompt_sections.push(raw.clone());
            }
        }

        let start = Instant::now();
        let response = self
            .client
            .post(format!("{}?key={}", self.endpoint, self.api_key))
            .json(&serde_json::json!({
                "contents": [{"parts": [{"text": prompt_sections.join("\n\n")}]}]
            }))
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| AuditError::Transport {
                upstream: "llm".to_string(),
                message: redact_string(&e.to_string()),
            })?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AuditError::UpstreamServer { upstream: "llm".to_string(), status: status.as_u16() });
        }
        if status.is_client_error() {
            return Err(AuditError::UpstreamClient { upstream: "llm".to_string(), status: status.as_u16() });
        }

        let parsed: GeminiResponse = response.json().await.map_err(|e| AuditError::Contract {
            upstream: "llm".to_string(),
            reason: redact_string(&e.to_string()),
        })?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .unwrap_or_default();

        let insights = apply_insight_limits(parse_insights(&text), options.min_confidence, options.max_insights);

        Ok(InterpretationResult {
            insights,
            model: self.model.clone(),
            processing_time_ms: Some(start.elapsed().as_millis() as u64),
        })
    }

    async fn validate_api_key(&self) -> ApiKeyValidation {
        match self
            .client
            .get(format!("{}?key={}", self.endpoint, self.api_key))
            .send()
            .await
        {
            Ok(resp) if resp.status() != StatusCode::UNAUTHORIZED => ApiKeyValidation { valid: true, error: None },
            Ok(resp) => ApiKeyValidation {
                valid: false,
                error: Some(format!("authentication check failed: {}", resp.status())),
            },
            Err(e) => ApiKeyValidation { valid: false, error: Some(redact_string(&e.to_string())) },
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pipe_delimited_insight_lines() {
        let text = "0.91|serialNumber|serial looks faint, re-scan recommended\n0.4|signature|ambiguous match";
        let insights = parse_insights(text);
        assert_eq!(insights.len(), 2);
        assert_eq!(insights[0].related_field.as_deref(), Some("serialNumber"));
        assert!((insights[0].confidence - 0.91).abs() < f64::EPSILON);
    }

    #[test]
    fn skips_malformed_lines() {
        let text = "not a valid line\n0.5|field|ok message";
        let insights = parse_insights(text);
        assert_eq!(insights.len(), 1);
    }
}
