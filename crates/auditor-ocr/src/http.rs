//! HTTP-backed OCR adapter shaped after a Mistral-style document OCR API.

use async_trait::async_trait;
use auditor_dlq::{DeadLetterQueue, JobError, NewFailedJob, Stage};
use auditor_redaction::redact_string;
use auditor_utils::AuditError;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::types::{
    ApiKeyValidation, OcrOptions, OcrPage, OcrProviderArtifact, OcrResult, RequestMetadata,
    ResponseMetadata, UsageInfo,
};
use crate::OcrAdapter;

#[derive(Debug, Deserialize)]
struct MistralOcrPage {
    index: u32,
    markdown: String,
}

#[derive(Debug, Deserialize)]
struct MistralOcrResponse {
    pages: Vec<MistralOcrPage>,
    model: String,
    usage_info: Option<MistralUsage>,
}

#[derive(Debug, Deserialize)]
struct MistralUsage {
    pages_processed: u32,
    doc_size_bytes: Option<u64>,
}

pub struct HttpOcrAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
    dlq: Option<Arc<DeadLetterQueue>>,
}

impl HttpOcrAdapter {
    #[must_use]
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, dlq: Option<Arc<DeadLetterQueue>>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .expect("failed to build OCR HTTP client"),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            dlq,
        }
    }

    async fn call(&self, body: serde_json::Value, options: &OcrOptions) -> Result<OcrResult, AuditError> {
        let start = Instant::now();
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .timeout(Duration::from_secs(120))
            .send()
            .await
            .map_err(|e| AuditError::Transport {
                upstream: "ocr".to_string(),
                message: redact_string(&e.to_string()),
            })?;

        let status = response.status();

        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            if let Some(dlq) = &self.dlq {
                if let Some(job_sheet_id) = &options.job_sheet_id {
                    dlq.add(NewFailedJob {
                        document_id: job_sheet_id.clone(),
                        correlation_id: options.correlation_id.clone(),
                        stage: Stage::Ocr,
                        error: JobError {
                            message: format!("OCR upstream returned {status}"),
                            code: Some(status.as_u16().to_string()),
                        },
                        max_attempts: 3,
                        metadata: serde_json::Map::new(),
                    });
                }
            }
            return Err(AuditError::UpstreamServer {
                upstream: "ocr".to_string(),
                status: status.as_u16(),
            });
        }

        if status.is_client_error() {
            return Ok(OcrResult::failure(
                "mistral-ocr",
                format!("OCR upstream returned client error {status}"),
                format!("HTTP_{}", status.as_u16()),
            ));
        }

        let parsed: MistralOcrResponse = response.json().await.map_err(|e| AuditError::Contract {
            upstream: "ocr".to_string(),
            reason: redact_string(&e.to_string()),
        })?;

        let mut pages: Vec<OcrPage> = parsed
            .pages
            .into_iter()
            .map(|p| OcrPage {
                page_number: p.index + 1,
                markdown: if options.redact_pii { redact_string(&p.markdown) } else { p.markdown },
                images: None,
                dimensions: None,
            })
            .collect();

        if let Some(limit) = options.page_limit {
            pages.truncate(limit as usize);
        }

        Ok(OcrResult {
            success: true,
            total_pages: pages.len() as u32,
            pages,
            model: parsed.model,
            correlation_id: options.correlation_id.clone(),
            processing_time_ms: Some(start.elapsed().as_millis() as u64),
            usage_info: parsed.usage_info.map(|u| UsageInfo {
                pages_processed: u.pages_processed,
                tokens_generated: u.doc_size_bytes,
            }),
            error: None,
            error_code: None,
            retry_attempts: Some(0),
        })
    }
}

#[async_trait]
impl OcrAdapter for HttpOcrAdapter {
    async fn extract_from_url(&self, url: &str, options: &OcrOptions) -> Result<OcrResult, AuditError> {
        self.call(
            serde_json::json!({"document": {"type": "document_url", "document_url": url}}),
            options,
        )
        .await
    }

    async fn extract_from_base64(
        &self,
        data: &str,
        mime: &str,
        options: &OcrOptions,
    ) -> Result<OcrResult, AuditError> {
        self.call(
            serde_json::json!({"document": {"type": "document_base64", "mime_type": mime, "data": data}}),
            options,
        )
        .await
    }

    async fn validate_api_key(&self) -> ApiKeyValidation {
        match self.client.get(&self.endpoint).bearer_auth(&self.api_key).send().await {
            Ok(resp) if resp.status() != StatusCode::UNAUTHORIZED && resp.status() != StatusCode::FORBIDDEN => {
                ApiKeyValidation { valid: true, error: None }
            }
            Ok(resp) => ApiKeyValidation {
                valid: false,
                error: Some(format!("authentication check failed: {}", resp.status())),
            },
            Err(e) => ApiKeyValidation { valid: false, error: Some(redact_string(&e.to_string())) },
        }
    }

    fn get_provider_artifact(&self, result: &OcrResult, options: Option<&OcrOptions>) -> OcrProviderArtifact {
        OcrProviderArtifact {
            provider: "mistral".to_string(),
            model: result.model.clone(),
            timestamp: Utc::now(),
            correlation_id: result.correlation_id.clone(),
            request_metadata: RequestMetadata {
                document_type: "job_sheet".to_string(),
                page_limit: options.and_then(|o| o.page_limit),
                image_limit: options.and_then(|o| o.image_limit),
            },
            response_metadata: ResponseMetadata {
                status_code: if result.success { 200 } else { 400 },
                processing_time_ms: result.processing_time_ms.unwrap_or(0),
                pages_processed: result.total_pages,
                tokens_generated: result.usage_info.as_ref().and_then(|u| u.tokens_generated),
            },
        }
    }
}
