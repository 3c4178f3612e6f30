//! An in-memory OCR adapter used by tests and local/offline runs.

use async_trait::async_trait;
use auditor_redaction::redact_string;
use auditor_utils::AuditError;
use chrono::Utc;

use crate::types::{
    ApiKeyValidation, OcrOptions, OcrPage, OcrProviderArtifact, OcrResult, RequestMetadata,
    ResponseMetadata,
};
use crate::OcrAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behavior {
    Success,
    ServerError,
    ClientError(u16),
}

pub struct MockOcrAdapter {
    behavior: Behavior,
    fixed_markdown: String,
}

impl MockOcrAdapter {
    #[must_use]
    pub fn always_succeeds() -> Self {
        Self {
            behavior: Behavior::Success,
            fixed_markdown: "Job Sheet\nSerial: SN-12345-AB\nSignature: Mr. John Smith".to_string(),
        }
    }

    #[must_use]
    pub fn with_markdown(markdown: impl Into<String>) -> Self {
        Self {
            behavior: Behavior::Success,
            fixed_markdown: markdown.into(),
        }
    }

    #[must_use]
    pub fn always_server_error() -> Self {
        Self { behavior: Behavior::ServerError, fixed_markdown: String::new() }
    }

    #[must_use]
    pub fn always_client_error(status: u16) -> Self {
        Self { behavior: Behavior::ClientError(status), fixed_markdown: String::new() }
    }
}

#[async_trait]
impl OcrAdapter for MockOcrAdapter {
    async fn extract_from_url(&self, _url: &str, options: &OcrOptions) -> Result<OcrResult, AuditError> {
        self.extract(options)
    }

    async fn extract_from_base64(
        &self,
        _data: &str,
        _mime: &str,
        options: &OcrOptions,
    ) -> Result<OcrResult, AuditError> {
        self.extract(options)
    }

    async fn validate_api_key(&self) -> ApiKeyValidation {
        ApiKeyValidation { valid: true, error: None }
    }

    fn get_provider_artifact(&self, result: &OcrResult, options: Option<&OcrOptions>) -> OcrProviderArtifact {
        OcrProviderArtifact {
            provider: "mock".to_string(),
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

impl MockOcrAdapter {
    fn extract(&self, options: &OcrOptions) -> Result<OcrResult, AuditError> {
        match self.behavior {
            // Per the adapter contract, 5xx/429 MUST be surfaced as an error
            // so the caller's retry/circuit-breaker layer can act on it.
            Behavior::ServerError => Err(AuditError::UpstreamServer {
                upstream: "mock-ocr".to_string(),
                status: 503,
            }),
            Behavior::ClientError(status) => Ok(OcrResult::failure(
                "mock-ocr-v1",
                format!("mock OCR returned {status}"),
                format!("HTTP_{status}"),
            )),
            Behavior::Success => {
                let markdown = if options.redact_pii {
                    redact_string(&self.fixed_markdown)
                } else {
                    self.fixed_markdown.clone()
                };
                Ok(OcrResult {
                    success: true,
                    pages: vec![OcrPage {
                        page_number: 1,
                        markdown,
                        images: None,
                        dimensions: None,
                    }],
                    total_pages: 1,
                    model: "mock-ocr-v1".to_string(),
                    correlation_id: options.correlation_id.clone(),
                    processing_time_ms: Some(5),
                    usage_info: None,
                    error: None,
                    error_code: None,
                    retry_attempts: Some(0),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_error_surfaces_as_retryable_audit_error() {
        let adapter = MockOcrAdapter::always_server_error();
        let err = adapter
            .extract_from_url("https://x", &OcrOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn client_error_returns_success_false_without_retry() {
        let adapter = MockOcrAdapter::always_client_error(404);
        let result = adapter
            .extract_from_url("https://x", &OcrOptions::default())
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.error_code.as_deref(), Some("HTTP_404"));
    }

    #[tokio::test]
    async fn redact_pii_option_scrubs_page_text() {
        let adapter = MockOcrAdapter::with_markdown("Contact: jane@example.com");
        let options = OcrOptions { redact_pii: true, ..Default::default() };
        let result = adapter.extract_from_url("https://x", &options).await.unwrap();
        assert!(!result.pages[0].markdown.contains("jane@example.com"));
    }
}
