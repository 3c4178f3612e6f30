//! Wire-facing types for the OCR adapter contract (§4.7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageDimensions {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: u32,
    pub markdown: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<PageDimensions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageInfo {
    pub pages_processed: u32,
    pub tokens_generated: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub success: bool,
    pub pages: Vec<OcrPage>,
    pub total_pages: u32,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_info: Option<UsageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_attempts: Option<u32>,
}

impl OcrResult {
    #[must_use]
    pub fn failure(model: impl Into<String>, error: impl Into<String>, error_code: impl Into<String>) -> Self {
        Self {
            success: false,
            pages: Vec::new(),
            total_pages: 0,
            model: model.into(),
            correlation_id: None,
            processing_time_ms: None,
            usage_info: None,
            error: Some(error.into()),
            error_code: Some(error_code.into()),
            retry_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OcrOptions {
    pub include_image_locations: bool,
    pub image_limit: Option<u32>,
    pub page_limit: Option<u32>,
    /// Document/job identifier used for DLQ attribution when the call fails.
    pub job_sheet_id: Option<String>,
    pub skip_retry: bool,
    /// When set, pages are PII-redacted before being returned to the caller.
    pub redact_pii: bool,
    pub correlation_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub document_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub status_code: u16,
    pub processing_time_ms: u64,
    pub pages_processed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_generated: Option<u64>,
}

/// Metadata-only artifact describing an OCR call. MUST NEVER contain the
/// extracted page text itself (§4.7 contract invariant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrProviderArtifact {
    pub provider: String,
    pub model: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub request_metadata: RequestMetadata,
    pub response_metadata: ResponseMetadata,
}

#[derive(Debug, Clone)]
pub struct ApiKeyValidation {
    pub valid: bool,
    pub error: Option<String>,
}
