//! OCR adapter contract (§4.7): pluggable extraction over a remote OCR
//! provider. The concrete implementation is selected once at process start
//! from config and used as a trait object for the lifetime of the process.

pub mod http;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use auditor_utils::AuditError;
use types::{ApiKeyValidation, OcrOptions, OcrProviderArtifact, OcrResult};

#[async_trait]
pub trait OcrAdapter: Send + Sync {
    async fn extract_from_url(&self, url: &str, options: &OcrOptions) -> Result<OcrResult, AuditError>;

    async fn extract_from_base64(
        &self,
        data: &str,
        mime: &str,
        options: &OcrOptions,
    ) -> Result<OcrResult, AuditError>;

    async fn validate_api_key(&self) -> ApiKeyValidation;

    /// Build the metadata-only provider artifact for a completed call.
    /// Implementations MUST NOT include any extracted page text here.
    fn get_provider_artifact(&self, result: &OcrResult, options: Option<&OcrOptions>) -> OcrProviderArtifact;
}
