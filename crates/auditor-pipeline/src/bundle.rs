//! `ServiceBundle` (§4.13, §5): every process-wide collaborator the
//! orchestrator threads through a single document's processing. Adapters
//! and backends are selected once at process start (§9) and shared as
//! `Arc<dyn Trait>` across concurrently-processed documents.

use auditor_analyzer::AnalyzerBackend;
use auditor_calibration::ThresholdLevel;
use auditor_dlq::DeadLetterQueue;
use auditor_llm::LlmInterpreterAdapter;
use auditor_ocr::OcrAdapter;
use auditor_resilience::circuit_breaker::CircuitBreaker;
use auditor_resilience::rate_limiter::RateLimiter;
use auditor_resilience::retry::RetryOptions;
use auditor_resilience::sleeper::Sleeper;
use auditor_templates::TemplateRegistry;
use std::sync::Arc;

pub struct ServiceBundle {
    pub ocr: Arc<dyn OcrAdapter>,
    pub llm_interpreter: Option<Arc<dyn LlmInterpreterAdapter>>,
    pub analyzer_backend: Option<Arc<dyn AnalyzerBackend>>,
    pub registry: Arc<TemplateRegistry>,
    pub dlq: Arc<DeadLetterQueue>,
    pub ocr_breaker: Arc<CircuitBreaker>,
    pub llm_breaker: Arc<CircuitBreaker>,
    pub rate_limiter: Arc<RateLimiter>,
    pub retry_options: RetryOptions,
    pub sleeper: Arc<dyn Sleeper>,
    pub calibration_level: ThresholdLevel,
    pub enable_raw_ocr_insights: bool,
    pub artifacts_dir: camino::Utf8PathBuf,
}
