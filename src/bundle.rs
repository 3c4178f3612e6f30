//! `ServiceBundle` construction point (§1.1, §9 "Global mutable state"):
//! selects every adapter implementation and process-wide collaborator once,
//! from [`Config`], and wires them into a single [`auditor_pipeline::ServiceBundle`].
//! Business logic never reaches for a provider by name again after this point.

use crate::config::Config;
use anyhow::{anyhow, Context, Result};
use auditor_analyzer::{AnalyzerBackend, MockAnalyzerBackend};
use auditor_dlq::DeadLetterQueue;
use auditor_llm::http::HttpLlmInterpreterAdapter;
use auditor_llm::mock::MockLlmInterpreterAdapter;
use auditor_llm::LlmInterpreterAdapter;
use auditor_ocr::http::HttpOcrAdapter;
use auditor_ocr::mock::MockOcrAdapter;
use auditor_ocr::OcrAdapter;
use auditor_pipeline::ServiceBundle;
use auditor_resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use auditor_resilience::rate_limiter::{RateLimiter, PROCESSING};
use auditor_resilience::retry::RetryOptions;
use auditor_resilience::sleeper::TokioSleeper;
use auditor_templates::{FileRegistryStore, InMemoryRegistryStore, RegistryStore, TemplateRegistry};
use std::env;
use std::sync::Arc;

/// Builds the process-wide `ServiceBundle` from `config`. Called once at
/// start-up by every CLI subcommand that touches the pipeline.
///
/// # Errors
/// Returns an error if a file-backed registry store cannot be opened, or if
/// an HTTP-backed adapter is selected without its required credentials.
pub fn build_bundle(config: &Config) -> Result<ServiceBundle> {
    let dlq = Arc::new(DeadLetterQueue::default());

    let store: Arc<dyn RegistryStore> = match &config.registry_path {
        Some(path) => {
            let utf8_path = camino::Utf8PathBuf::from_path_buf(path.clone())
                .map_err(|p| anyhow!("registry path is not valid UTF-8: {}", p.display()))?;
            Arc::new(
                FileRegistryStore::new(&utf8_path)
                    .with_context(|| format!("failed to open registry store at {utf8_path}"))?,
            )
        }
        None => Arc::new(InMemoryRegistryStore::new()),
    };
    let registry = Arc::new(TemplateRegistry::new(store, config.app_env.clone(), config.ssot_mode_override));

    let ocr: Arc<dyn OcrAdapter> = match config.ocr_provider.as_str() {
        "mock" => Arc::new(MockOcrAdapter::always_succeeds()),
        "http" => {
            let api_key = env::var("OCR_API_KEY").map_err(|_| anyhow!("OCR_API_KEY must be set when OCR_PROVIDER=http"))?;
            let endpoint = env::var("OCR_ENDPOINT").unwrap_or_else(|_| "https://api.mistral.ai/v1/ocr".to_string());
            Arc::new(HttpOcrAdapter::new(api_key, endpoint, Some(dlq.clone())))
        }
        other => return Err(anyhow!("unknown OCR_PROVIDER '{other}' (expected mock|http)")),
    };

    let llm_interpreter: Option<Arc<dyn LlmInterpreterAdapter>> = match config.interpreter_provider.as_str() {
        "none" => None,
        "mock" => Some(Arc::new(MockLlmInterpreterAdapter::empty())),
        "http" => {
            let api_key =
                env::var("INTERPRETER_API_KEY").map_err(|_| anyhow!("INTERPRETER_API_KEY must be set when INTERPRETER_PROVIDER=http"))?;
            let endpoint = env::var("INTERPRETER_ENDPOINT").unwrap_or_else(|_| "https://api.anthropic.com/v1/messages".to_string());
            let model = env::var("INTERPRETER_MODEL").unwrap_or_else(|_| "claude-3-5-haiku-latest".to_string());
            Some(Arc::new(HttpLlmInterpreterAdapter::new(api_key, endpoint, model, config.enable_raw_ocr_insights)))
        }
        other => return Err(anyhow!("unknown INTERPRETER_PROVIDER '{other}' (expected none|mock|http)")),
    };

    // No HTTP-backed canonical analyzer exists yet; only the deterministic
    // mock is available as an opt-in alternative to the rule-based fallback.
    let analyzer_backend: Option<Arc<dyn AnalyzerBackend>> = match env::var("ANALYZER_BACKEND").as_deref() {
        Ok("mock") => Some(Arc::new(MockAnalyzerBackend)),
        _ => None,
    };

    let ocr_breaker = Arc::new(CircuitBreaker::new(
        "ocr",
        CircuitBreakerConfig {
            failure_threshold: config.resilience.breaker.failure_threshold,
            reset_timeout_ms: config.resilience.breaker.reset_timeout_ms,
            half_open_requests: 1,
        },
    ));
    let llm_breaker = Arc::new(CircuitBreaker::new(
        "llm-interpreter",
        CircuitBreakerConfig {
            failure_threshold: config.resilience.breaker.failure_threshold,
            reset_timeout_ms: config.resilience.breaker.reset_timeout_ms,
            half_open_requests: 1,
        },
    ));

    let retry_options = RetryOptions {
        max_retries: config.resilience.retry.max_retries,
        base_delay_ms: config.resilience.retry.base_delay_ms,
        max_delay_ms: config.resilience.retry.max_delay_ms,
        ..RetryOptions::default()
    };

    let artifacts_dir = camino::Utf8PathBuf::from_path_buf(config.artifacts_dir.clone())
        .map_err(|path| anyhow!("artifacts directory path is not valid UTF-8: {}", path.display()))?;

    Ok(ServiceBundle {
        ocr,
        llm_interpreter,
        analyzer_backend,
        registry,
        dlq,
        ocr_breaker,
        llm_breaker,
        rate_limiter: Arc::new(RateLimiter::new(PROCESSING)),
        retry_options,
        sleeper: Arc::new(TokioSleeper),
        calibration_level: config.calibration_level,
        enable_raw_ocr_insights: config.enable_raw_ocr_insights,
        artifacts_dir,
    })
}
