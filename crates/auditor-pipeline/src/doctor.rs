//! Standalone adapter health check (§4.14). Calls `validateApiKey()` on the
//! configured OCR and LLM adapters and reports pass/fail per provider.
//! Deliberately narrow: never touches the template registry, the DLQ, or
//! any rate limiter, and never participates in a pipeline decision.

use crate::bundle::ServiceBundle;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct DoctorCheck {
    pub provider: &'static str,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<DoctorCheck>,
    pub all_valid: bool,
}

/// Validates every adapter wired into `bundle`, independent of whatever
/// templates or documents exist.
pub async fn run(bundle: &ServiceBundle) -> DoctorReport {
    let mut checks = Vec::new();

    let ocr_validation = bundle.ocr.validate_api_key().await;
    checks.push(DoctorCheck { provider: "ocr", valid: ocr_validation.valid, error: ocr_validation.error });

    if let Some(interpreter) = &bundle.llm_interpreter {
        let validation = interpreter.validate_api_key().await;
        checks.push(DoctorCheck { provider: "llm-interpreter", valid: validation.valid, error: validation.error });
    }

    let all_valid = checks.iter().all(|c| c.valid);
    DoctorReport { checks, all_valid }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_calibration::ThresholdLevel;
    use auditor_dlq::DeadLetterQueue;
    use auditor_llm::mock::MockLlmInterpreterAdapter;
    use auditor_ocr::mock::MockOcrAdapter;
    use auditor_resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
    use auditor_resilience::retry::RetryOptions;
    use auditor_resilience::sleeper::TokioSleeper;
    use auditor_templates::store::InMemoryRegistryStore;
    use auditor_templates::{SsotMode, TemplateRegistry};
    use std::sync::Arc;

    fn test_bundle() -> ServiceBundle {
        ServiceBundle {
            ocr: Arc::new(MockOcrAdapter::always_succeeds()),
            llm_interpreter: Some(Arc::new(MockLlmInterpreterAdapter::empty())),
            analyzer_backend: None,
            registry: Arc::new(TemplateRegistry::new(Arc::new(InMemoryRegistryStore::new()), "development", SsotMode::Permissive)),
            dlq: Arc::new(DeadLetterQueue::default()),
            ocr_breaker: Arc::new(CircuitBreaker::new("ocr", CircuitBreakerConfig::default())),
            llm_breaker: Arc::new(CircuitBreaker::new("llm", CircuitBreakerConfig::default())),
            rate_limiter: Arc::new(auditor_resilience::rate_limiter::RateLimiter::new(auditor_resilience::rate_limiter::PROCESSING)),
            retry_options: RetryOptions::default(),
            sleeper: Arc::new(TokioSleeper),
            calibration_level: ThresholdLevel::Standard,
            enable_raw_ocr_insights: false,
            artifacts_dir: camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string()),
        }
    }

    #[tokio::test]
    async fn reports_each_configured_adapter() {
        let bundle = test_bundle();
        let report = run(&bundle).await;
        assert_eq!(report.checks.len(), 2);
        assert!(report.all_valid);
    }

    #[tokio::test]
    async fn omits_llm_check_when_not_configured() {
        let mut bundle = test_bundle();
        bundle.llm_interpreter = None;
        let report = run(&bundle).await;
        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].provider, "ocr");
    }
}
