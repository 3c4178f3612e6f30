//! End-to-end coverage of `process_document` against a handful of concrete
//! documents: happy path, a rejected field format, an ambiguous selection,
//! OCR retry-then-success, circuit-breaker trip, and advisory-interpreter
//! invariance. Each test builds its own `ServiceBundle` from scratch so the
//! scenarios never share breaker/rate-limiter/registry state.

use async_trait::async_trait;
use auditor_analyzer::types::{OverallResult, ReasonCode};
use auditor_calibration::ThresholdLevel;
use auditor_dlq::{DeadLetterQueue, Stage};
use auditor_llm::mock::MockLlmInterpreterAdapter;
use auditor_ocr::types::{
    ApiKeyValidation, OcrOptions, OcrPage, OcrProviderArtifact, OcrResult, RequestMetadata, ResponseMetadata,
};
use auditor_ocr::OcrAdapter;
use auditor_pipeline::cancel::Cancel;
use auditor_pipeline::{OcrSource, PipelineInput, ServiceBundle};
use auditor_resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use auditor_resilience::rate_limiter::{RateLimiter, PROCESSING};
use auditor_resilience::retry::RetryOptions;
use auditor_resilience::sleeper::RecordingSleeper;
use auditor_templates::store::InMemoryRegistryStore;
use auditor_templates::types::{AuditFields, OptionalToken, SelectionConfig, Template, TemplateVersion, VersionStatus};
use auditor_templates::{SsotMode, TemplateRegistry};
use auditor_utils::AuditError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// A scripted OCR adapter: fails its first `fail_times` calls with a
/// retryable 502, then returns `pages` on every call after. Unlike
/// `MockOcrAdapter`, it never runs PII redaction, so test documents can use
/// realistic-looking dates without the `date_of_birth` pattern mangling
/// them.
struct ScriptedOcrAdapter {
    calls: AtomicU32,
    fail_times: u32,
    always_fail: bool,
    pages: Vec<OcrPage>,
}

impl ScriptedOcrAdapter {
    fn succeeds_once(pages: Vec<OcrPage>) -> Self {
        Self { calls: AtomicU32::new(0), fail_times: 0, always_fail: false, pages }
    }

    fn fails_then_succeeds(pages: Vec<OcrPage>, fail_times: u32) -> Self {
        Self { calls: AtomicU32::new(0), fail_times, always_fail: false, pages }
    }

    fn always_fails() -> Self {
        Self { calls: AtomicU32::new(0), fail_times: 0, always_fail: true, pages: Vec::new() }
    }

    fn extract(&self) -> Result<OcrResult, AuditError> {
        if self.always_fail {
            return Err(AuditError::UpstreamServer { upstream: "ocr".to_string(), status: 502 });
        }
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_times {
            return Err(AuditError::UpstreamServer { upstream: "ocr".to_string(), status: 502 });
        }
        Ok(OcrResult {
            success: true,
            pages: self.pages.clone(),
            total_pages: self.pages.len() as u32,
            model: "scripted-ocr-v1".to_string(),
            correlation_id: None,
            processing_time_ms: Some(5),
            usage_info: None,
            error: None,
            error_code: None,
            retry_attempts: Some(self.fail_times),
        })
    }
}

#[async_trait]
impl OcrAdapter for ScriptedOcrAdapter {
    async fn extract_from_url(&self, _url: &str, _options: &OcrOptions) -> Result<OcrResult, AuditError> {
        self.extract()
    }

    async fn extract_from_base64(
        &self,
        _data: &str,
        _mime: &str,
        _options: &OcrOptions,
    ) -> Result<OcrResult, AuditError> {
        self.extract()
    }

    async fn validate_api_key(&self) -> ApiKeyValidation {
        ApiKeyValidation { valid: true, error: None }
    }

    fn get_provider_artifact(&self, result: &OcrResult, _options: Option<&OcrOptions>) -> OcrProviderArtifact {
        OcrProviderArtifact {
            provider: "scripted".to_string(),
            model: result.model.clone(),
            timestamp: chrono::Utc::now(),
            correlation_id: result.correlation_id.clone(),
            request_metadata: RequestMetadata { document_type: "job_sheet".to_string(), page_limit: None, image_limit: None },
            response_metadata: ResponseMetadata {
                status_code: if result.success { 200 } else { 400 },
                processing_time_ms: result.processing_time_ms.unwrap_or(0),
                pages_processed: result.total_pages,
                tokens_generated: None,
            },
        }
    }
}

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(0, 0).unwrap()
}

fn single_page(markdown: impl Into<String>) -> Vec<OcrPage> {
    vec![OcrPage { page_number: 1, markdown: markdown.into(), images: None, dimensions: None }]
}

/// A high-scoring active template: `jobsheet` is required, `stamped` is an
/// optional token worth enough to clear the HIGH confidence band on its own
/// (§4.10's single-candidate band ceiling means `requiredTokensAll` alone
/// only reaches 60).
fn high_confidence_template(slug: &str, optional_weight: f64, optional_token: &str) -> TemplateVersion {
    TemplateVersion {
        version_id: "v1".to_string(),
        slug: slug.to_string(),
        spec: auditor_templates::default_template::build(),
        selection_config: SelectionConfig {
            required_tokens_all: vec!["jobsheet".to_string()],
            required_tokens_any: Vec::new(),
            optional_tokens: vec![OptionalToken { token: optional_token.to_string(), weight: optional_weight }],
            form_code_regex: None,
        },
        roi_config: None,
        status: VersionStatus::Active,
        change_note: "test fixture".to_string(),
        audit: AuditFields { creator: "test".to_string(), created_at: epoch(), updated_at: epoch() },
        fixture_pack: None,
    }
}

fn registry_with(versions: Vec<TemplateVersion>) -> Arc<TemplateRegistry> {
    let registry = TemplateRegistry::new(Arc::new(InMemoryRegistryStore::new()), "development", SsotMode::Permissive);
    for version in versions {
        registry.put(&Template { slug: version.slug.clone(), versions: vec![version] }).unwrap();
    }
    Arc::new(registry)
}

fn auto_init_registry() -> Arc<TemplateRegistry> {
    Arc::new(TemplateRegistry::new(Arc::new(InMemoryRegistryStore::new()), "development", SsotMode::Permissive))
}

fn artifacts_dir() -> camino::Utf8PathBuf {
    camino::Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().to_string())
}

#[allow(clippy::too_many_arguments)]
fn bundle(
    ocr: Arc<dyn OcrAdapter>,
    registry: Arc<TemplateRegistry>,
    interpreter: Option<Arc<dyn auditor_llm::LlmInterpreterAdapter>>,
    retry_options: RetryOptions,
    breaker_config: CircuitBreakerConfig,
) -> ServiceBundle {
    ServiceBundle {
        ocr,
        llm_interpreter: interpreter,
        analyzer_backend: None,
        registry,
        dlq: Arc::new(DeadLetterQueue::default()),
        ocr_breaker: Arc::new(CircuitBreaker::new("ocr", breaker_config)),
        llm_breaker: Arc::new(CircuitBreaker::new("llm", CircuitBreakerConfig::default())),
        rate_limiter: Arc::new(RateLimiter::new(PROCESSING)),
        retry_options,
        sleeper: Arc::new(RecordingSleeper::new()),
        calibration_level: ThresholdLevel::Standard,
        enable_raw_ocr_insights: false,
        artifacts_dir: artifacts_dir(),
    }
}

fn happy_path_document() -> &'static str {
    "This jobsheet was completed and stamped during a scheduled site visit and reviewed \
     carefully for completeness and accuracy before being filed in the records system today \
     by the attending engineer. Engineer Sign-off: Yes. Date of Service: 01/01/2026. Serial \
     Number: SN-12345-AB. Technician: John Smith. Work Description: replaced the compressor \
     unit and inspected the surrounding wiring and housing for wear. Parts Used: filter, \
     gasket, seal kit. Time In: 08:00. Time Out: 10:30. Customer: Acme Ltd. Job Number: \
     JOB-123456. Asset ID: A1. All work was inspected and signed off as complete before the \
     technician departed the site."
}

#[tokio::test]
async fn happy_path_passes_with_high_confidence_and_no_findings() {
    let registry = registry_with(vec![high_confidence_template("jobsheet-template", 25.0, "stamped")]);
    let ocr = Arc::new(ScriptedOcrAdapter::succeeds_once(single_page(happy_path_document())));
    let svc = bundle(ocr, registry, None, RetryOptions::default(), CircuitBreakerConfig::default());
    let input = PipelineInput {
        document_id: "doc-happy".to_string(),
        source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
        include_raw_ocr_insights: false,
    };
    let outcome = auditor_pipeline::process_document(&svc, input, &Cancel::new()).await.unwrap();

    assert_eq!(outcome.audit_report.overall_result, OverallResult::Pass);
    assert!(outcome.audit_report.score >= 80.0, "score was {}", outcome.audit_report.score);
    assert!(outcome.audit_report.findings.is_empty(), "findings: {:?}", outcome.audit_report.findings);
    assert_eq!(outcome.selection_trace.outcome.confidence_band, auditor_selectors::ConfidenceBand::High);
    assert!(outcome.selection_trace.outcome.auto_processing_allowed);
}

#[tokio::test]
async fn invalid_serial_format_fails_with_r003() {
    let registry = registry_with(vec![high_confidence_template("jobsheet-template", 25.0, "stamped")]);
    let text = "This jobsheet was completed and stamped today. Engineer Sign-off: Yes. Date of \
                Service: 01/01/2026. Serial Number: SN-12-AB. Technician: John Smith. Work \
                Description: replaced the compressor unit and inspected the wiring. Parts \
                Used: filter, gasket. Time In: 08:00. Time Out: 10:30. Customer: Acme Ltd. \
                Job Number: JOB-123456. Asset ID: A1.";
    let ocr = Arc::new(ScriptedOcrAdapter::succeeds_once(single_page(text)));
    let svc = bundle(ocr, registry, None, RetryOptions::default(), CircuitBreakerConfig::default());
    let input = PipelineInput {
        document_id: "doc-bad-serial".to_string(),
        source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
        include_raw_ocr_insights: false,
    };
    let outcome = auditor_pipeline::process_document(&svc, input, &Cancel::new()).await.unwrap();

    assert_eq!(outcome.audit_report.overall_result, OverallResult::Fail);
    assert!(outcome
        .audit_report
        .findings
        .iter()
        .any(|f| f.rule_id.as_deref() == Some("R003") && f.reason_code == ReasonCode::InvalidFormat));
}

#[tokio::test]
async fn close_scoring_candidates_are_flagged_ambiguous() {
    let registry = registry_with(vec![
        high_confidence_template("alpha-template", 12.0, "stamped"),
        high_confidence_template("beta-template", 11.0, "approved"),
    ]);
    let text = "This jobsheet was stamped and approved by the site supervisor this morning.";
    let ocr = Arc::new(ScriptedOcrAdapter::succeeds_once(single_page(text)));
    let svc = bundle(ocr, registry, None, RetryOptions::default(), CircuitBreakerConfig::default());
    let input = PipelineInput {
        document_id: "doc-ambiguous".to_string(),
        source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
        include_raw_ocr_insights: false,
    };
    let outcome = auditor_pipeline::process_document(&svc, input, &Cancel::new()).await.unwrap();

    let selection = &outcome.selection_trace.outcome;
    assert!(selection.ambiguous, "selection: {selection:?}");
    assert!(!selection.auto_processing_allowed);
    assert_eq!(selection.candidates.len(), 2);
    assert!(selection.block_reason.as_deref().unwrap_or_default().contains("ambiguous"));
}

#[tokio::test]
async fn ocr_retries_twice_then_succeeds_without_tripping_the_breaker() {
    let registry = auto_init_registry();
    let pages = vec![
        OcrPage { page_number: 1, markdown: "Page one content about the job sheet.".to_string(), images: None, dimensions: None },
        OcrPage { page_number: 2, markdown: "Page two continuation with further notes.".to_string(), images: None, dimensions: None },
    ];
    let ocr = Arc::new(ScriptedOcrAdapter::fails_then_succeeds(pages, 2));
    let svc = bundle(ocr, registry, None, RetryOptions::default(), CircuitBreakerConfig::default());
    let input = PipelineInput {
        document_id: "doc-retry".to_string(),
        source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
        include_raw_ocr_insights: false,
    };
    let breaker = svc.ocr_breaker.clone();
    let outcome = auditor_pipeline::process_document(&svc, input, &Cancel::new()).await.unwrap();

    assert_eq!(outcome.audit_report.retry_attempts, 2);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test]
async fn eleventh_call_after_ten_failures_trips_the_breaker() {
    let registry = auto_init_registry();
    let ocr: Arc<dyn OcrAdapter> = Arc::new(ScriptedOcrAdapter::always_fails());
    let retry_options = RetryOptions { max_retries: 0, ..RetryOptions::default() };
    let breaker_config = CircuitBreakerConfig { failure_threshold: 10, reset_timeout_ms: 30_000, half_open_requests: 1 };
    let svc = bundle(ocr, registry, None, retry_options, breaker_config);

    for i in 0..10 {
        let input = PipelineInput {
            document_id: format!("doc-breaker-{i}"),
            source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
            include_raw_ocr_insights: false,
        };
        let outcome = auditor_pipeline::process_document(&svc, input, &Cancel::new()).await.unwrap();
        assert_eq!(outcome.audit_report.error_code.as_deref(), Some("PROCESSING_ERROR"));
    }
    assert_eq!(svc.ocr_breaker.state(), CircuitState::Open);

    let input = PipelineInput {
        document_id: "doc-breaker-11".to_string(),
        source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
        include_raw_ocr_insights: false,
    };
    let outcome = auditor_pipeline::process_document(&svc, input, &Cancel::new()).await.unwrap();

    assert_eq!(outcome.audit_report.error_code.as_deref(), Some("CIRCUIT_BREAKER_OPEN"));
    let entries = svc.dlq.list_by_stage(Stage::Ocr);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].recoverable);
}

#[tokio::test]
async fn advisory_interpreter_never_changes_the_canonical_report() {
    let text = happy_path_document();

    let registry_off = registry_with(vec![high_confidence_template("jobsheet-template", 25.0, "stamped")]);
    let ocr_off = Arc::new(ScriptedOcrAdapter::succeeds_once(single_page(text)));
    let svc_off = bundle(ocr_off, registry_off, None, RetryOptions::default(), CircuitBreakerConfig::default());

    let registry_on = registry_with(vec![high_confidence_template("jobsheet-template", 25.0, "stamped")]);
    let ocr_on = Arc::new(ScriptedOcrAdapter::succeeds_once(single_page(text)));
    let interpreter = Some(Arc::new(MockLlmInterpreterAdapter::empty()) as Arc<dyn auditor_llm::LlmInterpreterAdapter>);
    let svc_on = bundle(ocr_on, registry_on, interpreter, RetryOptions::default(), CircuitBreakerConfig::default());

    let input_off = PipelineInput {
        document_id: "doc-invariance".to_string(),
        source: OcrSource::Url("https://example.invalid/doc.pdf".to_string()),
        include_raw_ocr_insights: false,
    };
    let input_on = input_off.clone();

    let outcome_off = auditor_pipeline::process_document(&svc_off, input_off, &Cancel::new()).await.unwrap();
    let outcome_on = auditor_pipeline::process_document(&svc_on, input_on, &Cancel::new()).await.unwrap();

    assert!(outcome_off.insights_artifact.is_none());
    let artifact = outcome_on.insights_artifact.expect("interpreter was configured");
    assert!(artifact.is_advisory_only);

    let mut value_off = serde_json::to_value(&outcome_off.audit_report).unwrap();
    let mut value_on = serde_json::to_value(&outcome_on.audit_report).unwrap();
    for value in [&mut value_off, &mut value_on] {
        if let serde_json::Value::Object(map) = value {
            map.remove("correlation_id");
            map.remove("processing_ms");
        }
    }
    assert_eq!(value_off, value_on);
}
