//! Nine-step per-document pipeline orchestrator (§4.13).
//!
//! 1. Derive a correlation id and run the remainder of processing within it.
//! 2. Ensure templates are ready (§4.9); fail fast in strict mode with none.
//! 3. Call OCR through the resiliency substrate (§4.4), recording retry
//!    attempts and processing time.
//! 4. Tokenize and run the selector (§4.10); write the selection trace
//!    regardless of outcome.
//! 5. Route LOW-confidence/ambiguous/unselected documents to the default
//!    template rather than silently dropping them.
//! 6. Calibrate fields and evaluate guardrails (§4.11); a `STOP_IMMEDIATELY`
//!    guardrail short-circuits straight to a `FAIL` report.
//! 7. Run the analyzer (§4.12) to produce the canonical `AuditReport`.
//! 8. Optionally call the advisory interpreter (§4.8).
//! 9. Return the combined outcome.

use crate::bundle::ServiceBundle;
use crate::cancel::Cancel;
use crate::types::{OcrSource, PipelineInput, PipelineOutcome};
use auditor_analyzer::{circuit_open_report, pipeline_error_report, AnalyzerLlmOptions};
use auditor_calibration::{
    assess_quality, calibrate_field, calibrations_for_spec, evaluate_guardrails, extract_fields,
    profile_for_level, StopBehavior,
};
use auditor_context::Context;
use auditor_llm::types::{InterpretInput, InterpretOptions};
use auditor_llm::raw_ocr_forwarding_allowed;
use auditor_logging::Service;
use auditor_ocr::types::OcrOptions;
use auditor_resilience::circuit_breaker::CircuitExecuteError;
use auditor_resilience::with_resiliency;
use auditor_selectors::{build_trace, select, write_trace};
use auditor_templates::types::{SelectionConfig, TemplateVersion};
use auditor_utils::AuditError;

const SERVICE: Service = Service("pipeline");

/// Classifies an OCR/analyzer-path `AuditError` into the substring
/// `with_retry` matches retryable patterns against. Only the variants
/// `AuditError::is_retryable` already names are given a signature that can
/// match; everything else yields an empty string so it is never retried.
fn retry_signature(err: &AuditError) -> String {
    match err {
        AuditError::Transport { message, .. } => message.clone(),
        AuditError::Quota { message, .. } => format!("RATE_LIMIT {message}"),
        AuditError::UpstreamServer { status, .. } => format!("upstream 5xx status {status}"),
        _ => String::new(),
    }
}

/// Processes one document end to end. Checks [`Cancel`] at every suspension
/// point named in §5; a cancellation mid-flight returns a `REVIEW_QUEUE`
/// report with `errorCode="CANCELLED"` rather than propagating an error.
///
/// # Errors
/// Returns [`AuditError::SsotViolation`] if the registry is strict with no
/// active templates. All other adapter failures are absorbed into the
/// returned `AuditReport` rather than propagated.
pub async fn process_document(
    bundle: &ServiceBundle,
    input: PipelineInput,
    cancel: &Cancel,
) -> Result<PipelineOutcome, AuditError> {
    let ctx = Context::create(None);
    let correlation_id = ctx.correlation_id.to_string();

    auditor_context::run(ctx, async {
        // Step 2: templates must be ready before any adapter call.
        let activation_report = bundle.registry.ensure_templates_ready_with_report()?;

        if cancel.is_cancelled() {
            return Ok(cancelled_outcome(&correlation_id, &input.document_id));
        }

        let rate_decision = bundle.rate_limiter.check(&input.document_id);
        if !rate_decision.allowed {
            let report = auditor_analyzer::rate_limited_report(
                Some(correlation_id.clone()),
                rate_decision.retry_after_secs.unwrap_or(60),
            );
            return Ok(no_selection_outcome(report, activation_report));
        }

        // Step 3: OCR via the resiliency substrate.
        let ocr_options = OcrOptions {
            include_image_locations: false,
            image_limit: None,
            page_limit: None,
            job_sheet_id: Some(input.document_id.clone()),
            skip_retry: false,
            redact_pii: true,
            correlation_id: Some(correlation_id.clone()),
        };

        let ocr_result = tokio::select! {
            result = with_resiliency(
                &bundle.ocr_breaker,
                &bundle.retry_options,
                bundle.sleeper.clone(),
                || async {
                    match &input.source {
                        OcrSource::Url(url) => bundle.ocr.extract_from_url(url, &ocr_options).await,
                        OcrSource::Base64 { data, mime_type } => {
                            bundle.ocr.extract_from_base64(data, mime_type, &ocr_options).await
                        }
                    }
                },
                retry_signature,
                |attempt, err, delay| {
                    auditor_logging::warn(
                        SERVICE,
                        "retrying OCR call",
                        Some(serde_json::json!({"attempt": attempt, "delayMs": delay.as_millis(), "error": err.to_string()})),
                    );
                },
            ) => result,
            () = cancel.cancelled() => {
                return Ok(cancelled_outcome(&correlation_id, &input.document_id));
            }
        };

        let ocr_result = match ocr_result {
            Ok(result) => result,
            Err(CircuitExecuteError::Open(open)) => {
                let report = circuit_open_report(
                    Some(correlation_id.clone()),
                    Some(input.document_id.as_str()),
                    "ocr",
                    Some(&bundle.dlq),
                );
                auditor_logging::error(
                    SERVICE,
                    "OCR circuit breaker open",
                    Some(serde_json::json!({"retryAfterMs": open.retry_after_ms})),
                );
                return Ok(no_selection_outcome(report, activation_report));
            }
            Err(CircuitExecuteError::Inner(err)) => {
                let report = pipeline_error_report(Some(correlation_id.clone()), &err.to_string());
                auditor_logging::error(SERVICE, "OCR call failed", Some(serde_json::json!({"error": err.to_string()})));
                return Ok(no_selection_outcome(report, activation_report));
            }
        };

        if !ocr_result.success {
            let report = pipeline_error_report(
                Some(correlation_id.clone()),
                ocr_result.error.as_deref().unwrap_or("OCR returned an unsuccessful result"),
            );
            return Ok(no_selection_outcome(report, activation_report));
        }

        let document_text = ocr_result
            .pages
            .iter()
            .map(|p| p.markdown.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let retry_attempts = ocr_result.retry_attempts.unwrap_or(0);

        if cancel.is_cancelled() {
            return Ok(cancelled_outcome(&correlation_id, &input.document_id));
        }

        // Step 4: selection.
        let candidates = bundle.registry.active_templates()?;
        let weights = auditor_selectors::SignalWeights::default();
        let outcome = select(&document_text, &candidates, &weights);
        let trace = build_trace(
            &document_text,
            &input.document_id,
            chrono::Utc::now(),
            &outcome,
            &outcome.candidates,
            &weights,
        );
        if let Err(err) = write_trace(&bundle.artifacts_dir, &trace, epoch_ms()) {
            auditor_logging::warn(SERVICE, "failed to persist selection trace", Some(serde_json::json!({"error": err.to_string()})));
        }

        // Step 5: route unselected/LOW-confidence/ambiguous documents to the
        // default template instead of dropping them.
        let needs_fallback =
            outcome.selected.is_none() || outcome.confidence_band == auditor_selectors::ConfidenceBand::Low || outcome.ambiguous;
        let chosen_version: TemplateVersion = if needs_fallback {
            default_selection_config_version(&candidates)
        } else {
            let score = outcome.selected.as_ref().expect("needs_fallback is false only when selected is Some");
            candidates
                .iter()
                .find(|c| c.slug == score.template_id && c.version_id == score.version_id)
                .cloned()
                .unwrap_or_else(|| default_selection_config_version(&candidates))
        };

        if cancel.is_cancelled() {
            return Ok(PipelineOutcome {
                audit_report: cancelled_report(&correlation_id, retry_attempts),
                insights_artifact: None,
                selection_trace: trace,
                activation_report,
            });
        }

        // Step 6: calibration and guardrails.
        let profile = profile_for_level(bundle.calibration_level);
        let calibrations = calibrations_for_spec(&chosen_version.spec, &profile);
        let extracted = extract_fields(&chosen_version.spec, &document_text);
        let calibrated: Vec<_> = extracted
            .iter()
            .zip(calibrations.iter())
            .map(|(e, c)| calibrate_field(e, c))
            .collect();
        let quality = assess_quality(&calibrated, &calibrations);

        let mut seen = std::collections::HashSet::new();
        let duplicates: Vec<String> = extracted
            .iter()
            .filter(|f| f.extracted)
            .filter(|f| !seen.insert(f.field_id.clone()))
            .map(|f| f.field_id.clone())
            .collect();
        let anomaly_score = if quality.anomaly_detected { 1.0 } else { 0.0 };
        let guardrails = evaluate_guardrails(&calibrated, &calibrations, &duplicates, anomaly_score, 0.5);

        if guardrails.should_stop && guardrails.overall_behavior == StopBehavior::StopImmediately {
            let report = pipeline_error_report(
                Some(correlation_id.clone()),
                &format!("guardrail short-circuit: {}", guardrails.stop_reasons.join(", ")),
            );
            return Ok(PipelineOutcome {
                audit_report: report,
                insights_artifact: None,
                selection_trace: trace,
                activation_report,
            });
        }

        if cancel.is_cancelled() {
            return Ok(PipelineOutcome {
                audit_report: cancelled_report(&correlation_id, retry_attempts),
                insights_artifact: None,
                selection_trace: trace,
                activation_report,
            });
        }

        // Step 7: analyzer.
        let processing_ms = ctx_elapsed_ms();
        let audit_report = if let Some(backend) = &bundle.analyzer_backend {
            let options = AnalyzerLlmOptions { correlation_id: Some(correlation_id.clone()), redact_pii: true };
            let result = tokio::select! {
                result = with_resiliency(
                    &bundle.llm_breaker,
                    &bundle.retry_options,
                    bundle.sleeper.clone(),
                    || backend.analyze(&chosen_version.spec, &document_text, &options),
                    retry_signature,
                    |attempt, err, delay| {
                        auditor_logging::warn(
                            SERVICE,
                            "retrying LLM-backed analysis call",
                            Some(serde_json::json!({"attempt": attempt, "delayMs": delay.as_millis(), "error": err.to_string()})),
                        );
                    },
                ) => result,
                () = cancel.cancelled() => {
                    return Ok(PipelineOutcome {
                        audit_report: cancelled_report(&correlation_id, retry_attempts),
                        insights_artifact: None,
                        selection_trace: trace,
                        activation_report,
                    });
                }
            };
            match result {
                Ok(mut report) => {
                    report.retry_attempts = retry_attempts;
                    report
                }
                Err(CircuitExecuteError::Open(_)) => {
                    circuit_open_report(Some(correlation_id.clone()), Some(input.document_id.as_str()), "llm-analyzer", Some(&bundle.dlq))
                }
                Err(CircuitExecuteError::Inner(err)) => {
                    auditor_logging::warn(
                        SERVICE,
                        "LLM-backed analyzer failed, falling back to rule-based analysis",
                        Some(serde_json::json!({"error": err.to_string()})),
                    );
                    let mut report = auditor_analyzer::analyze_rule_based(
                        &chosen_version.spec,
                        &document_text,
                        &extracted,
                        &calibrated,
                        Some(correlation_id.clone()),
                        processing_ms,
                    );
                    report.retry_attempts = retry_attempts;
                    report
                }
            }
        } else {
            let mut report = auditor_analyzer::analyze_rule_based(
                &chosen_version.spec,
                &document_text,
                &extracted,
                &calibrated,
                Some(correlation_id.clone()),
                processing_ms,
            );
            report.retry_attempts = retry_attempts;
            report
        };

        // Step 8: optional advisory interpretation. Never allowed to change
        // the canonical report produced in step 7.
        let insights_artifact = if let Some(interpreter) = &bundle.llm_interpreter {
            if cancel.is_cancelled() {
                None
            } else {
                let interpret_options = InterpretOptions {
                    include_raw_ocr: input.include_raw_ocr_insights,
                    max_insights: None,
                    min_confidence: None,
                    skip_retry: false,
                    correlation_id: Some(correlation_id.clone()),
                };
                let forward_raw_ocr = raw_ocr_forwarding_allowed(&interpret_options, bundle.enable_raw_ocr_insights);
                let interpret_input = InterpretInput {
                    audit_report: Some(summarize_for_interpreter(&audit_report)),
                    extracted_fields: Some(serde_json::to_value(&audit_report.extracted_fields).unwrap_or_default()),
                    raw_ocr_text: if forward_raw_ocr { Some(document_text.clone()) } else { None },
                };
                match interpreter.interpret(&interpret_input, &interpret_options).await {
                    Ok(result) => Some(interpreter.generate_artifact(&result, &[], Some(correlation_id.clone()))),
                    Err(err) => {
                        auditor_logging::warn(
                            SERVICE,
                            "advisory interpretation failed, proceeding without insights",
                            Some(serde_json::json!({"error": err.to_string()})),
                        );
                        None
                    }
                }
            }
        } else {
            None
        };

        Ok(PipelineOutcome { audit_report, insights_artifact, selection_trace: trace, activation_report })
    })
    .await
}

fn summarize_for_interpreter(report: &auditor_analyzer::AuditReport) -> auditor_llm::types::CanonicalAuditReportSummary {
    auditor_llm::types::CanonicalAuditReportSummary {
        findings: report
            .findings
            .iter()
            .map(|f| auditor_llm::types::CanonicalFinding {
                rule_id: f.rule_id.clone().unwrap_or_default(),
                field_name: f.field_name.clone(),
                severity: format!("{:?}", f.severity),
                reason_code: format!("{:?}", f.reason_code),
            })
            .collect(),
        validated_fields: report.extracted_fields.keys().cloned().collect(),
    }
}

/// Falls back to the default template's selection config when the selector
/// chose nothing or the candidate it chose is no longer in the active set
/// (§4.13 step 5: never silently drop).
fn default_selection_config_version(candidates: &[TemplateVersion]) -> TemplateVersion {
    candidates
        .iter()
        .find(|c| c.slug == "default")
        .cloned()
        .or_else(|| candidates.first().cloned())
        .unwrap_or_else(|| TemplateVersion {
            version_id: "fallback-v1".to_string(),
            slug: "fallback".to_string(),
            spec: auditor_templates::default_template::build(),
            selection_config: SelectionConfig::default(),
            roi_config: None,
            status: auditor_templates::types::VersionStatus::Draft,
            change_note: "in-memory fallback, no active template was available".to_string(),
            audit: auditor_templates::types::AuditFields {
                creator: "system".to_string(),
                created_at: chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"),
                updated_at: chrono::DateTime::from_timestamp(0, 0).expect("epoch is valid"),
            },
            fixture_pack: None,
        })
}

fn no_selection_outcome(
    audit_report: auditor_analyzer::AuditReport,
    activation_report: Option<auditor_templates::ActivationReport>,
) -> PipelineOutcome {
    let empty_weights = auditor_selectors::SignalWeights::default();
    let empty_outcome = select("", &[], &empty_weights);
    let trace = build_trace(
        "",
        audit_report.correlation_id.as_deref().unwrap_or("unknown"),
        chrono::Utc::now(),
        &empty_outcome,
        &empty_outcome.candidates,
        &empty_weights,
    );
    PipelineOutcome { audit_report, insights_artifact: None, selection_trace: trace, activation_report }
}

fn cancelled_report(correlation_id: &str, retry_attempts: u32) -> auditor_analyzer::AuditReport {
    let mut report = pipeline_error_report(Some(correlation_id.to_string()), "processing was cancelled");
    report.error_code = Some("CANCELLED".to_string());
    report.retry_attempts = retry_attempts;
    report
}

fn cancelled_outcome(correlation_id: &str, document_id: &str) -> PipelineOutcome {
    let report = cancelled_report(correlation_id, 0);
    let empty_weights = auditor_selectors::SignalWeights::default();
    let empty_outcome = select("", &[], &empty_weights);
    let trace = build_trace(
        "",
        document_id,
        chrono::Utc::now(),
        &empty_outcome,
        &empty_outcome.candidates,
        &empty_weights,
    );
    PipelineOutcome { audit_report: report, insights_artifact: None, selection_trace: trace, activation_report: None }
}

fn ctx_elapsed_ms() -> u64 {
    auditor_context::current().map(|ctx| ctx.elapsed().as_millis() as u64).unwrap_or(0)
}

fn epoch_ms() -> u128 {
    chrono::Utc::now().timestamp_millis().max(0) as u128
}
