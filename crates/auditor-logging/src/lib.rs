//! Structured, PII-safe logging (§4.3) built on `tracing`.
//!
//! Every emitted record is a flat JSON object:
//! `{timestamp, level, correlationId?, service, message, data?}`. The
//! `data` payload is always passed through [`safe_log::sanitize_data`]
//! before being attached to the tracing event, so forbidden fields never
//! reach the subscriber and PII is redacted regardless of log level.

pub mod safe_log;

use auditor_context::current as current_context;
use serde_json::Value;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global tracing subscriber with a JSON formatter.
///
/// Mirrors how the rest of the pipeline selects its behavior from config:
/// the filter honors `RUST_LOG` if set, otherwise defaults to `info` (or
/// `debug` when `verbose` is requested).
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_target(false).with_current_span(false))
        .try_init()?;

    Ok(())
}

/// Service name attached to every log record, identifying the emitting
/// component (e.g. `"pipeline"`, `"ocr-adapter"`, `"llm-adapter"`).
#[derive(Debug, Clone, Copy)]
pub struct Service(pub &'static str);

fn correlation_id_field() -> Option<String> {
    current_context().map(|ctx| ctx.correlation_id.as_str().to_string())
}

/// Emit an `info`-level structured log record.
pub fn info(service: Service, message: &str, data: Option<Value>) {
    emit(tracing::Level::INFO, service, message, data);
}

/// Emit a `warn`-level structured log record.
pub fn warn(service: Service, message: &str, data: Option<Value>) {
    emit(tracing::Level::WARN, service, message, data);
}

/// Emit an `error`-level structured log record.
pub fn error(service: Service, message: &str, data: Option<Value>) {
    emit(tracing::Level::ERROR, service, message, data);
}

/// Emit a `debug`-level structured log record.
pub fn debug(service: Service, message: &str, data: Option<Value>) {
    emit(tracing::Level::DEBUG, service, message, data);
}

fn emit(level: tracing::Level, service: Service, message: &str, data: Option<Value>) {
    let sanitized = data.as_ref().map(safe_log::sanitize_data);
    let correlation_id = correlation_id_field().unwrap_or_default();
    let data_json = sanitized
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();

    match level {
        tracing::Level::ERROR => tracing::error!(
            service = service.0,
            correlation_id = %correlation_id,
            data = %data_json,
            "{}",
            message
        ),
        tracing::Level::WARN => tracing::warn!(
            service = service.0,
            correlation_id = %correlation_id,
            data = %data_json,
            "{}",
            message
        ),
        tracing::Level::DEBUG => tracing::debug!(
            service = service.0,
            correlation_id = %correlation_id,
            data = %data_json,
            "{}",
            message
        ),
        _ => tracing::info!(
            service = service.0,
            correlation_id = %correlation_id,
            data = %data_json,
            "{}",
            message
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn emit_with_forbidden_field_does_not_panic_and_drops_it() {
        let data = json!({"markdown": "# whole document", "stage": "ocr"});
        let sanitized = safe_log::sanitize_data(&data);
        assert!(sanitized.get("markdown").is_none());
        info(Service("test"), "processed document", Some(data));
    }

    #[tokio::test]
    async fn correlation_id_is_picked_up_from_context() {
        let ctx = auditor_context::Context::create(None);
        let expected = ctx.correlation_id.as_str().to_string();
        auditor_context::run(ctx, async move {
            assert_eq!(correlation_id_field(), Some(expected));
        })
        .await;
    }

    #[test]
    fn correlation_id_is_none_outside_context() {
        assert_eq!(correlation_id_field(), None);
    }
}
