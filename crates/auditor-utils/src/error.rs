use thiserror::Error;

/// Workspace-wide error type for the audit pipeline.
///
/// Each variant corresponds to one entry in the error taxonomy: transport and
/// quota failures are retryable, breaker/validation/invariant failures are not.
/// Library code returns `Result<T, AuditError>`; only the CLI binary converts
/// this into a process exit code.
#[derive(Error, Debug, Clone)]
pub enum AuditError {
    #[error("transport error calling {upstream}: {message}")]
    Transport { upstream: String, message: String },

    #[error("quota exceeded calling {upstream}: {message}")]
    Quota { upstream: String, message: String },

    #[error("upstream server error from {upstream}: HTTP {status}")]
    UpstreamServer { upstream: String, status: u16 },

    #[error("upstream client error from {upstream}: HTTP {status}")]
    UpstreamClient { upstream: String, status: u16 },

    #[error("circuit breaker open for {upstream}, retry after {retry_after_ms}ms")]
    CircuitOpen {
        upstream: String,
        retry_after_ms: u64,
    },

    #[error("contract violation from {upstream}: {reason}")]
    Contract { upstream: String, reason: String },

    #[error("validation failed at {field_path}: {reason} (fix: {fix_path})")]
    Validation {
        field_path: String,
        reason: String,
        fix_path: String,
    },

    #[error("SSOT violation: strict mode with no active templates")]
    SsotViolation,

    #[error("pipeline error: {reason}")]
    Pipeline { reason: String },

    #[error("io error: {0}")]
    Io(String),

    #[error("configuration error at {key}: {reason}")]
    Config { key: String, reason: String },
}

impl AuditError {
    /// The canonical machine-readable error code, as referenced throughout §7/§4.12.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "TRANSPORT_ERROR",
            Self::Quota { .. } => "RATE_LIMIT",
            Self::UpstreamServer { .. } => "HTTP_5XX",
            Self::UpstreamClient { status, .. } => match status {
                401 | 403 => "HTTP_AUTH",
                404 => "HTTP_404",
                _ => "HTTP_4XX",
            },
            Self::CircuitOpen { .. } => "CIRCUIT_BREAKER_OPEN",
            Self::Contract { .. } => "INVALID_JSON",
            Self::Validation { .. } => "ACTIVATION_POLICY_ERROR",
            Self::SsotViolation => "SSOT_VIOLATION",
            Self::Pipeline { .. } => "PIPELINE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
        }
    }

    /// Whether this error is eligible for retry at the call site. Breaker-open,
    /// contract, validation, and invariant errors are never retried.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Quota { .. } | Self::UpstreamServer { .. }
        )
    }

    #[must_use]
    pub fn to_exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Validation { .. } => 4,
            Self::SsotViolation => 5,
            Self::CircuitOpen { .. } => 6,
            Self::Contract { .. } => 7,
            Self::Transport { .. } | Self::Quota { .. } | Self::UpstreamServer { .. } => 8,
            Self::UpstreamClient { .. } => 9,
            Self::Io(_) => 74,
            Self::Pipeline { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_matches_taxonomy() {
        assert!(
            AuditError::Transport {
                upstream: "ocr".into(),
                message: "reset".into()
            }
            .is_retryable()
        );
        assert!(!AuditError::SsotViolation.is_retryable());
        assert!(
            !AuditError::CircuitOpen {
                upstream: "ocr".into(),
                retry_after_ms: 100
            }
            .is_retryable()
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(
            AuditError::UpstreamClient {
                upstream: "ocr".into(),
                status: 404
            }
            .error_code(),
            "HTTP_404"
        );
        assert_eq!(AuditError::SsotViolation.error_code(), "SSOT_VIOLATION");
    }
}
