//! Retry with exponential backoff and jitter (§4.4 `withRetry`).

use crate::sleeper::Sleeper;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

/// Error-classification patterns retried by default: transient network
/// failures, quota exhaustion, and generic server errors.
pub static DEFAULT_RETRYABLE_PATTERNS: &[&str] = &[
    "ECONNRESET",
    "ETIMEDOUT",
    "ENOTFOUND",
    "EAI_AGAIN",
    "RATE_LIMIT",
    "429",
    "5xx",
];

#[derive(Debug, Clone)]
pub struct RetryOptions {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub retryable_patterns: Vec<String>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
            retryable_patterns: DEFAULT_RETRYABLE_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Delay for 0-based attempt `k`:
/// `min(maxDelayMs, baseDelayMs * multiplier^k + uniform(0, 0.3 * baseDelayMs * multiplier^k))`.
#[must_use]
pub fn backoff_delay(opts: &RetryOptions, attempt: u32) -> Duration {
    let exponential = opts.base_delay_ms as f64 * opts.backoff_multiplier.powi(attempt as i32);
    let jitter_ceiling = 0.3 * exponential;
    let jitter = rand::thread_rng().gen_range(0.0..=jitter_ceiling.max(0.0));
    let delay_ms = (exponential + jitter).min(opts.max_delay_ms as f64);
    Duration::from_millis(delay_ms.max(0.0) as u64)
}

/// Whether `message_or_code` substring-matches one of the configured
/// retryable patterns (case-sensitive, matching the upstream error strings
/// this is grounded on: `ECONNRESET`, `429`, etc).
#[must_use]
pub fn is_retryable(opts: &RetryOptions, message_or_code: &str) -> bool {
    opts.retryable_patterns
        .iter()
        .any(|pattern| message_or_code.contains(pattern.as_str()))
}

/// Run `operation`, retrying on retryable failures per `opts` until it
/// succeeds, a non-retryable error is returned, or retries are exhausted.
///
/// `classify` extracts the substring `is_retryable` matches against (an
/// error code or message) from the operation's error type `E`.
pub async fn with_retry<T, E, F, Fut>(
    opts: &RetryOptions,
    sleeper: Arc<dyn Sleeper>,
    mut operation: F,
    classify: impl Fn(&E) -> String,
    mut on_retry: impl FnMut(u32, &E, Duration),
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let signature = classify(&err);
                if attempt >= opts.max_retries || !is_retryable(opts, &signature) {
                    return Err(err);
                }
                let delay = backoff_delay(opts, attempt);
                on_retry(attempt, &err, delay);
                sleeper.sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
