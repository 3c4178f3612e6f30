//! Resiliency primitives shared by upstream adapters (§4.4, §4.6): retry
//! with jittered backoff, a per-upstream circuit breaker, and a fixed-window
//! rate limiter.

pub mod circuit_breaker;
pub mod rate_limiter;
pub mod retry;
pub mod sleeper;

use circuit_breaker::{CircuitBreaker, CircuitExecuteError};
use retry::{with_retry, RetryOptions};
use sleeper::Sleeper;
use std::sync::Arc;

/// `withResiliency(fn, breaker, retryOpts) := breaker.execute(() => withRetry(fn, retryOpts))`.
///
/// The breaker gates entry; everything it lets through is itself retried.
/// A single upstream call that exhausts its retries still counts as one
/// breaker failure, not one per retry attempt.
pub async fn with_resiliency<T, E, F, Fut>(
    breaker: &CircuitBreaker,
    retry_opts: &RetryOptions,
    sleeper: Arc<dyn Sleeper>,
    mut operation: F,
    classify: impl Fn(&E) -> String,
    on_retry: impl FnMut(u32, &E, std::time::Duration),
) -> Result<T, CircuitExecuteError<E>>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    breaker
        .execute(|| with_retry(retry_opts, sleeper, &mut operation, classify, on_retry))
        .await
}
