//! Three-state circuit breaker per named upstream (§4.4).

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_timeout_ms: u64,
    pub half_open_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
            half_open_requests: 1,
        }
    }
}

#[derive(Debug)]
pub struct CircuitBreakerOpen {
    pub upstream: String,
    pub retry_after_ms: u64,
}

struct Inner {
    state: CircuitState,
    failure_count: u32,
    half_open_successes: u32,
    last_failure_time: Option<Instant>,
}

/// CLOSED → OPEN on `failure_threshold` consecutive failures. OPEN rejects
/// every call until `reset_timeout_ms` has elapsed since the last failure,
/// then the next probe moves to HALF_OPEN. HALF_OPEN closes again after
/// `half_open_requests` consecutive successes; any HALF_OPEN failure reopens.
pub struct CircuitBreaker {
    upstream: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(upstream: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            upstream: upstream.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                half_open_successes: 0,
                last_failure_time: None,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("breaker mutex poisoned").state
    }

    /// Check whether a call may proceed, transitioning OPEN→HALF_OPEN when
    /// the reset timeout has elapsed. Returns `Err` carrying `retryAfterMs`
    /// if the call must be rejected.
    pub fn before_call(&self) -> Result<(), CircuitBreakerOpen> {
        let mut guard = self.inner.lock().expect("breaker mutex poisoned");
        match guard.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen => Ok(()),
            CircuitState::Open => {
                let elapsed = guard
                    .last_failure_time
                    .map(|t| t.elapsed())
                    .unwrap_or(Duration::MAX);
                if elapsed.as_millis() as u64 >= self.config.reset_timeout_ms {
                    guard.state = CircuitState::HalfOpen;
                    guard.half_open_successes = 0;
                    Ok(())
                } else {
                    let retry_after_ms =
                        self.config.reset_timeout_ms.saturating_sub(elapsed.as_millis() as u64);
                    Err(CircuitBreakerOpen {
                        upstream: self.upstream.clone(),
                        retry_after_ms,
                    })
                }
            }
        }
    }

    pub fn on_success(&self) {
        let mut guard = self.inner.lock().expect("breaker mutex poisoned");
        match guard.state {
            CircuitState::Closed => {
                guard.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                guard.half_open_successes += 1;
                if guard.half_open_successes >= self.config.half_open_requests {
                    guard.state = CircuitState::Closed;
                    guard.failure_count = 0;
                    guard.half_open_successes = 0;
                    guard.last_failure_time = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn on_failure(&self) {
        let mut guard = self.inner.lock().expect("breaker mutex poisoned");
        guard.last_failure_time = Some(Instant::now());
        match guard.state {
            CircuitState::Closed => {
                guard.failure_count += 1;
                if guard.failure_count >= self.config.failure_threshold {
                    guard.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                guard.state = CircuitState::Open;
                guard.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Force-close the breaker for administration.
    pub fn reset(&self) {
        let mut guard = self.inner.lock().expect("breaker mutex poisoned");
        guard.state = CircuitState::Closed;
        guard.failure_count = 0;
        guard.half_open_successes = 0;
        guard.last_failure_time = None;
    }

    /// Run `operation` under this breaker: reject immediately when open,
    /// otherwise run it and feed the outcome back into the state machine.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, CircuitExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.before_call().map_err(CircuitExecuteError::Open)?;
        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                self.on_failure();
                Err(CircuitExecuteError::Inner(err))
            }
        }
    }
}

#[derive(Debug)]
pub enum CircuitExecuteError<E> {
    Open(CircuitBreakerOpen),
    Inner(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32) -> CircuitBreaker {
        CircuitBreaker::new(
            "test-upstream",
            CircuitBreakerConfig {
                failure_threshold,
                reset_timeout_ms: 50,
                half_open_requests: 2,
            },
        )
    }

    #[test]
    fn opens_on_kth_consecutive_failure() {
        let breaker = breaker(3);
        breaker.on_failure();
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn open_rejects_calls_until_reset_timeout_elapses() {
        let breaker = breaker(1);
        breaker.on_failure();
        assert!(breaker.before_call().is_err());
        std::thread::sleep(Duration::from_millis(60));
        assert!(breaker.before_call().is_ok());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn half_open_failure_reopens() {
        let breaker = breaker(1);
        breaker.on_failure();
        std::thread::sleep(Duration::from_millis(60));
        breaker.before_call().unwrap();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[test]
    fn half_open_closes_after_consecutive_successes() {
        let breaker = breaker(1);
        breaker.on_failure();
        std::thread::sleep(Duration::from_millis(60));
        breaker.before_call().unwrap();
        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.on_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn reset_force_closes() {
        let breaker = breaker(1);
        breaker.on_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.before_call().is_ok());
    }

    #[tokio::test]
    async fn execute_rejects_when_open_without_running_operation() {
        let breaker = breaker(1);
        breaker.on_failure();
        let mut ran = false;
        let result: Result<(), CircuitExecuteError<String>> = breaker
            .execute(|| async {
                ran = true;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(CircuitExecuteError::Open(_))));
        assert!(!ran);
    }
}
