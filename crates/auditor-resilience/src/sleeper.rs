//! A pluggable sleep seam so retry/backoff logic can be driven by virtual
//! time in tests instead of sitting on a real clock.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the real `tokio` timer. Used in production.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested durations instead of actually waiting. Lets retry and
/// circuit-breaker tests assert on backoff schedules without spending
/// wall-clock time.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recorded_sleeps(&self) -> Vec<Duration> {
        self.recorded.lock().expect("sleeper mutex poisoned").clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.recorded
            .lock()
            .expect("sleeper mutex poisoned")
            .push(duration);
    }
}
