//! Fixed-window per-key rate limiter (§4.6).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
pub struct RateLimitPreset {
    pub max: u32,
    pub window_ms: u64,
}

/// Predefined buckets, grounded in the naming scheme of an upstream adapter
/// surface that fronts multiple distinct traffic classes.
pub static STANDARD: RateLimitPreset = RateLimitPreset { max: 100, window_ms: 60_000 };
pub static UPLOAD: RateLimitPreset = RateLimitPreset { max: 20, window_ms: 60_000 };
pub static PROCESSING: RateLimitPreset = RateLimitPreset { max: 10, window_ms: 60_000 };
pub static AUTH: RateLimitPreset = RateLimitPreset { max: 5, window_ms: 60_000 };
pub static ADMIN: RateLimitPreset = RateLimitPreset { max: 30, window_ms: 60_000 };
pub static WEBHOOK: RateLimitPreset = RateLimitPreset { max: 50, window_ms: 60_000 };

struct WindowState {
    count: u32,
    reset_time: Instant,
}

pub struct RateLimitDecision {
    pub allowed: bool,
    pub retry_after_secs: Option<u64>,
}

pub struct RateLimiter {
    preset: RateLimitPreset,
    windows: Mutex<HashMap<String, WindowState>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(preset: RateLimitPreset) -> Self {
        Self {
            preset,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Check and, if allowed, consume one unit of quota for `key`.
    pub fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");

        let window = windows.entry(key.to_string()).or_insert_with(|| WindowState {
            count: 0,
            reset_time: now + Duration::from_millis(self.preset.window_ms),
        });

        if now >= window.reset_time {
            window.count = 0;
            window.reset_time = now + Duration::from_millis(self.preset.window_ms);
        }

        if window.count >= self.preset.max {
            let remaining_ms = window.reset_time.saturating_duration_since(now).as_millis() as u64;
            let retry_after_secs = remaining_ms.div_ceil(1000);
            return RateLimitDecision {
                allowed: false,
                retry_after_secs: Some(retry_after_secs),
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            retry_after_secs: None,
        }
    }

    /// Remove windows that have fully expired. Intended to be driven by a
    /// periodic background sweep (every 5 minutes per §4.6) so the map
    /// doesn't grow unboundedly with one-shot keys.
    pub fn sweep_expired(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        windows.retain(|_, window| window.reset_time > now);
    }

    #[must_use]
    pub fn tracked_key_count(&self) -> usize {
        self.windows.lock().expect("rate limiter mutex poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(RateLimitPreset { max: 2, window_ms: 60_000 });
        assert!(limiter.check("client-a").allowed);
        assert!(limiter.check("client-a").allowed);
        let third = limiter.check("client-a");
        assert!(!third.allowed);
        assert!(third.retry_after_secs.unwrap() > 0);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(RateLimitPreset { max: 1, window_ms: 60_000 });
        assert!(limiter.check("client-a").allowed);
        assert!(limiter.check("client-b").allowed);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(RateLimitPreset { max: 1, window_ms: 20 });
        assert!(limiter.check("client-a").allowed);
        assert!(!limiter.check("client-a").allowed);
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("client-a").allowed);
    }

    #[test]
    fn sweep_removes_expired_windows() {
        let limiter = RateLimiter::new(RateLimitPreset { max: 1, window_ms: 10 });
        limiter.check("client-a");
        std::thread::sleep(Duration::from_millis(20));
        limiter.sweep_expired();
        assert_eq!(limiter.tracked_key_count(), 0);
    }
}
