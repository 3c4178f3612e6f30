//! Correlation context (§4.1): a per-operation id and metadata bag inherited
//! by async child work without explicit parameter threading.
//!
//! Inheritance is implemented with `tokio::task_local!` storage rather than a
//! process-global mutable variable, so concurrent document tasks never
//! observe one another's context.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use auditor_utils::ids::{CorrelationId, RequestId};
use serde_json::Value;
use tokio::sync::Mutex;

tokio::task_local! {
    static CURRENT: Arc<Context>;
}

/// A single correlation context. Cloning is cheap (ids + an `Arc` metadata map).
#[derive(Debug)]
pub struct Context {
    pub correlation_id: CorrelationId,
    pub request_id: RequestId,
    pub user_id: Option<String>,
    pub start_time: Instant,
    metadata: Mutex<HashMap<String, Value>>,
}

impl Context {
    /// Create a fresh root context, optionally reusing a caller-supplied correlation id.
    #[must_use]
    pub fn create(correlation_id: Option<CorrelationId>) -> Self {
        Self {
            correlation_id: correlation_id.unwrap_or_default(),
            request_id: RequestId::new(),
            user_id: None,
            start_time: Instant::now(),
            metadata: Mutex::new(HashMap::new()),
        }
    }

    /// Derive a child context: same `correlation_id` and `user_id`, fresh `request_id`
    /// and `start_time`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            request_id: RequestId::new(),
            user_id: self.user_id.clone(),
            start_time: Instant::now(),
            metadata: Mutex::new(HashMap::new()),
        }
    }

    pub async fn add_metadata(&self, key: impl Into<String>, value: Value) {
        self.metadata.lock().await.insert(key.into(), value);
    }

    pub async fn metadata_snapshot(&self) -> HashMap<String, Value> {
        self.metadata.lock().await.clone()
    }

    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

/// Run `fut` with `ctx` installed as the current context for its entire
/// lifetime, including across `.await` suspension points.
pub async fn run<F, T>(ctx: Context, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CURRENT.scope(Arc::new(ctx), fut).await
}

/// Fetch the currently installed context, if any task called `run` up the call stack.
#[must_use]
pub fn current() -> Option<Arc<Context>> {
    CURRENT.try_with(Arc::clone).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn current_is_none_outside_run() {
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn current_is_available_inside_run() {
        let ctx = Context::create(None);
        let corr = ctx.correlation_id.clone();
        run(ctx, async move {
            let found = current().expect("context installed");
            assert_eq!(found.correlation_id, corr);
        })
        .await;
    }

    #[tokio::test]
    async fn child_preserves_correlation_but_not_request_id() {
        let parent = Context::create(None);
        let child = parent.child();
        assert_eq!(parent.correlation_id, child.correlation_id);
        assert_ne!(parent.request_id, child.request_id);
    }

    #[tokio::test]
    async fn inherited_across_spawned_task() {
        let ctx = Context::create(None);
        let corr = ctx.correlation_id.clone();
        run(ctx, async move {
            // Simulate async child work suspending and resuming within the same scope.
            tokio::task::yield_now().await;
            let found = current().expect("context still installed after suspension");
            assert_eq!(found.correlation_id, corr);
        })
        .await;
    }

    #[tokio::test]
    async fn metadata_round_trips() {
        let ctx = Context::create(None);
        ctx.add_metadata("stage", serde_json::json!("ocr")).await;
        let snapshot = ctx.metadata_snapshot().await;
        assert_eq!(snapshot.get("stage"), Some(&serde_json::json!("ocr")));
    }
}
