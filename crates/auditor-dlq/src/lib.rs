//! In-memory dead-letter queue for failed document jobs (§4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Upload,
    Ocr,
    Analysis,
    Storage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobError {
    pub message: String,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedJob {
    pub id: Uuid,
    pub document_id: String,
    pub correlation_id: Option<String>,
    pub stage: Stage,
    pub error: JobError,
    pub attempts: u32,
    pub max_attempts: u32,
    pub last_attempt_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub recoverable: bool,
}

/// Error substrings that mark a failure as transient and worth retrying.
static TRANSIENT_PATTERNS: &[&str] = &[
    "connection reset",
    "timeout",
    "timed out",
    "dns",
    "rate limit",
    "429",
    "5xx",
    "circuit breaker",
];

#[must_use]
fn classify_recoverable(message: &str) -> bool {
    let lowered = message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lowered.contains(p))
}

#[derive(Debug, Clone, Serialize)]
pub struct DlqStats {
    pub total: usize,
    pub recoverable: usize,
    pub unrecoverable: usize,
    pub by_stage: std::collections::BTreeMap<String, usize>,
}

pub struct NewFailedJob {
    pub document_id: String,
    pub correlation_id: Option<String>,
    pub stage: Stage,
    pub error: JobError,
    pub max_attempts: u32,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Bounded, insertion-ordered store of [`FailedJob`]s. Default capacity is
/// 1000; the oldest entry is evicted when a new one would overflow it.
pub struct DeadLetterQueue {
    capacity: usize,
    jobs: Mutex<VecDeque<FailedJob>>,
}

impl Default for DeadLetterQueue {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl DeadLetterQueue {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            jobs: Mutex::new(VecDeque::new()),
        }
    }

    pub fn add(&self, job: NewFailedJob) -> Uuid {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let recoverable = classify_recoverable(&job.error.message);
        let entry = FailedJob {
            id,
            document_id: job.document_id,
            correlation_id: job.correlation_id,
            stage: job.stage,
            error: job.error,
            attempts: 0,
            max_attempts: job.max_attempts,
            last_attempt_at: now,
            created_at: now,
            metadata: job.metadata,
            recoverable,
        };

        let mut jobs = self.jobs.lock().expect("dlq mutex poisoned");
        if jobs.len() >= self.capacity {
            jobs.pop_front();
        }
        jobs.push_back(entry);
        id
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<FailedJob> {
        self.jobs
            .lock()
            .expect("dlq mutex poisoned")
            .iter()
            .find(|j| j.id == id)
            .cloned()
    }

    #[must_use]
    pub fn list_by_stage(&self, stage: Stage) -> Vec<FailedJob> {
        self.jobs
            .lock()
            .expect("dlq mutex poisoned")
            .iter()
            .filter(|j| j.stage == stage)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn list_by_document(&self, document_id: &str) -> Vec<FailedJob> {
        self.jobs
            .lock()
            .expect("dlq mutex poisoned")
            .iter()
            .filter(|j| j.document_id == document_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn list_recoverable(&self) -> Vec<FailedJob> {
        self.jobs
            .lock()
            .expect("dlq mutex poisoned")
            .iter()
            .filter(|j| j.recoverable)
            .cloned()
            .collect()
    }

    /// Bump `attempts`; the job becomes unrecoverable once
    /// `attempts >= max_attempts`, regardless of its original classification.
    pub fn increment_attempts(&self, id: Uuid) -> Option<FailedJob> {
        let mut jobs = self.jobs.lock().expect("dlq mutex poisoned");
        let job = jobs.iter_mut().find(|j| j.id == id)?;
        job.attempts += 1;
        job.last_attempt_at = Utc::now();
        if job.attempts >= job.max_attempts {
            job.recoverable = false;
        }
        Some(job.clone())
    }

    pub fn mark_recovered(&self, id: Uuid) -> bool {
        let mut jobs = self.jobs.lock().expect("dlq mutex poisoned");
        if let Some(pos) = jobs.iter().position(|j| j.id == id) {
            jobs.remove(pos);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn stats(&self) -> DlqStats {
        let jobs = self.jobs.lock().expect("dlq mutex poisoned");
        let mut by_stage = std::collections::BTreeMap::new();
        let mut recoverable = 0;
        for job in jobs.iter() {
            let key = match job.stage {
                Stage::Upload => "upload",
                Stage::Ocr => "ocr",
                Stage::Analysis => "analysis",
                Stage::Storage => "storage",
            };
            *by_stage.entry(key.to_string()).or_insert(0) += 1;
            if job.recoverable {
                recoverable += 1;
            }
        }
        DlqStats {
            total: jobs.len(),
            recoverable,
            unrecoverable: jobs.len() - recoverable,
            by_stage,
        }
    }

    pub fn purge_older_than(&self, hours: i64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::hours(hours);
        let mut jobs = self.jobs.lock().expect("dlq mutex poisoned");
        let before = jobs.len();
        jobs.retain(|j| j.created_at >= cutoff);
        before - jobs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(message: &str) -> NewFailedJob {
        NewFailedJob {
            document_id: "doc-1".to_string(),
            correlation_id: None,
            stage: Stage::Ocr,
            error: JobError { message: message.to_string(), code: None },
            max_attempts: 3,
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn classifies_transient_errors_as_recoverable() {
        let dlq = DeadLetterQueue::new(10);
        let id = dlq.add(job("upstream returned 429 Too Many Requests"));
        assert!(dlq.get(id).unwrap().recoverable);
    }

    #[test]
    fn classifies_unknown_errors_as_unrecoverable() {
        let dlq = DeadLetterQueue::new(10);
        let id = dlq.add(job("invalid document format"));
        assert!(!dlq.get(id).unwrap().recoverable);
    }

    #[test]
    fn evicts_oldest_on_overflow() {
        let dlq = DeadLetterQueue::new(2);
        let first = dlq.add(job("timeout"));
        dlq.add(job("timeout"));
        dlq.add(job("timeout"));
        assert!(dlq.get(first).is_none());
        assert_eq!(dlq.stats().total, 2);
    }

    #[test]
    fn increment_attempts_marks_unrecoverable_at_max() {
        let dlq = DeadLetterQueue::new(10);
        let id = dlq.add(job("connection reset by peer"));
        dlq.increment_attempts(id);
        dlq.increment_attempts(id);
        let job = dlq.increment_attempts(id).unwrap();
        assert_eq!(job.attempts, 3);
        assert!(!job.recoverable);
    }

    #[test]
    fn mark_recovered_removes_entry() {
        let dlq = DeadLetterQueue::new(10);
        let id = dlq.add(job("timeout"));
        assert!(dlq.mark_recovered(id));
        assert!(dlq.get(id).is_none());
    }

    #[test]
    fn list_by_stage_and_document_filter_correctly() {
        let dlq = DeadLetterQueue::new(10);
        dlq.add(job("timeout"));
        assert_eq!(dlq.list_by_stage(Stage::Ocr).len(), 1);
        assert_eq!(dlq.list_by_stage(Stage::Storage).len(), 0);
        assert_eq!(dlq.list_by_document("doc-1").len(), 1);
    }

    #[test]
    fn stats_reflect_recoverable_and_stage_breakdown() {
        let dlq = DeadLetterQueue::new(10);
        dlq.add(job("timeout"));
        dlq.add(job("invalid format"));
        let stats = dlq.stats();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.recoverable, 1);
        assert_eq!(stats.unrecoverable, 1);
        assert_eq!(stats.by_stage["ocr"], 2);
    }
}
