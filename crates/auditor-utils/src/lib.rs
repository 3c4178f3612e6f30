//! Shared primitives for the job-sheet audit pipeline: the error taxonomy,
//! id types, content hashing, and artifact I/O (atomic write + canonical JSON).

pub mod atomic_write;
pub mod canonicalization;
pub mod error;
pub mod exit_codes;
pub mod hashing;
pub mod ids;
pub mod paths;

pub use error::AuditError;
pub use ids::{CorrelationId, DocumentId, RequestId};
