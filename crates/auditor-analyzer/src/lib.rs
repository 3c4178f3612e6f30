//! Analyzer/validator (§4.12): applies spec rules to produce the canonical
//! `AuditReport`, either via the rule-based lenient fallback or, when an LLM
//! backend is configured, the LLM-backed path — both produce the same
//! schema.

pub mod errors;
pub mod llm_path;
pub mod rule_based;
pub mod types;

pub use errors::{circuit_open_report, pipeline_error_report, rate_limited_report};
pub use llm_path::{AnalyzerBackend, AnalyzerLlmOptions, MockAnalyzerBackend};
pub use rule_based::analyze as analyze_rule_based;
pub use types::{AuditReport, BoundingBox, Finding, OverallResult, ReasonCode, Severity};
