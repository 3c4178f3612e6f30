//! Per-document pipeline orchestrator (§4.13): wires OCR, template
//! selection, field calibration, the canonical analyzer, and the advisory
//! interpreter into a single `process_document` call, plus the standalone
//! adapter doctor (§4.14).

pub mod bundle;
pub mod cancel;
pub mod doctor;
pub mod orchestrator;
pub mod types;

pub use bundle::ServiceBundle;
pub use cancel::Cancel;
pub use orchestrator::process_document;
pub use types::{OcrSource, PipelineInput, PipelineOutcome};
