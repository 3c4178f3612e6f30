//! Pipeline input/output shapes (§4.13).

use auditor_analyzer::AuditReport;
use auditor_llm::types::InsightsArtifact;
use auditor_selectors::SelectionTrace;
use auditor_templates::ActivationReport;

#[derive(Debug, Clone)]
pub enum OcrSource {
    Url(String),
    Base64 { data: String, mime_type: String },
}

#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub document_id: String,
    pub source: OcrSource,
    pub include_raw_ocr_insights: bool,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub audit_report: AuditReport,
    pub insights_artifact: Option<InsightsArtifact>,
    pub selection_trace: SelectionTrace,
    pub activation_report: Option<ActivationReport>,
}
