//! Artifact file-naming conventions from §6.

use camino::{Utf8Path, Utf8PathBuf};

/// Root directory under which all artifact kinds are written.
pub fn artifacts_root(base: &Utf8Path) -> Utf8PathBuf {
    base.join("artifacts")
}

pub fn selection_trace_path(base: &Utf8Path, document_id: &str, epoch_ms: u128) -> Utf8PathBuf {
    artifacts_root(base)
        .join("selection")
        .join(format!("selection_trace_{document_id}_{epoch_ms}.json"))
}

pub fn activation_report_path(base: &Utf8Path, version_id: &str, epoch_ms: u128) -> Utf8PathBuf {
    artifacts_root(base)
        .join("activation")
        .join(format!("activation_report_{version_id}_{epoch_ms}.json"))
}

pub fn insights_path(base: &Utf8Path, correlation_id: &str) -> Utf8PathBuf {
    artifacts_root(base)
        .join("insights")
        .join(format!("insights_{correlation_id}.json"))
}

pub fn audit_report_path(base: &Utf8Path, document_id: &str) -> Utf8PathBuf {
    artifacts_root(base)
        .join("audit")
        .join(format!("audit_report_{document_id}.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_trace_path_matches_convention() {
        let base = Utf8Path::new("/tmp/audit");
        let path = selection_trace_path(base, "doc123", 42);
        assert_eq!(
            path.as_str(),
            "/tmp/audit/artifacts/selection/selection_trace_doc123_42.json"
        );
    }

    #[test]
    fn audit_report_path_matches_convention() {
        let base = Utf8Path::new("/tmp/audit");
        let path = audit_report_path(base, "doc123");
        assert_eq!(
            path.as_str(),
            "/tmp/audit/artifacts/audit/audit_report_doc123.json"
        );
    }
}
