//! Atomic artifact writes: temp file, fsync, rename.
//!
//! Every on-disk artifact (selection trace, activation report, insights,
//! audit report) is written this way so concurrent readers never observe a
//! partially-written file.

use camino::Utf8Path;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

use crate::error::AuditError;

/// Atomically write `content` to `path`, creating parent directories as needed.
pub fn write_file_atomic(path: &Utf8Path, content: &str) -> Result<(), AuditError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AuditError::Io(e.to_string()))?;
    }

    let temp_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let mut temp_file = NamedTempFile::new_in(temp_dir).map_err(|e| AuditError::Io(e.to_string()))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| AuditError::Io(e.to_string()))?;
    temp_file.as_file().sync_all().map_err(|e| AuditError::Io(e.to_string()))?;

    temp_file
        .persist(path)
        .map_err(|e| AuditError::Io(e.error.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("out.json")).unwrap();
        write_file_atomic(&path, "{\"a\":1}").unwrap();
        let read_back = fs::read_to_string(&path).unwrap();
        assert_eq!(read_back, "{\"a\":1}");
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/deep/out.json")).unwrap();
        write_file_atomic(&path, "{}").unwrap();
        assert!(path.exists());
    }
}
