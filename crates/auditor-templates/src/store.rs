//! Registry storage backends (§3, §6). The pipeline treats the registry as
//! an opaque key-value interface; `RegistryStore` is that interface. An
//! in-memory implementation backs tests; a file-backed implementation
//! persists templates as canonical JSON under a base directory, suitable
//! for a single-node deployment.

use crate::types::Template;
use auditor_utils::AuditError;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub trait RegistryStore: Send + Sync {
    fn get(&self, slug: &str) -> Result<Option<Template>, AuditError>;
    fn put(&self, template: &Template) -> Result<(), AuditError>;
    fn list(&self) -> Result<Vec<Template>, AuditError>;
    fn delete(&self, slug: &str) -> Result<(), AuditError>;
}

#[derive(Default)]
pub struct InMemoryRegistryStore {
    templates: Mutex<BTreeMap<String, Template>>,
}

impl InMemoryRegistryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RegistryStore for InMemoryRegistryStore {
    fn get(&self, slug: &str) -> Result<Option<Template>, AuditError> {
        Ok(self.templates.lock().expect("poisoned").get(slug).cloned())
    }

    fn put(&self, template: &Template) -> Result<(), AuditError> {
        self.templates
            .lock()
            .expect("poisoned")
            .insert(template.slug.clone(), template.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Template>, AuditError> {
        Ok(self.templates.lock().expect("poisoned").values().cloned().collect())
    }

    fn delete(&self, slug: &str) -> Result<(), AuditError> {
        self.templates.lock().expect("poisoned").remove(slug);
        Ok(())
    }
}

/// File-backed store: one canonical-JSON file per template slug under
/// `base_dir/templates/<slug>.json`. Writes are copy-on-write: the new
/// content is written to a temp file then renamed into place, so a reader
/// never observes a partially written template.
pub struct FileRegistryStore {
    base_dir: Utf8PathBuf,
}

impl FileRegistryStore {
    /// # Errors
    /// Returns [`AuditError::Io`] if the templates directory cannot be created.
    pub fn new(base_dir: impl AsRef<Utf8Path>) -> Result<Self, AuditError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(base_dir.join("templates"))
            .map_err(|e| AuditError::Io(format!("failed to create templates directory: {e}")))?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, slug: &str) -> Utf8PathBuf {
        self.base_dir.join("templates").join(format!("{slug}.json"))
    }
}

impl RegistryStore for FileRegistryStore {
    fn get(&self, slug: &str) -> Result<Option<Template>, AuditError> {
        let path = self.path_for(slug);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)
            .map_err(|e| AuditError::Io(format!("failed to read template {slug}: {e}")))?;
        let template = serde_json::from_slice(&bytes).map_err(|e| AuditError::Contract {
            upstream: "registry-store".to_string(),
            reason: format!("corrupt template file for {slug}: {e}"),
        })?;
        Ok(Some(template))
    }

    fn put(&self, template: &Template) -> Result<(), AuditError> {
        let path = self.path_for(&template.slug);
        let json = auditor_utils::canonicalization::emit_jcs(template)?;
        auditor_utils::atomic_write::write_file_atomic(&path, &json)
    }

    fn list(&self) -> Result<Vec<Template>, AuditError> {
        let dir = self.base_dir.join("templates");
        let mut templates = Vec::new();
        let entries = std::fs::read_dir(&dir)
            .map_err(|e| AuditError::Io(format!("failed to list templates directory: {e}")))?;
        for entry in entries {
            let entry = entry.map_err(|e| AuditError::Io(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let bytes = std::fs::read(&path).map_err(|e| AuditError::Io(e.to_string()))?;
            let template: Template = serde_json::from_slice(&bytes).map_err(|e| AuditError::Contract {
                upstream: "registry-store".to_string(),
                reason: format!("corrupt template file {}: {e}", path.display()),
            })?;
            templates.push(template);
        }
        Ok(templates)
    }

    fn delete(&self, slug: &str) -> Result<(), AuditError> {
        let path = self.path_for(slug);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| AuditError::Io(format!("failed to delete template {slug}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AuditFields, SelectionConfig, TemplateVersion, VersionStatus};

    fn sample_template(slug: &str) -> Template {
        Template {
            slug: slug.to_string(),
            versions: vec![TemplateVersion {
                version_id: "v1".to_string(),
                slug: slug.to_string(),
                spec: crate::default_template::build(),
                selection_config: SelectionConfig::default(),
                roi_config: None,
                status: VersionStatus::Draft,
                change_note: "init".to_string(),
                audit: AuditFields {
                    creator: "system".to_string(),
                    created_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
                    updated_at: chrono::DateTime::from_timestamp(0, 0).unwrap(),
                },
                fixture_pack: None,
            }],
        }
    }

    #[test]
    fn in_memory_round_trips() {
        let store = InMemoryRegistryStore::new();
        store.put(&sample_template("t1")).unwrap();
        let fetched = store.get("t1").unwrap().unwrap();
        assert_eq!(fetched.slug, "t1");
        assert_eq!(store.list().unwrap().len(), 1);
        store.delete("t1").unwrap();
        assert!(store.get("t1").unwrap().is_none());
    }

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let base = Utf8Path::from_path(dir.path()).unwrap();
        let store = FileRegistryStore::new(base).unwrap();
        store.put(&sample_template("t2")).unwrap();
        let fetched = store.get("t2").unwrap().unwrap();
        assert_eq!(fetched.slug, "t2");
        assert_eq!(store.list().unwrap().len(), 1);
        store.delete("t2").unwrap();
        assert!(store.get("t2").unwrap().is_none());
    }
}
