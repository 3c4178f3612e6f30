//! `TemplateRegistry` facade (§4.9): CRUD over templates/versions, activation
//! gate evaluation, fixture-pack storage/execution, ROI validation, and SSOT
//! enforcement. The pipeline only ever talks to this facade, never to the
//! store or activation module directly.

use crate::activation::{self, ActivationReport};
use crate::store::RegistryStore;
use crate::types::{SsotMode, Template, TemplateVersion, VersionStatus};
use auditor_utils::AuditError;
use std::sync::Arc;

/// `APP_ENV`/`NODE_ENV` values that force strict SSOT mode regardless of any
/// `TEMPLATE_SSOT_MODE` override (§4.9, §8).
const FORCED_STRICT_ENVIRONMENTS: &[&str] = &["production", "staging"];

pub struct TemplateRegistry {
    store: Arc<dyn RegistryStore>,
    environment: String,
    configured_mode: SsotMode,
}

impl TemplateRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn RegistryStore>, environment: impl Into<String>, configured_mode: SsotMode) -> Self {
        Self { store, environment: environment.into(), configured_mode }
    }

    /// The effective SSOT mode: `strict` is forced in production/staging and
    /// any attempted override is logged and ignored (§4.9, §8).
    #[must_use]
    pub fn ssot_mode(&self) -> SsotMode {
        if FORCED_STRICT_ENVIRONMENTS.contains(&self.environment.as_str()) {
            if self.configured_mode != SsotMode::Strict {
                tracing::warn!(
                    environment = %self.environment,
                    configured_mode = ?self.configured_mode,
                    "TEMPLATE_SSOT_MODE override ignored in forced-strict environment"
                );
            }
            return SsotMode::Strict;
        }
        self.configured_mode
    }

    /// Ensures at least one active template exists before the pipeline may
    /// proceed. Strict mode with no active templates raises `SSOT_VIOLATION`.
    /// Permissive mode auto-initializes and activates the built-in default
    /// template.
    ///
    /// # Errors
    /// Returns [`AuditError::SsotViolation`] in strict mode with no active
    /// templates, or a store error if persistence fails.
    pub fn ensure_templates_ready(&self) -> Result<(), AuditError> {
        self.ensure_templates_ready_with_report().map(|_| ())
    }

    /// Same as [`Self::ensure_templates_ready`], but surfaces the activation
    /// report produced when the default template had to be auto-initialized
    /// so the caller (the pipeline orchestrator) can attach it to the
    /// document's processing outcome. Returns `None` when an active template
    /// already existed and nothing had to be initialized.
    ///
    /// # Errors
    /// Returns [`AuditError::SsotViolation`] in strict mode with no active
    /// templates, or a store error if persistence fails.
    pub fn ensure_templates_ready_with_report(&self) -> Result<Option<ActivationReport>, AuditError> {
        if self.has_active_template()? {
            return Ok(None);
        }

        match self.ssot_mode() {
            SsotMode::Strict => Err(AuditError::SsotViolation),
            SsotMode::Permissive => {
                tracing::info!("no active templates in permissive mode, auto-initializing default template");
                self.init_default_template().map(Some)
            }
        }
    }

    fn has_active_template(&self) -> Result<bool, AuditError> {
        let templates = self.store.list()?;
        Ok(templates.iter().any(|t| t.active_version().is_some()))
    }

    fn init_default_template(&self) -> Result<ActivationReport, AuditError> {
        let version = default_template_version();
        let report = activation::evaluate(&version);
        if !report.passed() {
            return Err(AuditError::Validation {
                field_path: "default_template".to_string(),
                reason: format!("built-in default template failed activation: {:?}", report.violations),
                fix_path: "the built-in default template is expected to always pass activation; this indicates a bug".to_string(),
            });
        }
        let mut version = version;
        version.status = VersionStatus::Active;
        let template = Template { slug: version.slug.clone(), versions: vec![version] };
        self.store.put(&template)?;
        Ok(report)
    }

    /// Attempts to activate `version_id` within `slug`, evaluating all seven
    /// activation gates. On success, the version becomes `active` and any
    /// previously active version in the same template becomes `deprecated`
    /// (deprecation never deletes).
    ///
    /// # Errors
    /// Returns [`AuditError::Validation`] if any gate fails, or a store error.
    pub fn activate(&self, slug: &str, version_id: &str) -> Result<ActivationReport, AuditError> {
        let mut template = self
            .store
            .get(slug)?
            .ok_or_else(|| AuditError::Validation {
                field_path: format!("{slug}"),
                reason: "no such template slug".to_string(),
                fix_path: "Create the template before activating a version".to_string(),
            })?;

        let version = template
            .versions
            .iter()
            .find(|v| v.version_id == version_id)
            .cloned()
            .ok_or_else(|| AuditError::Validation {
                field_path: format!("{slug}/{version_id}"),
                reason: "no such version".to_string(),
                fix_path: "Create the version before activating it".to_string(),
            })?;

        let report = activation::evaluate(&version);
        if !report.passed() {
            return Ok(report);
        }

        for other in &mut template.versions {
            if other.status == VersionStatus::Active {
                other.status = VersionStatus::Deprecated;
            }
            if other.version_id == version_id {
                other.status = VersionStatus::Active;
            }
        }

        self.store.put(&template)?;
        Ok(report)
    }

    /// # Errors
    /// Propagates any store error.
    pub fn get(&self, slug: &str) -> Result<Option<Template>, AuditError> {
        self.store.get(slug)
    }

    /// # Errors
    /// Propagates any store error.
    pub fn put(&self, template: &Template) -> Result<(), AuditError> {
        self.store.put(template)
    }

    /// # Errors
    /// Propagates any store error.
    pub fn list(&self) -> Result<Vec<Template>, AuditError> {
        self.store.list()
    }

    /// Returns every template that currently has an active version, the set
    /// the selector scores against.
    ///
    /// # Errors
    /// Propagates any store error.
    pub fn active_templates(&self) -> Result<Vec<TemplateVersion>, AuditError> {
        Ok(self
            .store
            .list()?
            .into_iter()
            .filter_map(|t| t.active_version().cloned())
            .collect())
    }
}

fn default_template_version() -> TemplateVersion {
    use crate::types::{AuditFields, SelectionConfig};

    TemplateVersion {
        version_id: "default-v1".to_string(),
        slug: "default".to_string(),
        spec: crate::default_template::build(),
        selection_config: SelectionConfig {
            required_tokens_all: Vec::new(),
            required_tokens_any: vec!["jobsheet".to_string(), "job sheet".to_string(), "service report".to_string()],
            optional_tokens: Vec::new(),
            form_code_regex: None,
        },
        roi_config: None,
        status: VersionStatus::Draft,
        change_note: "auto-initialized built-in default template".to_string(),
        audit: AuditFields {
            creator: "system".to_string(),
            created_at: epoch(),
            updated_at: epoch(),
        },
        fixture_pack: Some(default_fixture_pack()),
    }
}

fn default_fixture_pack() -> crate::types::FixturePack {
    use crate::types::{ExpectedOutcome, FixtureCase};
    use std::collections::BTreeMap;

    let mut expected_fields = BTreeMap::new();
    expected_fields.insert("jobReference".to_string(), "JOB-000001".to_string());

    crate::types::FixturePack {
        pack_version: 1,
        hash_sha256: "default-template-fixture-v1".to_string(),
        cases: vec![FixtureCase {
            case_id: "default-complete".to_string(),
            description: "fully completed generic job sheet".to_string(),
            input_text: "jobsheet Engineer Sign-off: yes. Date of Service: 01/02/2026. \
                Serial Number: SN-12345-AB. Technician: Jo Bloggs. Work Description: replaced filter. \
                Time In: 09:00. Time Out: 10:00. Customer: Acme Ltd. Job Number: JOB-000001. Asset ID: A1."
                .to_string(),
            expected_outcome: ExpectedOutcome::Pass,
            expected_reason_codes: Vec::new(),
            expected_fields,
            required: true,
        }],
    }
}

fn epoch() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::from_timestamp(0, 0).expect("epoch is a valid timestamp")
}
