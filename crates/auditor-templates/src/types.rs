//! Data model for the template registry (§3, §4.9).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Currency,
    List,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default)]
    pub extraction_hints: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Required,
    Format,
    Range,
    Pattern,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecRule {
    pub rule_id: String,
    pub field: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<(f64, f64)>,
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecJson {
    pub fields: Vec<SpecField>,
    pub rules: Vec<SpecRule>,
}

impl SpecJson {
    /// Every rule MUST reference a declared field (§3 invariant).
    #[must_use]
    pub fn dangling_rule_fields(&self) -> Vec<String> {
        let field_ids: std::collections::HashSet<&str> =
            self.fields.iter().map(|f| f.id.as_str()).collect();
        self.rules
            .iter()
            .filter(|r| !field_ids.contains(r.field.as_str()))
            .map(|r| r.rule_id.clone())
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptionalToken {
    pub token: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionConfig {
    #[serde(default)]
    pub required_tokens_all: Vec<String>,
    #[serde(default)]
    pub required_tokens_any: Vec<String>,
    #[serde(default)]
    pub optional_tokens: Vec<OptionalToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_code_regex: Option<String>,
}

impl SelectionConfig {
    #[must_use]
    pub fn is_non_empty(&self) -> bool {
        !self.required_tokens_all.is_empty()
            || !self.required_tokens_any.is_empty()
            || self.form_code_regex.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiRegion {
    pub name: String,
    pub field: String,
    pub page: u32,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoiConfig {
    pub regions: Vec<RoiRegion>,
    #[serde(default)]
    pub require_critical_rois: bool,
    #[serde(default)]
    pub allowed_missing_rois: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Active,
    Deprecated,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpectedOutcome {
    Pass,
    Fail,
    ReviewQueue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    pub case_id: String,
    pub description: String,
    pub input_text: String,
    pub expected_outcome: ExpectedOutcome,
    #[serde(default)]
    pub expected_reason_codes: Vec<String>,
    #[serde(default)]
    pub expected_fields: BTreeMap<String, String>,
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixturePack {
    pub pack_version: u32,
    pub hash_sha256: String,
    pub cases: Vec<FixtureCase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditFields {
    pub creator: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateVersion {
    pub version_id: String,
    pub slug: String,
    pub spec: SpecJson,
    pub selection_config: SelectionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_config: Option<RoiConfig>,
    pub status: VersionStatus,
    pub change_note: String,
    pub audit: AuditFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixture_pack: Option<FixturePack>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub slug: String,
    pub versions: Vec<TemplateVersion>,
}

impl Template {
    #[must_use]
    pub fn active_version(&self) -> Option<&TemplateVersion> {
        self.versions.iter().find(|v| v.status == VersionStatus::Active)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsotMode {
    Strict,
    Permissive,
}
