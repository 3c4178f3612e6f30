//! The built-in default template auto-initialized by the registry in
//! permissive SSOT mode (§4.9): ten rules covering a generic job sheet.

use crate::types::{
    FieldType, RuleType, Severity, SpecField, SpecJson, SpecRule,
};

#[must_use]
pub fn build() -> SpecJson {
    let fields = vec![
        field("engineerSignOff", "Engineer Sign-off", FieldType::Boolean, true),
        field("date", "Date of Service", FieldType::Date, true),
        field("serialNumber", "Serial Number", FieldType::String, true),
        field("technician", "Technician", FieldType::String, true),
        field("workDescription", "Work Description", FieldType::String, true),
        field("parts", "Parts Used", FieldType::List, false),
        field("timeIn", "Time In", FieldType::String, true),
        field("timeOut", "Time Out", FieldType::String, true),
        field("customer", "Customer", FieldType::String, true),
        field("jobReference", "Job Number", FieldType::String, true),
        field("assetId", "Asset ID", FieldType::String, true),
    ];

    let rules = vec![
        rule("R001", "engineerSignOff", RuleType::Required, Severity::Critical, None),
        rule("R002", "date", RuleType::Format, Severity::Major, Some(r"^\d{2}[/-]\d{2}[/-]\d{4}$")),
        rule("R003", "serialNumber", RuleType::Pattern, Severity::Major, Some(r"^SN-\d{5}-[A-Z]{2}$")),
        rule("R004", "technician", RuleType::Required, Severity::Major, None),
        rule("R005", "workDescription", RuleType::Required, Severity::Minor, None),
        rule("R006", "parts", RuleType::Custom, Severity::Info, None),
        rule("R007", "timeIn", RuleType::Format, Severity::Major, Some(r"^\d{2}:\d{2}$")),
        rule("R008", "timeOut", RuleType::Format, Severity::Major, Some(r"^\d{2}:\d{2}$")),
        rule("R009", "customer", RuleType::Required, Severity::Minor, None),
        rule("R010", "jobReference", RuleType::Pattern, Severity::Critical, Some(r"^JOB-\d{6}$")),
    ];

    SpecJson { fields, rules }
}

fn field(id: &str, label: &str, field_type: FieldType, required: bool) -> SpecField {
    SpecField {
        id: id.to_string(),
        label: label.to_string(),
        field_type,
        required,
        extraction_hints: Vec::new(),
        aliases: Vec::new(),
    }
}

fn rule(rule_id: &str, field: &str, rule_type: RuleType, severity: Severity, pattern: Option<&str>) -> SpecRule {
    SpecRule {
        rule_id: rule_id.to_string(),
        field: field.to_string(),
        rule_type,
        severity,
        pattern: pattern.map(str::to_string),
        range: None,
        enabled: true,
        tags: Vec::new(),
    }
}
