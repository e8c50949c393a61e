//! Table definition validation
//!
//! Validation semantics:
//! - Structural name follows storage identifier rules
//! - Description is at most `max_description_length` characters
//! - At least one field
//! - Every field: identifier, configuration, default value
//! - Field structural names unique within the table
//!
//! All findings are accumulated; a single call surfaces every problem.
//! Uniqueness of the table name within its project needs the project's
//! persisted tables, which the caller supplies.

use std::collections::HashSet;

use uuid::Uuid;

use super::constraints::{parse_config, validate_config, validate_default};
use super::errors::{ValidationIssue, ValidationReport};
use super::identifier::validate_identifier;
use super::types::{Field, FieldConfig, FieldDraft, Table, TableDraft, TableStatus};

/// Default description limit
pub const DEFAULT_MAX_DESCRIPTION_LENGTH: usize = 500;

/// Display names longer than this are rejected
pub const MAX_DISPLAY_NAME_LENGTH: usize = 255;

/// Validates table and field drafts.
///
/// Holds configuration only; validation never mutates anything and the
/// same input always yields the same report.
#[derive(Debug, Clone)]
pub struct TableValidator {
    max_description_length: usize,
}

impl Default for TableValidator {
    fn default() -> Self {
        Self {
            max_description_length: DEFAULT_MAX_DESCRIPTION_LENGTH,
        }
    }
}

impl TableValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a validator with a custom description limit
    pub fn with_max_description_length(max_description_length: usize) -> Self {
        Self {
            max_description_length,
        }
    }

    /// Validates a single field draft.
    pub fn validate_field(&self, draft: &FieldDraft) -> ValidationReport {
        let (_, issues) = check_field(&field_scope(draft, 0), draft);
        ValidationReport::from_errors(issues)
    }

    /// Validates a table draft on its own.
    pub fn validate_table(&self, draft: &TableDraft) -> ValidationReport {
        let mut report = ValidationReport::new();

        if let Some(issue) = validate_identifier("name", &draft.name) {
            report.push_error(issue);
        }

        if draft.display_name.chars().count() > MAX_DISPLAY_NAME_LENGTH {
            report.push_error(ValidationIssue::structural(
                "display_name",
                format!("display name must be at most {} characters", MAX_DISPLAY_NAME_LENGTH),
            ));
        }

        if let Some(description) = &draft.description {
            if description.chars().count() > self.max_description_length {
                report.push_error(ValidationIssue::structural(
                    "description",
                    format!(
                        "description must be at most {} characters",
                        self.max_description_length
                    ),
                ));
            }
        }

        if draft.fields.is_empty() {
            report.push_error(ValidationIssue::structural(
                "fields",
                "table must have at least one field",
            ));
        }

        for (index, field) in draft.fields.iter().enumerate() {
            let (_, issues) = check_field(&field_scope(field, index), field);
            report.extend_errors(issues);
        }

        if let Some(duplicate) = first_duplicate(draft.fields.iter().map(|f| f.name.as_str())) {
            report.push_error(ValidationIssue::structural(
                "fields",
                format!("field names must be unique (duplicate '{}')", duplicate),
            ));
        }

        report
    }

    /// Validates a table draft against the project it will be created in.
    ///
    /// Adds a conflict when another table already uses the structural name.
    pub fn validate_table_in_project(&self, draft: &TableDraft, existing: &[Table]) -> ValidationReport {
        let mut report = self.validate_table(draft);
        if let Some(issue) = check_table_name_available(&draft.name, existing, None) {
            report.push_error(issue);
        }
        report
    }

    /// Validates a draft and converts it into a new `draft`-status table.
    pub fn build_table(
        &self,
        draft: &TableDraft,
        project_id: Uuid,
        existing: &[Table],
        created_by: &str,
    ) -> Result<Table, ValidationReport> {
        let report = self.validate_table_in_project(draft, existing);
        if !report.is_valid() {
            return Err(report);
        }

        // A blank display name falls back to the structural name
        let mut table = Table::new(project_id, draft.name.clone(), created_by);
        if !draft.display_name.trim().is_empty() {
            table.display_name = draft.display_name.clone();
        }
        table.description = draft.description.clone();
        table.status = TableStatus::Draft;
        table.schema_snapshot = serde_json::to_value(draft).unwrap_or_default();

        for (index, field_draft) in draft.fields.iter().enumerate() {
            let field = self.build_field(field_draft, table.id, index as u32)?;
            table.fields.push(field);
        }

        Ok(table)
    }

    /// Validates a field draft and converts it into a `Field`.
    pub fn build_field(
        &self,
        draft: &FieldDraft,
        table_id: Uuid,
        position: u32,
    ) -> Result<Field, ValidationReport> {
        let (config, issues) = check_field(&field_scope(draft, position as usize), draft);
        match config {
            Some(config) if issues.is_empty() => Ok(Field {
                id: Uuid::new_v4(),
                table_id,
                name: draft.name.clone(),
                display_name: if draft.display_name.trim().is_empty() {
                    draft.name.clone()
                } else {
                    draft.display_name.clone()
                },
                required: draft.required,
                default_value: draft.default_value.clone(),
                config,
                position: draft.position.unwrap_or(position),
            }),
            _ => Err(ValidationReport::from_errors(issues)),
        }
    }
}

/// Conflict issue if `name` is taken by a table in `existing`.
///
/// `ignore` excludes one table (the one being renamed).
pub fn check_table_name_available(
    name: &str,
    existing: &[Table],
    ignore: Option<Uuid>,
) -> Option<ValidationIssue> {
    existing
        .iter()
        .filter(|t| Some(t.id) != ignore)
        .any(|t| t.name == name)
        .then(|| {
            ValidationIssue::conflict(
                "name",
                format!("a table named '{}' already exists in this project", name),
            )
        })
}

/// Runs identifier, configuration and default checks for one field.
///
/// Returns the parsed configuration when parsing succeeded, even if
/// consistency checks failed.
fn check_field(scope: &str, draft: &FieldDraft) -> (Option<FieldConfig>, Vec<ValidationIssue>) {
    let mut issues = Vec::new();

    if let Some(issue) = validate_identifier(scope, &draft.name) {
        issues.push(issue);
    }

    let config = match parse_config(scope, &draft.data_type, &draft.config) {
        Ok(config) => config,
        Err(parse_issues) => {
            issues.extend(parse_issues);
            return (None, issues);
        }
    };

    let config_issues = validate_config(scope, &config);
    let config_ok = config_issues.is_empty();
    issues.extend(config_issues);

    // Defaults are only meaningful against a consistent configuration.
    if config_ok {
        if let Some(default) = &draft.default_value {
            issues.extend(validate_default(scope, &config, default));
        }
    }

    (Some(config), issues)
}

fn field_scope(draft: &FieldDraft, index: usize) -> String {
    if draft.name.is_empty() {
        format!("fields[{}]", index)
    } else {
        format!("fields.{}", draft.name)
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.into_iter().find(|name| !seen.insert(*name))
}
