//! Field suitability and type compatibility for relationship endpoints
//!
//! Source endpoint: required, named `id` or `*_id`.
//! Target endpoint: named `*_id`.
//! Both: valid structural name, text or number type.
//!
//! Equal types are compatible. number/number and date/date additionally
//! warn, since storage-level equality of precision or format is not
//! guaranteed by the type alone.

use crate::schema::{check_identifier, DataType, Field, ValidationIssue};

/// Which end of a relationship a field sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Source,
    Target,
}

impl Endpoint {
    pub fn scope(&self) -> &'static str {
        match self {
            Endpoint::Source => "source_field",
            Endpoint::Target => "target_field",
        }
    }
}

/// Outcome of a compatibility check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    /// Compatible, with a caveat for the caller to display
    CompatibleWithWarning(String),
    Incompatible(String),
}

/// Checks whether `field` can serve as the given endpoint.
///
/// Every failed rule is reported.
pub fn check_suitability(field: &Field, endpoint: Endpoint) -> Vec<ValidationIssue> {
    let scope = endpoint.scope();
    let mut issues = Vec::new();

    if let Err(reason) = check_identifier(&field.name) {
        issues.push(ValidationIssue::structural(scope, reason));
    }

    let data_type = field.data_type();
    if !data_type.is_relationship_eligible() {
        issues.push(ValidationIssue::structural(
            scope,
            format!("{} fields are not suitable for relationships", data_type),
        ));
    }

    match endpoint {
        Endpoint::Source => {
            if !field.required {
                issues.push(ValidationIssue::structural(
                    scope,
                    "source field must be marked as required",
                ));
            }
            if !is_key_like(&field.name) {
                issues.push(ValidationIssue::structural(
                    scope,
                    "source field should be a primary key or unique identifier",
                ));
            }
        }
        Endpoint::Target => {
            if !field.name.ends_with("_id") {
                issues.push(ValidationIssue::structural(
                    scope,
                    "target field name should end with _id to indicate it's a foreign key",
                ));
            }
        }
    }

    issues
}

/// Compares the declared types of two endpoints.
pub fn check_compatibility(source: DataType, target: DataType) -> Compatibility {
    match (source, target) {
        (DataType::Text, DataType::Text) | (DataType::Boolean, DataType::Boolean) => {
            Compatibility::Compatible
        }
        (DataType::Number, DataType::Number) => Compatibility::CompatibleWithWarning(
            "number fields are compatible; double-check that precision and scale match".into(),
        ),
        (DataType::Date, DataType::Date) => Compatibility::CompatibleWithWarning(
            "date fields are compatible; double-check that date formats match".into(),
        ),
        (s, t) => Compatibility::Incompatible(format!(
            "field types are incompatible: {} and {}",
            s, t
        )),
    }
}

/// `id` or ends with `_id`
fn is_key_like(name: &str) -> bool {
    name == "id" || name.ends_with("_id")
}
