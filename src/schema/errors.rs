//! Validation report types
//!
//! Every validator in schemagate returns its findings as data rather than
//! failing on the first problem:
//!
//! - Errors block the operation
//! - Warnings never block and are surfaced for display
//! - Each finding carries a scope (what it is about) and a kind
//!
//! Display format: `"<scope>: <message>"`, joined by `", "`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Malformed input: bad identifier, missing value, type mismatch.
    /// Depends on the input alone.
    Structural,
    /// Collides with current shared state (duplicate name, existing
    /// relationship). Potentially transient.
    Conflict,
    /// Referenced table, field or relationship is absent from the
    /// state supplied by the caller.
    NotFound,
    /// Semantic caveat. Only ever appears in the warning list.
    Warning,
}

impl IssueKind {
    /// Returns the string code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::Structural => "SG_STRUCTURAL",
            IssueKind::Conflict => "SG_CONFLICT",
            IssueKind::NotFound => "SG_NOT_FOUND",
            IssueKind::Warning => "SG_WARNING",
        }
    }

    /// Conflicts depend on shared state and may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, IssueKind::Conflict)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// What the finding is about (e.g. "name", "fields.email", "source_field")
    pub scope: String,
    /// Finding category
    pub kind: IssueKind,
    /// Human-readable explanation
    pub message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            kind,
            message: message.into(),
        }
    }

    pub fn structural(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueKind::Structural, scope, message)
    }

    pub fn conflict(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueKind::Conflict, scope, message)
    }

    pub fn not_found(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(IssueKind::NotFound, scope, message)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.scope, self.message)
    }
}

/// Outcome of a validation call.
///
/// `valid` is true exactly when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates an empty, valid report
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Builds a report from a list of errors
    pub fn from_errors(errors: Vec<ValidationIssue>) -> Self {
        let mut report = Self::new();
        report.extend_errors(errors);
        report
    }

    /// Records a blocking finding
    pub fn push_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
        self.valid = false;
    }

    /// Records a non-blocking finding
    pub fn push_warning(&mut self, scope: impl Into<String>, message: impl Into<String>) {
        self.warnings
            .push(ValidationIssue::new(IssueKind::Warning, scope, message));
    }

    pub fn extend_errors(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            self.push_error(issue);
        }
    }

    /// Merges another report's findings into this one
    pub fn merge(&mut self, other: ValidationReport) {
        self.extend_errors(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True if any error has the given kind
    pub fn has_kind(&self, kind: IssueKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    /// True if any error message contains `needle`
    pub fn has_error_containing(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.message.contains(needle))
    }

    /// True if any warning message contains `needle`
    pub fn has_warning_containing(&self, needle: &str) -> bool {
        self.warnings.iter().any(|w| w.message.contains(needle))
    }

    /// Display summary of the errors: `"<scope>: <message>"` joined by `", "`
    pub fn error_summary(&self) -> String {
        join_issues(&self.errors)
    }

    /// Display summary of the warnings
    pub fn warning_summary(&self) -> String {
        join_issues(&self.warnings)
    }
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "valid")
        } else {
            write!(f, "{}", self.error_summary())
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
