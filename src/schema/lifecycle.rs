//! Table lifecycle
//!
//! ```text
//! draft ──► active ──► deprecated
//!   │  ◄──┘ (only while unreferenced)
//!   └────────────────► deprecated
//! ```
//!
//! Deprecated is terminal. Tables are never physically removed.

use super::errors::{ValidationIssue, ValidationReport};
use super::types::{Table, TableStatus};
use crate::relationship::Relationship;

/// Checks whether `table` may move to status `to`.
///
/// `relationships` is the project's relationship set; it decides whether
/// an active table is still allowed to return to draft.
pub fn validate_transition(
    table: &Table,
    to: TableStatus,
    relationships: &[Relationship],
) -> ValidationReport {
    let mut report = ValidationReport::new();
    let from = table.status;

    match (from, to) {
        (a, b) if a == b => {
            report.push_error(ValidationIssue::structural(
                "status",
                format!("table is already {}", a),
            ));
        }
        (TableStatus::Draft, TableStatus::Active) => {
            if table.fields.is_empty() {
                report.push_error(ValidationIssue::structural(
                    "status",
                    "a table needs at least one field before it can become active",
                ));
            }
        }
        (TableStatus::Draft, TableStatus::Deprecated)
        | (TableStatus::Active, TableStatus::Deprecated) => {}
        (TableStatus::Active, TableStatus::Draft) => {
            let references = relationships
                .iter()
                .filter(|r| r.touches_table(table.id))
                .count();
            if references > 0 {
                report.push_error(ValidationIssue::conflict(
                    "status",
                    format!(
                        "table is referenced by {} relationship(s) and cannot return to draft",
                        references
                    ),
                ));
            }
        }
        (TableStatus::Deprecated, _) => {
            report.push_error(ValidationIssue::structural(
                "status",
                "deprecated tables cannot change status",
            ));
        }
        // Only same-status pairs reach here, and the guard arm takes those.
        _ => {
            report.push_error(ValidationIssue::structural(
                "status",
                format!("cannot move table from {} to {}", from, to),
            ));
        }
    }

    report
}
