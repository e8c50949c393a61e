//! Relationship validation against a project snapshot
//!
//! Create checks, in order:
//! 1. every identifier present (short-circuits)
//! 2. source table ≠ target table (short-circuits)
//! 3. referenced tables and fields exist
//! 4. no relationship already joins the same ordered table pair
//! 5. reverse pair present → warning only
//! 6. relationship name unused in the project
//! 7. field suitability for both endpoints
//! 8. field type compatibility
//! 9. proposed edge does not close a cycle
//!
//! Checks 3–9 all run and all report. Updates and deletions use their own,
//! narrower paths.

use chrono::Utc;
use uuid::Uuid;

use super::compatibility::{check_compatibility, check_suitability, Compatibility, Endpoint};
use super::types::{
    CascadeAction, Relationship, RelationshipDraft, RelationshipStatus, RelationshipUpdate,
};
use crate::project::ProjectSnapshot;
use crate::schema::{Field, ValidationIssue, ValidationReport, MAX_DISPLAY_NAME_LENGTH};

pub const MSG_REQUIRED: &str = "all relationship fields are required";
pub const MSG_SELF_REFERENCE: &str = "cannot create a relationship between a table and itself";
pub const MSG_DUPLICATE: &str = "a relationship already exists between these tables";
pub const MSG_REVERSE: &str =
    "a reverse relationship already exists between these tables and may create a circular dependency";
pub const MSG_CYCLE: &str = "this relationship would create a circular dependency";

/// Impact summary computed before a relationship is deleted.
///
/// Deletion is never blocked by other relationships; `report` carries a
/// warning when some exist and an error only when the relationship itself
/// is unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionImpact {
    pub relationship_id: Uuid,
    /// Other relationships touching the deleted relationship's source table
    pub related_count: usize,
    pub report: ValidationReport,
}

/// Validates relationship changes against one project's state.
///
/// Stateless apart from the borrowed snapshot; safe to use concurrently.
pub struct RelationshipValidator<'a> {
    snapshot: &'a ProjectSnapshot,
}

/// Endpoints resolved from a complete draft
struct Endpoints {
    project_id: Uuid,
    name: String,
    source_table: Uuid,
    source_field: Uuid,
    target_table: Uuid,
    target_field: Uuid,
}

impl<'a> RelationshipValidator<'a> {
    pub fn new(snapshot: &'a ProjectSnapshot) -> Self {
        Self { snapshot }
    }

    /// Validates a proposed relationship.
    pub fn validate_create(&self, draft: &RelationshipDraft) -> ValidationReport {
        let mut report = ValidationReport::new();

        let ends = match require_identifiers(draft) {
            Ok(ends) => ends,
            Err(missing) => {
                report.push_error(ValidationIssue::structural(
                    "relationship",
                    format!("{} (missing: {})", MSG_REQUIRED, missing.join(", ")),
                ));
                return report;
            }
        };

        if ends.source_table == ends.target_table {
            report.push_error(ValidationIssue::structural("relationship", MSG_SELF_REFERENCE));
            return report;
        }

        if ends.project_id != self.snapshot.project_id {
            report.push_error(ValidationIssue::not_found(
                "project_id",
                "relationship project does not match the supplied project state",
            ));
        }

        let source = self.resolve_field(&mut report, Endpoint::Source, ends.source_table, ends.source_field);
        let target = self.resolve_field(&mut report, Endpoint::Target, ends.target_table, ends.target_field);

        if self.pair_exists(ends.source_table, ends.target_table) {
            report.push_error(ValidationIssue::conflict("relationship", MSG_DUPLICATE));
        }
        if self.pair_exists(ends.target_table, ends.source_table) {
            report.push_warning("relationship", MSG_REVERSE);
        }

        if let Some(issue) = check_name(&ends.name) {
            report.push_error(issue);
        } else if let Some(issue) = self.name_taken(&ends.name, None) {
            report.push_error(issue);
        }

        if let Some(field) = source {
            report.extend_errors(check_suitability(field, Endpoint::Source));
        }
        if let Some(field) = target {
            report.extend_errors(check_suitability(field, Endpoint::Target));
        }

        if let (Some(s), Some(t)) = (source, target) {
            match check_compatibility(s.data_type(), t.data_type()) {
                Compatibility::Compatible => {}
                Compatibility::CompatibleWithWarning(warning) => {
                    report.push_warning("field_types", warning)
                }
                Compatibility::Incompatible(reason) => {
                    report.push_error(ValidationIssue::structural("field_types", reason))
                }
            }
        }

        if self
            .snapshot
            .graph()
            .would_create_cycle(ends.source_table, ends.target_table)
        {
            report.push_error(ValidationIssue::structural("relationship", MSG_CYCLE));
        }

        report
    }

    /// Validates a draft and builds the relationship record.
    ///
    /// On success the report still carries any warnings.
    pub fn build(&self, draft: &RelationshipDraft) -> Result<(Relationship, ValidationReport), ValidationReport> {
        let report = self.validate_create(draft);
        if !report.is_valid() {
            return Err(report);
        }
        let ends = require_identifiers(draft).map_err(|_| report.clone())?;

        let relationship = Relationship {
            id: Uuid::new_v4(),
            project_id: ends.project_id,
            name: ends.name.trim().to_string(),
            source_table_id: ends.source_table,
            source_field_id: ends.source_field,
            target_table_id: ends.target_table,
            target_field_id: ends.target_field,
            kind: draft.kind,
            on_delete: draft.on_delete,
            on_update: draft.on_update,
            status: RelationshipStatus::Active,
            created_at: Utc::now(),
        };
        Ok((relationship, report))
    }

    /// Validates a partial update of an existing relationship.
    pub fn validate_update(&self, relationship_id: Uuid, update: &RelationshipUpdate) -> ValidationReport {
        let mut report = ValidationReport::new();

        if self.snapshot.relationship(relationship_id).is_none() {
            report.push_error(ValidationIssue::not_found(
                "relationship",
                format!("relationship {} not found", relationship_id),
            ));
            return report;
        }

        if let Some(name) = &update.name {
            if let Some(issue) = check_name(name) {
                report.push_error(issue);
            } else if let Some(issue) = self.name_taken(name, Some(relationship_id)) {
                report.push_error(issue);
            }
        }

        for (scope, value) in [("on_delete", &update.on_delete), ("on_update", &update.on_update)] {
            if let Some(value) = value {
                if CascadeAction::parse(value).is_none() {
                    let allowed: Vec<_> = CascadeAction::ALL.iter().map(|a| a.as_str()).collect();
                    report.push_error(ValidationIssue::structural(
                        scope,
                        format!("{} must be one of: {}", scope, allowed.join(", ")),
                    ));
                }
            }
        }

        if let Some(status) = &update.status {
            if RelationshipStatus::parse(status).is_none() {
                let allowed: Vec<_> = RelationshipStatus::ALL.iter().map(|s| s.as_str()).collect();
                report.push_error(ValidationIssue::structural(
                    "status",
                    format!("status must be one of: {}", allowed.join(", ")),
                ));
            }
        }

        report
    }

    /// Validates an update and returns the updated record.
    pub fn apply_update(&self, relationship_id: Uuid, update: &RelationshipUpdate) -> Result<Relationship, ValidationReport> {
        let report = self.validate_update(relationship_id, update);
        if !report.is_valid() {
            return Err(report);
        }
        let mut relationship = self
            .snapshot
            .relationship(relationship_id)
            .cloned()
            .ok_or_else(|| report.clone())?;

        if let Some(name) = &update.name {
            relationship.name = name.trim().to_string();
        }
        if let Some(action) = update.on_delete.as_deref().and_then(CascadeAction::parse) {
            relationship.on_delete = action;
        }
        if let Some(action) = update.on_update.as_deref().and_then(CascadeAction::parse) {
            relationship.on_update = action;
        }
        if let Some(status) = update.status.as_deref().and_then(RelationshipStatus::parse) {
            relationship.status = status;
        }
        Ok(relationship)
    }

    /// Computes the impact of deleting a relationship.
    pub fn validate_delete(&self, relationship_id: Uuid) -> DeletionImpact {
        let mut report = ValidationReport::new();

        let Some(relationship) = self.snapshot.relationship(relationship_id) else {
            report.push_error(ValidationIssue::not_found(
                "relationship",
                format!("relationship {} not found", relationship_id),
            ));
            return DeletionImpact {
                relationship_id,
                related_count: 0,
                report,
            };
        };

        let related_count = self
            .snapshot
            .relationships_touching(relationship.source_table_id)
            .filter(|r| r.id != relationship_id)
            .count();

        if related_count > 0 {
            report.push_warning(
                "relationship",
                format!(
                    "{} other relationship(s) reference the source table",
                    related_count
                ),
            );
        }

        DeletionImpact {
            relationship_id,
            related_count,
            report,
        }
    }

    fn resolve_field(
        &self,
        report: &mut ValidationReport,
        endpoint: Endpoint,
        table_id: Uuid,
        field_id: Uuid,
    ) -> Option<&'a Field> {
        let (table_scope, field_scope) = match endpoint {
            Endpoint::Source => ("source_table", "source_field"),
            Endpoint::Target => ("target_table", "target_field"),
        };

        let Some(table) = self.snapshot.table(table_id) else {
            report.push_error(ValidationIssue::not_found(
                table_scope,
                format!("table {} not found", table_id),
            ));
            return None;
        };

        let field = table.field(field_id);
        if field.is_none() {
            report.push_error(ValidationIssue::not_found(
                field_scope,
                format!("field {} not found on table '{}'", field_id, table.name),
            ));
        }
        field
    }

    fn pair_exists(&self, source: Uuid, target: Uuid) -> bool {
        self.snapshot
            .relationships
            .iter()
            .any(|r| r.source_table_id == source && r.target_table_id == target)
    }

    fn name_taken(&self, name: &str, ignore: Option<Uuid>) -> Option<ValidationIssue> {
        let name = name.trim();
        self.snapshot
            .relationships
            .iter()
            .filter(|r| Some(r.id) != ignore)
            .any(|r| r.name == name)
            .then(|| {
                ValidationIssue::conflict(
                    "name",
                    format!("a relationship named '{}' already exists in this project", name),
                )
            })
    }
}

fn require_identifiers(draft: &RelationshipDraft) -> Result<Endpoints, Vec<&'static str>> {
    let mut missing = Vec::new();
    let name = draft
        .name
        .as_deref()
        .filter(|n| !n.trim().is_empty());

    if draft.project_id.is_none() {
        missing.push("project_id");
    }
    if name.is_none() {
        missing.push("name");
    }
    if draft.source_table_id.is_none() {
        missing.push("source_table_id");
    }
    if draft.source_field_id.is_none() {
        missing.push("source_field_id");
    }
    if draft.target_table_id.is_none() {
        missing.push("target_table_id");
    }
    if draft.target_field_id.is_none() {
        missing.push("target_field_id");
    }

    match (
        draft.project_id,
        name,
        draft.source_table_id,
        draft.source_field_id,
        draft.target_table_id,
        draft.target_field_id,
    ) {
        (Some(project_id), Some(name), Some(st), Some(sf), Some(tt), Some(tf)) => Ok(Endpoints {
            project_id,
            name: name.to_string(),
            source_table: st,
            source_field: sf,
            target_table: tt,
            target_field: tf,
        }),
        _ => Err(missing),
    }
}

fn check_name(name: &str) -> Option<ValidationIssue> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Some(ValidationIssue::structural("name", "name must not be empty"))
    } else if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        Some(ValidationIssue::structural(
            "name",
            format!("name must be at most {} characters", MAX_DISPLAY_NAME_LENGTH),
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DataType, IssueKind, Table};

    struct Fixture {
        snapshot: ProjectSnapshot,
        users: Uuid,
        users_id: Uuid,
        posts: Uuid,
        posts_user_id: Uuid,
        posts_id: Uuid,
    }

    fn fixture() -> Fixture {
        let project = Uuid::new_v4();
        let users = Table::new(project, "users", "alice")
            .with_field(Field::new(Uuid::nil(), "id", DataType::Text).required())
            .with_field(Field::new(Uuid::nil(), "email", DataType::Text).required());
        let posts = Table::new(project, "posts", "alice")
            .with_field(Field::new(Uuid::nil(), "id", DataType::Text).required())
            .with_field(Field::new(Uuid::nil(), "user_id", DataType::Text).required());

        Fixture {
            users: users.id,
            users_id: users.fields[0].id,
            posts: posts.id,
            posts_id: posts.fields[0].id,
            posts_user_id: posts.fields[1].id,
            snapshot: ProjectSnapshot::new(project).with_table(users).with_table(posts),
        }
    }

    fn users_to_posts(fx: &Fixture) -> RelationshipDraft {
        RelationshipDraft::between(
            fx.snapshot.project_id,
            "user_posts",
            (fx.users, fx.users_id),
            (fx.posts, fx.posts_user_id),
        )
    }

    #[test]
    fn test_valid_relationship() {
        let fx = fixture();
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&users_to_posts(&fx));
        assert!(report.is_valid(), "{}", report);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_identifiers_short_circuit() {
        let fx = fixture();
        let draft = RelationshipDraft {
            project_id: Some(fx.snapshot.project_id),
            name: Some("  ".into()),
            ..Default::default()
        };
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&draft);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.starts_with(MSG_REQUIRED));
        assert!(report.errors[0].message.contains("name"));
        assert!(report.errors[0].message.contains("target_field_id"));
    }

    #[test]
    fn test_self_reference_rejected() {
        let fx = fixture();
        let draft = RelationshipDraft::between(
            fx.snapshot.project_id,
            "loop",
            (fx.posts, fx.posts_id),
            (fx.posts, fx.posts_user_id),
        );
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&draft);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, MSG_SELF_REFERENCE);
    }

    #[test]
    fn test_duplicate_is_conflict() {
        let mut fx = fixture();
        let (rel, _) = RelationshipValidator::new(&fx.snapshot)
            .build(&users_to_posts(&fx))
            .unwrap();
        fx.snapshot.relationships.push(rel);

        let mut again = users_to_posts(&fx);
        again.name = Some("user_posts_2".into());
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&again);
        assert!(report.has_error_containing(MSG_DUPLICATE));
        assert!(report.has_kind(IssueKind::Conflict));
        assert!(!report.has_error_containing(MSG_CYCLE));
    }

    #[test]
    fn test_reverse_pair_warns_and_cycle_rejects() {
        let mut fx = fixture();
        let (rel, _) = RelationshipValidator::new(&fx.snapshot)
            .build(&users_to_posts(&fx))
            .unwrap();
        fx.snapshot.relationships.push(rel);

        // posts.id -> users.<needs *_id target>; add a suitable target field
        let users_table = fx.snapshot.table_mut(fx.users).unwrap();
        let mut post_ref = Field::new(fx.users, "post_id", DataType::Text);
        post_ref.position = 2;
        let post_ref_id = post_ref.id;
        users_table.fields.push(post_ref);

        let reverse = RelationshipDraft::between(
            fx.snapshot.project_id,
            "post_users",
            (fx.posts, fx.posts_id),
            (fx.users, post_ref_id),
        );
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&reverse);
        assert!(report.has_warning_containing("reverse relationship"));
        assert!(report.has_error_containing(MSG_CYCLE));
    }

    #[test]
    fn test_unknown_field_is_not_found() {
        let fx = fixture();
        let mut draft = users_to_posts(&fx);
        draft.target_field_id = Some(Uuid::new_v4());
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&draft);
        assert!(report.has_kind(IssueKind::NotFound));
        assert_eq!(report.errors[0].scope, "target_field");
    }

    #[test]
    fn test_unsuitable_and_incompatible_fields_all_reported() {
        let mut fx = fixture();
        let users_table = fx.snapshot.table_mut(fx.users).unwrap();
        let flag = Field::new(fx.users, "active", DataType::Boolean);
        let flag_id = flag.id;
        users_table.fields.push(flag);

        let mut draft = users_to_posts(&fx);
        draft.source_field_id = Some(flag_id);
        let report = RelationshipValidator::new(&fx.snapshot).validate_create(&draft);

        assert!(report.has_error_containing("must be marked as required"));
        assert!(report.has_error_containing("primary key or unique identifier"));
        assert!(report.has_error_containing("not suitable for relationships"));
        assert!(report.has_error_containing("incompatible: boolean and text"));
    }

    #[test]
    fn test_number_endpoints_warn() {
        let project = Uuid::new_v4();
        let a = Table::new(project, "a", "x")
            .with_field(Field::new(Uuid::nil(), "id", DataType::Number).required());
        let b = Table::new(project, "b", "x")
            .with_field(Field::new(Uuid::nil(), "a_id", DataType::Number));
        let draft = RelationshipDraft::between(
            project,
            "a_b",
            (a.id, a.fields[0].id),
            (b.id, b.fields[0].id),
        );
        let snapshot = ProjectSnapshot::new(project).with_table(a).with_table(b);

        let report = RelationshipValidator::new(&snapshot).validate_create(&draft);
        assert!(report.is_valid());
        assert!(report.has_warning_containing("precision and scale"));
    }

    #[test]
    fn test_update_enumerations() {
        let mut fx = fixture();
        let (rel, _) = RelationshipValidator::new(&fx.snapshot)
            .build(&users_to_posts(&fx))
            .unwrap();
        let rel_id = rel.id;
        fx.snapshot.relationships.push(rel);
        let validator = RelationshipValidator::new(&fx.snapshot);

        let ok = RelationshipUpdate {
            on_delete: Some("set null".into()),
            on_update: Some("CASCADE".into()),
            status: Some("inactive".into()),
            ..Default::default()
        };
        let updated = validator.apply_update(rel_id, &ok).unwrap();
        assert_eq!(updated.on_delete, CascadeAction::SetNull);
        assert_eq!(updated.status, RelationshipStatus::Inactive);

        let bad = RelationshipUpdate {
            on_delete: Some("explode".into()),
            on_update: Some("ripple".into()),
            status: Some("archived".into()),
            ..Default::default()
        };
        let report = validator.validate_update(rel_id, &bad);
        let scopes: Vec<_> = report.errors.iter().map(|e| e.scope.as_str()).collect();
        assert_eq!(scopes, vec!["on_delete", "on_update", "status"]);
    }

    #[test]
    fn test_update_name_uniqueness_ignores_self() {
        let mut fx = fixture();
        let (rel, _) = RelationshipValidator::new(&fx.snapshot)
            .build(&users_to_posts(&fx))
            .unwrap();
        let rel_id = rel.id;
        fx.snapshot.relationships.push(rel.clone());

        let mut other = rel;
        other.id = Uuid::new_v4();
        other.name = "taken".into();
        fx.snapshot.relationships.push(other);

        let validator = RelationshipValidator::new(&fx.snapshot);
        let same = RelationshipUpdate {
            name: Some("user_posts".into()),
            ..Default::default()
        };
        assert!(validator.validate_update(rel_id, &same).is_valid());

        let clash = RelationshipUpdate {
            name: Some("taken".into()),
            ..Default::default()
        };
        assert!(validator.validate_update(rel_id, &clash).has_kind(IssueKind::Conflict));

        assert!(validator
            .validate_update(Uuid::new_v4(), &same)
            .has_kind(IssueKind::NotFound));
    }

    #[test]
    fn test_delete_impact_counts_others() {
        let mut fx = fixture();
        let (rel, _) = RelationshipValidator::new(&fx.snapshot)
            .build(&users_to_posts(&fx))
            .unwrap();
        let rel_id = rel.id;
        fx.snapshot.relationships.push(rel.clone());

        let impact = RelationshipValidator::new(&fx.snapshot).validate_delete(rel_id);
        assert_eq!(impact.related_count, 0);
        assert!(impact.report.is_valid());
        assert!(impact.report.warnings.is_empty());

        let mut sibling = rel;
        sibling.id = Uuid::new_v4();
        sibling.name = "sibling".into();
        fx.snapshot.relationships.push(sibling);

        let impact = RelationshipValidator::new(&fx.snapshot).validate_delete(rel_id);
        assert_eq!(impact.related_count, 1);
        assert!(impact.report.is_valid());
        assert!(impact.report.has_warning_containing("1 other relationship(s)"));

        let missing = RelationshipValidator::new(&fx.snapshot).validate_delete(Uuid::new_v4());
        assert!(!missing.report.is_valid());
    }
}
