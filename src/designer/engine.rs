//! Schema designer
//!
//! Runs each design operation as: look up the table, validate the change
//! against the snapshot, make sure the caller may edit the table, then
//! apply the change to the snapshot. Validation happens before any lock
//! is taken, so a rejected change never leaves a lock behind.
//!
//! An optimistic lock is only honoured while its version marker matches
//! the table. Each committed table change moves the editor's own markers
//! forward, so other editors' markers fall behind and must be retaken.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::errors::{DesignError, DesignResult};
use crate::config::EngineConfig;
use crate::lock::{LockConfig, LockError, LockGrant, LockKind, LockManager, LockRequest, LockStore};
use crate::observability::{log_event, Event, MetricsRegistry};
use crate::project::ProjectSnapshot;
use crate::relationship::{
    DeletionImpact, Relationship, RelationshipDraft, RelationshipUpdate, RelationshipValidator,
};
use crate::schema::{
    check_table_name_available, validate_identifier, validate_transition, Field, FieldDraft,
    Table, TableDraft, TableStatus, TableValidator, ValidationIssue, ValidationReport,
};

/// Result of an edit that needed table access
#[derive(Debug, Clone)]
pub struct Edit<T> {
    pub value: T,
    /// Non-blocking findings from validation
    pub warnings: Vec<ValidationIssue>,
    /// Lock taken on the caller's behalf; the caller owns its token
    pub acquired: Option<LockGrant>,
}

impl<T> Edit<T> {
    fn new(value: T, acquired: Option<LockGrant>) -> Self {
        Self {
            value,
            warnings: Vec::new(),
            acquired,
        }
    }
}

pub struct SchemaDesigner<S: LockStore> {
    validator: TableValidator,
    locks: LockManager<S>,
    metrics: Arc<MetricsRegistry>,
}

impl<S: LockStore> SchemaDesigner<S> {
    pub fn new(config: &EngineConfig, store: S) -> Self {
        let metrics = Arc::new(MetricsRegistry::new());
        Self {
            validator: TableValidator::with_max_description_length(config.max_description_length),
            locks: LockManager::new(LockConfig::from(config), store).with_metrics(Arc::clone(&metrics)),
            metrics,
        }
    }

    pub fn locks(&self) -> &LockManager<S> {
        &self.locks
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Makes sure `holder` has at least a `required` lock on the table,
    /// acquiring one for the default duration when it does not.
    fn ensure_access(
        &self,
        table: &Table,
        holder: &str,
        required: LockKind,
        reason: &str,
    ) -> DesignResult<Option<LockGrant>> {
        let now = Utc::now();
        if let Some(held) = self.locks.held_by_at(table.id, holder, required, now)? {
            if held.kind == LockKind::Optimistic && !held.confirms_version(table.version) {
                log_event(
                    Event::LockConflict,
                    &[
                        ("table_id", &table.id.to_string()),
                        ("holder", holder),
                        ("reason", "stale_version"),
                    ],
                );
                return Err(LockError::StaleVersion {
                    table_id: table.id,
                    lock_version: held.version.unwrap_or_default(),
                    table_version: table.version,
                }
                .into());
            }
            return Ok(None);
        }

        let mut request =
            LockRequest::new(table.id, table.project_id, holder, required).with_reason(reason);
        if required == LockKind::Optimistic {
            request = request.at_version(table.version);
        }
        Ok(Some(self.locks.acquire_at(request, now)?))
    }

    /// Keeps the editor's own optimistic markers in step with the table
    fn committed(&self, table: &Table, holder: &str) -> DesignResult<()> {
        self.locks.restamp(table.id, holder, table.version)?;
        Ok(())
    }

    fn table<'a>(snapshot: &'a ProjectSnapshot, table_id: Uuid) -> DesignResult<&'a Table> {
        snapshot
            .table(table_id)
            .ok_or_else(|| DesignError::table_not_found(table_id))
    }

    fn table_mut(snapshot: &mut ProjectSnapshot, table_id: Uuid) -> DesignResult<&mut Table> {
        snapshot
            .table_mut(table_id)
            .ok_or_else(|| DesignError::table_not_found(table_id))
    }

    fn reject(&self, event: Event, table_id: &str, report: ValidationReport) -> DesignError {
        log_event(
            event,
            &[("table_id", table_id), ("errors", &report.error_summary())],
        );
        DesignError::Validation(report)
    }

    /// Validates a new table and adds it to the snapshot in draft status
    pub fn create_table(
        &self,
        snapshot: &mut ProjectSnapshot,
        draft: &TableDraft,
        creator: &str,
    ) -> DesignResult<Table> {
        let built = self
            .validator
            .build_table(draft, snapshot.project_id, &snapshot.tables, creator);
        self.metrics.record_table_validation(built.is_ok());

        match built {
            Ok(table) => {
                log_event(
                    Event::TableValidated,
                    &[
                        ("table", &table.name),
                        ("fields", &table.fields.len().to_string()),
                        ("created_by", creator),
                    ],
                );
                snapshot.tables.push(table.clone());
                Ok(table)
            }
            Err(report) => Err(self.reject(Event::TableRejected, &draft.name, report)),
        }
    }

    /// Adds a field; needs an optimistic or stronger lock
    pub fn add_field(
        &self,
        snapshot: &mut ProjectSnapshot,
        table_id: Uuid,
        draft: &FieldDraft,
        holder: &str,
    ) -> DesignResult<Edit<Field>> {
        let table = Self::table(snapshot, table_id)?;

        let mut report = ValidationReport::new();
        check_editable(table, &mut report);
        let position = table.fields.len() as u32;
        let field = match self.validator.build_field(draft, table.id, position) {
            Ok(field) => Some(field),
            Err(field_report) => {
                report.merge(field_report);
                None
            }
        };
        if table.field_by_name(&draft.name).is_some() {
            report.push_error(ValidationIssue::structural(
                "fields",
                format!("field names must be unique (duplicate '{}')", draft.name),
            ));
        }

        let field = match field {
            Some(field) if report.is_valid() => field,
            _ => return Err(self.reject(Event::TableRejected, &table_id.to_string(), report)),
        };

        let acquired = self.ensure_access(table, holder, LockKind::Optimistic, "add field")?;

        let table = Self::table_mut(snapshot, table_id)?;
        table.fields.push(field.clone());
        table.touch();
        self.committed(table, holder)?;
        log_event(
            Event::FieldAdded,
            &[
                ("table_id", &table_id.to_string()),
                ("field", &field.name),
                ("holder", holder),
            ],
        );
        Ok(Edit::new(field, acquired))
    }

    /// Removes a field; needs a pessimistic lock.
    ///
    /// A field used by any relationship cannot be removed.
    pub fn remove_field(
        &self,
        snapshot: &mut ProjectSnapshot,
        table_id: Uuid,
        field_id: Uuid,
        holder: &str,
    ) -> DesignResult<Edit<Field>> {
        let table = Self::table(snapshot, table_id)?;
        let field = table
            .field(field_id)
            .ok_or_else(|| DesignError::field_not_found(field_id))?;

        let mut report = ValidationReport::new();
        check_editable(table, &mut report);
        for relationship in snapshot
            .relationships
            .iter()
            .filter(|r| r.references_field(field_id))
        {
            report.push_error(ValidationIssue::conflict(
                format!("fields.{}", field.name),
                format!("field is used by relationship '{}'", relationship.name),
            ));
        }
        if table.status == TableStatus::Active && table.fields.len() == 1 {
            report.push_error(ValidationIssue::structural(
                "fields",
                "an active table must keep at least one field",
            ));
        }
        if !report.is_valid() {
            return Err(self.reject(Event::TableRejected, &table_id.to_string(), report));
        }

        let acquired = self.ensure_access(table, holder, LockKind::Pessimistic, "remove field")?;

        let table = Self::table_mut(snapshot, table_id)?;
        let index = table
            .fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or_else(|| DesignError::field_not_found(field_id))?;
        let removed = table.fields.remove(index);
        for (position, field) in table.fields.iter_mut().enumerate() {
            field.position = position as u32;
        }
        table.touch();
        self.committed(table, holder)?;
        log_event(
            Event::FieldRemoved,
            &[
                ("table_id", &table_id.to_string()),
                ("field", &removed.name),
                ("holder", holder),
            ],
        );
        Ok(Edit::new(removed, acquired))
    }

    /// Renames a table; needs a pessimistic lock
    pub fn rename_table(
        &self,
        snapshot: &mut ProjectSnapshot,
        table_id: Uuid,
        new_name: &str,
        holder: &str,
    ) -> DesignResult<Edit<String>> {
        let table = Self::table(snapshot, table_id)?;

        let mut report = ValidationReport::new();
        check_editable(table, &mut report);
        if table.name == new_name {
            report.push_error(ValidationIssue::structural(
                "name",
                format!("table is already named '{}'", new_name),
            ));
        }
        if let Some(issue) = validate_identifier("name", new_name) {
            report.push_error(issue);
        }
        if let Some(issue) = check_table_name_available(new_name, &snapshot.tables, Some(table_id)) {
            report.push_error(issue);
        }
        if !report.is_valid() {
            return Err(self.reject(Event::TableRejected, &table_id.to_string(), report));
        }

        let acquired = self.ensure_access(table, holder, LockKind::Pessimistic, "rename table")?;

        let table = Self::table_mut(snapshot, table_id)?;
        let old_name = std::mem::replace(&mut table.name, new_name.to_string());
        table.touch();
        self.committed(table, holder)?;
        log_event(
            Event::TableRenamed,
            &[
                ("table_id", &table_id.to_string()),
                ("from", &old_name),
                ("to", new_name),
                ("holder", holder),
            ],
        );
        Ok(Edit::new(old_name, acquired))
    }

    /// Moves a table through its lifecycle; needs a pessimistic lock
    pub fn transition_status(
        &self,
        snapshot: &mut ProjectSnapshot,
        table_id: Uuid,
        to: TableStatus,
        holder: &str,
    ) -> DesignResult<Edit<TableStatus>> {
        let table = Self::table(snapshot, table_id)?;

        let report = validate_transition(table, to, &snapshot.relationships);
        if !report.is_valid() {
            return Err(self.reject(Event::TableRejected, &table_id.to_string(), report));
        }

        let acquired = self.ensure_access(table, holder, LockKind::Pessimistic, "change status")?;

        let table = Self::table_mut(snapshot, table_id)?;
        let from = std::mem::replace(&mut table.status, to);
        table.touch();
        self.committed(table, holder)?;
        log_event(
            Event::TableStatusChanged,
            &[
                ("table_id", &table_id.to_string()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("holder", holder),
            ],
        );
        Ok(Edit::new(from, acquired))
    }

    /// Validates and records a relationship; needs edit access on the source table
    pub fn create_relationship(
        &self,
        snapshot: &mut ProjectSnapshot,
        draft: &RelationshipDraft,
        holder: &str,
    ) -> DesignResult<Edit<Relationship>> {
        let built = RelationshipValidator::new(snapshot).build(draft);
        self.metrics.record_relationship_validation(built.is_ok());

        let (relationship, report) = match built {
            Ok(built) => built,
            Err(report) => {
                let source = draft
                    .source_table_id
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                return Err(self.reject(Event::RelationshipRejected, &source, report));
            }
        };

        let source = Self::table(snapshot, relationship.source_table_id)?;
        let acquired = self.ensure_access(source, holder, LockKind::Optimistic, "create relationship")?;

        log_event(
            Event::RelationshipValidated,
            &[
                ("relationship", &relationship.name),
                ("source_table_id", &relationship.source_table_id.to_string()),
                ("target_table_id", &relationship.target_table_id.to_string()),
                ("warnings", &report.warnings.len().to_string()),
            ],
        );
        snapshot.relationships.push(relationship.clone());

        let mut edit = Edit::new(relationship, acquired);
        edit.warnings = report.warnings;
        Ok(edit)
    }

    /// Applies a partial update to a relationship; needs edit access on its source table
    pub fn update_relationship(
        &self,
        snapshot: &mut ProjectSnapshot,
        relationship_id: Uuid,
        update: &RelationshipUpdate,
        holder: &str,
    ) -> DesignResult<Edit<Relationship>> {
        let updated = RelationshipValidator::new(snapshot).apply_update(relationship_id, update);
        self.metrics.record_relationship_validation(updated.is_ok());

        let updated = updated.map_err(|report| {
            self.reject(Event::RelationshipRejected, &relationship_id.to_string(), report)
        })?;

        let source = Self::table(snapshot, updated.source_table_id)?;
        let acquired = self.ensure_access(source, holder, LockKind::Optimistic, "update relationship")?;

        if let Some(existing) = snapshot
            .relationships
            .iter_mut()
            .find(|r| r.id == relationship_id)
        {
            *existing = updated.clone();
        }
        Ok(Edit::new(updated, acquired))
    }

    /// Removes a relationship; needs edit access on its source table.
    ///
    /// The returned impact lists how many other relationships touch the
    /// same source table.
    pub fn delete_relationship(
        &self,
        snapshot: &mut ProjectSnapshot,
        relationship_id: Uuid,
        holder: &str,
    ) -> DesignResult<Edit<DeletionImpact>> {
        let impact = RelationshipValidator::new(snapshot).validate_delete(relationship_id);
        if !impact.report.is_valid() {
            return Err(DesignError::NotFound {
                entity: "relationship",
                id: relationship_id,
            });
        }

        let source_table_id = snapshot
            .relationship(relationship_id)
            .map(|r| r.source_table_id)
            .ok_or(DesignError::NotFound {
                entity: "relationship",
                id: relationship_id,
            })?;
        let source = Self::table(snapshot, source_table_id)?;
        let acquired = self.ensure_access(source, holder, LockKind::Optimistic, "delete relationship")?;

        snapshot.relationships.retain(|r| r.id != relationship_id);

        let mut edit = Edit::new(impact.clone(), acquired);
        edit.warnings = impact.report.warnings;
        Ok(edit)
    }
}

fn check_editable(table: &Table, report: &mut ValidationReport) {
    if table.status == TableStatus::Deprecated {
        report.push_error(ValidationIssue::structural(
            "status",
            "deprecated tables cannot be modified",
        ));
    }
}
