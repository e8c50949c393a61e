//! Relationship records
//!
//! A relationship links a source field (primary-key-like) on one table to a
//! target field (foreign-key-like) on another. For cycle purposes only the
//! ordered table pair matters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cardinality of a relationship
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    #[default]
    OneToMany,
    ManyToOne,
    ManyToMany,
}

/// Behavior applied to dependent rows on delete/update of the source row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CascadeAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl CascadeAction {
    pub const ALL: [CascadeAction; 5] = [
        CascadeAction::Cascade,
        CascadeAction::SetNull,
        CascadeAction::SetDefault,
        CascadeAction::Restrict,
        CascadeAction::NoAction,
    ];

    /// SQL spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeAction::Cascade => "CASCADE",
            CascadeAction::SetNull => "SET NULL",
            CascadeAction::SetDefault => "SET DEFAULT",
            CascadeAction::Restrict => "RESTRICT",
            CascadeAction::NoAction => "NO ACTION",
        }
    }

    /// Parses either the SQL spelling or the snake/screaming-case form
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().replace('_', " ").to_ascii_uppercase();
        Self::ALL.into_iter().find(|a| a.as_str() == normalized)
    }
}

impl std::fmt::Display for CascadeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipStatus {
    Active,
    Inactive,
    Deprecated,
}

impl RelationshipStatus {
    pub const ALL: [RelationshipStatus; 3] = [
        RelationshipStatus::Active,
        RelationshipStatus::Inactive,
        RelationshipStatus::Deprecated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipStatus::Active => "active",
            RelationshipStatus::Inactive => "inactive",
            RelationshipStatus::Deprecated => "deprecated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|st| st.as_str() == normalized)
    }
}

/// A persisted relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub source_table_id: Uuid,
    pub source_field_id: Uuid,
    pub target_table_id: Uuid,
    pub target_field_id: Uuid,
    #[serde(default)]
    pub kind: RelationshipKind,
    pub on_delete: CascadeAction,
    pub on_update: CascadeAction,
    pub status: RelationshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Relationship {
    /// The structural edge this relationship contributes to the graph
    pub fn edge(&self) -> (Uuid, Uuid) {
        (self.source_table_id, self.target_table_id)
    }

    /// True if either endpoint is on `table_id`
    pub fn touches_table(&self, table_id: Uuid) -> bool {
        self.source_table_id == table_id || self.target_table_id == table_id
    }

    /// True if either endpoint is `field_id`
    pub fn references_field(&self, field_id: Uuid) -> bool {
        self.source_field_id == field_id || self.target_field_id == field_id
    }
}

/// A proposed relationship as submitted by a client.
///
/// Identifiers are optional so that missing ones can be reported as a
/// validation error instead of a decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDraft {
    #[serde(default)]
    pub project_id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub source_table_id: Option<Uuid>,
    #[serde(default)]
    pub source_field_id: Option<Uuid>,
    #[serde(default)]
    pub target_table_id: Option<Uuid>,
    #[serde(default)]
    pub target_field_id: Option<Uuid>,
    #[serde(default)]
    pub kind: RelationshipKind,
    #[serde(default = "default_on_delete")]
    pub on_delete: CascadeAction,
    #[serde(default = "default_on_update")]
    pub on_update: CascadeAction,
}

impl Default for RelationshipDraft {
    fn default() -> Self {
        Self {
            project_id: None,
            name: None,
            source_table_id: None,
            source_field_id: None,
            target_table_id: None,
            target_field_id: None,
            kind: RelationshipKind::default(),
            on_delete: default_on_delete(),
            on_update: default_on_update(),
        }
    }
}

fn default_on_delete() -> CascadeAction {
    CascadeAction::Restrict
}

fn default_on_update() -> CascadeAction {
    CascadeAction::Cascade
}

impl RelationshipDraft {
    /// A complete draft between two fields
    pub fn between(
        project_id: Uuid,
        name: impl Into<String>,
        (source_table_id, source_field_id): (Uuid, Uuid),
        (target_table_id, target_field_id): (Uuid, Uuid),
    ) -> Self {
        Self {
            project_id: Some(project_id),
            name: Some(name.into()),
            source_table_id: Some(source_table_id),
            source_field_id: Some(source_field_id),
            target_table_id: Some(target_table_id),
            target_field_id: Some(target_field_id),
            kind: RelationshipKind::default(),
            on_delete: default_on_delete(),
            on_update: default_on_update(),
        }
    }
}

/// Partial update of an existing relationship.
///
/// Enumerated values arrive as strings and are checked against the
/// fixed sets by the update validator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub on_delete: Option<String>,
    #[serde(default)]
    pub on_update: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
