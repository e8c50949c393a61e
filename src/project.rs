//! Caller-supplied view of a project's persisted state
//!
//! schemagate never fetches state itself. The hosting service reads the
//! project's tables and relationships from its store and hands them in
//! with each request.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::relationship::{Relationship, RelationshipGraph};
use crate::schema::{Field, Table};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project_id: Uuid,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl ProjectSnapshot {
    pub fn new(project_id: Uuid) -> Self {
        Self {
            project_id,
            tables: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn table(&self, id: Uuid) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn table_mut(&mut self, id: Uuid) -> Option<&mut Table> {
        self.tables.iter_mut().find(|t| t.id == id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Looks a field up on a specific table
    pub fn field(&self, table_id: Uuid, field_id: Uuid) -> Option<&Field> {
        self.table(table_id)?.field(field_id)
    }

    pub fn relationship(&self, id: Uuid) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.id == id)
    }

    /// Relationships with an endpoint on `table_id`
    pub fn relationships_touching(&self, table_id: Uuid) -> impl Iterator<Item = &Relationship> {
        self.relationships
            .iter()
            .filter(move |r| r.touches_table(table_id))
    }

    /// Graph of every relationship in the snapshot
    pub fn graph(&self) -> RelationshipGraph {
        RelationshipGraph::from_relationships(&self.relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DataType;

    #[test]
    fn test_lookups() {
        let project = Uuid::new_v4();
        let users = Table::new(project, "users", "alice")
            .with_field(Field::new(Uuid::nil(), "id", DataType::Text).required());
        let field_id = users.fields[0].id;
        let users_id = users.id;

        let snapshot = ProjectSnapshot::new(project).with_table(users);

        assert!(snapshot.table(users_id).is_some());
        assert!(snapshot.table_by_name("users").is_some());
        assert!(snapshot.table_by_name("posts").is_none());
        assert!(snapshot.field(users_id, field_id).is_some());
        assert!(snapshot.field(Uuid::new_v4(), field_id).is_none());
        assert_eq!(snapshot.graph().edge_count(), 0);
    }
}
