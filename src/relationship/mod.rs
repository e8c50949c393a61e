//! Relationship subsystem for schemagate
//!
//! Decides whether a proposed, updated or deleted relationship between two
//! tables is valid for the project state supplied by the caller.
//!
//! # Design Principles
//!
//! - Pure: validation reads a `ProjectSnapshot` and returns a report
//! - One structural edge per ordered table pair
//! - No cycles in the table graph
//! - Warnings never block

mod compatibility;
mod graph;
mod types;
mod validator;

pub use compatibility::{check_compatibility, check_suitability, Compatibility, Endpoint};
pub use graph::RelationshipGraph;
pub use types::{
    CascadeAction, Relationship, RelationshipDraft, RelationshipKind, RelationshipStatus,
    RelationshipUpdate,
};
pub use validator::{
    DeletionImpact, RelationshipValidator, MSG_CYCLE, MSG_DUPLICATE, MSG_REQUIRED, MSG_REVERSE,
    MSG_SELF_REFERENCE,
};
