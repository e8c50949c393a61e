//! Schema subsystem for schemagate
//!
//! Decides whether table and field definitions are structurally valid
//! before they are persisted.
//!
//! # Design Principles
//!
//! - Pure functions of their input; safe to call concurrently
//! - Every problem reported at once, never just the first
//! - Configuration typed per data type after parsing
//! - Tables change status, they are never removed

mod constraints;
mod errors;
mod identifier;
mod lifecycle;
mod loader;
mod types;
mod validator;

pub use constraints::{
    parse_boolean, parse_config, validate_config, validate_default, DATE_DEFAULT_TOKENS,
    DATE_FORMATS,
};
pub use errors::{IssueKind, ValidationIssue, ValidationReport};
pub use identifier::{check_identifier, is_valid_identifier, validate_identifier, MAX_IDENTIFIER_LENGTH};
pub use lifecycle::validate_transition;
pub use loader::{load_file, LoadError, LoadedDefinition, TableDefinitionLoader};
pub use types::{
    DataType, DateConfig, Field, FieldConfig, FieldDraft, NumberConfig, Table, TableDraft,
    TableStatus, TextConfig,
};
pub use validator::{
    check_table_name_available, TableValidator, DEFAULT_MAX_DESCRIPTION_LENGTH,
    MAX_DISPLAY_NAME_LENGTH,
};
