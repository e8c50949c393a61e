//! schemagate - schema-integrity validation and collaborative table
//! locking for visual data modelling
//!
//! Subsystems:
//! - `schema`: identifiers, field constraints, tables, lifecycle
//! - `relationship`: relationship validation and the table graph
//! - `lock`: optimistic and pessimistic table locks
//! - `designer`: edit operations combining validation and locking
//! - `observability`: JSON logs and counters
//! - `config`: engine configuration
//! - `cli`: the `schemagate` binary

pub mod cli;
pub mod config;
pub mod designer;
pub mod lock;
pub mod observability;
pub mod project;
pub mod relationship;
pub mod schema;
