//! CLI for schemagate
//!
//! Runs the validators over JSON definitions on disk or stdin:
//! - check-identifier: structural name check
//! - validate-table: one table definition
//! - validate-relationship: one relationship against a project snapshot
//! - validate-dir: a directory of table definitions as one project

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{
    execute, load_config, run, run_command, validate_dir, validate_relationship, validate_table,
    RelationshipCheck,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_input, read_json, write_error, write_response};
