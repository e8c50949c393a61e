//! CLI argument definitions using clap
//!
//! Commands:
//! - schemagate check-identifier <name>
//! - schemagate validate-table --input <file|-> [--snapshot <file>]
//! - schemagate validate-relationship --input <file|->
//! - schemagate validate-dir --dir <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// schemagate - schema-integrity checks for visual data modelling
#[derive(Parser, Debug)]
#[command(name = "schemagate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to an engine configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a structural name for tables and fields
    CheckIdentifier {
        name: String,
    },

    /// Validate one table definition
    ValidateTable {
        /// Table definition JSON file, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,

        /// Project snapshot used for name uniqueness
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// Validate a proposed relationship against a project snapshot
    ValidateRelationship {
        /// JSON object `{"draft": ..., "snapshot": ...}`, or `-` for stdin
        #[arg(long, default_value = "-")]
        input: String,
    },

    /// Validate every table definition in a directory as one project
    ValidateDir {
        #[arg(long)]
        dir: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
