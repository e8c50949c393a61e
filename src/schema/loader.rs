//! Loads table drafts from JSON files on disk
//!
//! - One `TableDraft` per `*.json` file
//! - Non-JSON files are skipped
//! - Files are returned in file-name order so reports are deterministic

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::TableDraft;

/// Errors raised while reading table definition files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed table definition '{path}': {reason}")]
    Malformed { path: String, reason: String },
}

impl LoadError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        LoadError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// A table draft together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedDefinition {
    pub path: PathBuf,
    pub draft: TableDraft,
}

/// Reads table definition files from a directory.
pub struct TableDefinitionLoader {
    dir: PathBuf,
}

impl TableDefinitionLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads every `*.json` file in the directory.
    ///
    /// Stops at the first unreadable or malformed file.
    pub fn load_all(&self) -> Result<Vec<LoadedDefinition>, LoadError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| LoadError::io(&self.dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| LoadError::io(&self.dir, e))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let draft = load_file(&path)?;
                Ok(LoadedDefinition { path, draft })
            })
            .collect()
    }
}

/// Loads a single table definition file.
pub fn load_file(path: &Path) -> Result<TableDraft, LoadError> {
    let content = fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| LoadError::Malformed {
        path: path.display().to_string(),
        reason: format!("Invalid JSON: {}", e),
    })
}
