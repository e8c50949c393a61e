//! CLI command implementations
//!
//! Every command produces one JSON value, written as
//! `{"status":"ok","data":...}`. A rejected definition is still a
//! successful command: its report carries `"valid": false`.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{read_json, write_response};
use crate::config::EngineConfig;
use crate::observability::{log_event, Event};
use crate::project::ProjectSnapshot;
use crate::relationship::{RelationshipDraft, RelationshipValidator};
use crate::schema::{check_identifier, TableDefinitionLoader, TableDraft, TableValidator};

/// Input document for `validate-relationship`
#[derive(Debug, Deserialize)]
pub struct RelationshipCheck {
    pub draft: RelationshipDraft,
    pub snapshot: ProjectSnapshot,
}

/// Parse arguments, load configuration and run the command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    let config = load_config(cli.config.as_deref())?;
    run_command(cli.command, &config)
}

pub fn load_config(path: Option<&Path>) -> CliResult<EngineConfig> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            log_event(
                Event::ConfigLoaded,
                &[("path", &path.display().to_string())],
            );
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

pub fn run_command(cmd: Command, config: &EngineConfig) -> CliResult<()> {
    let data = execute(cmd, config)?;
    write_response(data)
}

/// Runs a command and returns its response payload
pub fn execute(cmd: Command, config: &EngineConfig) -> CliResult<Value> {
    match cmd {
        Command::CheckIdentifier { name } => Ok(check_identifier_command(&name)),
        Command::ValidateTable { input, snapshot } => {
            let draft: TableDraft = read_json(&input)?;
            let snapshot = match snapshot {
                Some(path) => Some(read_json::<ProjectSnapshot>(&path.display().to_string())?),
                None => None,
            };
            validate_table(&draft, snapshot.as_ref(), config)
        }
        Command::ValidateRelationship { input } => {
            let check: RelationshipCheck = read_json(&input)?;
            validate_relationship(&check)
        }
        Command::ValidateDir { dir } => validate_dir(&dir, config),
    }
}

fn check_identifier_command(name: &str) -> Value {
    match check_identifier(name) {
        Ok(()) => json!({ "name": name, "valid": true }),
        Err(message) => json!({ "name": name, "valid": false, "message": message }),
    }
}

pub fn validate_table(
    draft: &TableDraft,
    snapshot: Option<&ProjectSnapshot>,
    config: &EngineConfig,
) -> CliResult<Value> {
    let validator = TableValidator::with_max_description_length(config.max_description_length);
    let report = match snapshot {
        Some(snapshot) => validator.validate_table_in_project(draft, &snapshot.tables),
        None => validator.validate_table(draft),
    };

    let event = if report.is_valid() {
        Event::TableValidated
    } else {
        Event::TableRejected
    };
    log_event(event, &[("table", &draft.name)]);

    Ok(serde_json::to_value(report)?)
}

pub fn validate_relationship(check: &RelationshipCheck) -> CliResult<Value> {
    let report = RelationshipValidator::new(&check.snapshot).validate_create(&check.draft);

    let event = if report.is_valid() {
        Event::RelationshipValidated
    } else {
        Event::RelationshipRejected
    };
    let name = check.draft.name.clone().unwrap_or_default();
    log_event(event, &[("relationship", &name)]);

    Ok(serde_json::to_value(report)?)
}

/// Validates each definition in file-name order, treating the directory
/// as one project so later files see the tables accepted before them.
pub fn validate_dir(dir: &Path, config: &EngineConfig) -> CliResult<Value> {
    let definitions = TableDefinitionLoader::new(dir).load_all()?;
    let validator = TableValidator::with_max_description_length(config.max_description_length);

    let project_id = Uuid::new_v4();
    let mut accepted = Vec::new();
    let mut results = Vec::with_capacity(definitions.len());
    let mut all_valid = true;

    for definition in definitions {
        let report = validator.validate_table_in_project(&definition.draft, &accepted);
        if report.is_valid() {
            log_event(Event::TableValidated, &[("table", &definition.draft.name)]);
            if let Ok(table) = validator.build_table(&definition.draft, project_id, &accepted, "cli") {
                accepted.push(table);
            }
        } else {
            all_valid = false;
            log_event(Event::TableRejected, &[("table", &definition.draft.name)]);
        }

        results.push(json!({
            "path": definition.path.display().to_string(),
            "table": definition.draft.name,
            "report": report,
        }));
    }

    Ok(json!({ "valid": all_valid, "tables": results }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::errors::CliErrorCode;
    use crate::schema::FieldDraft;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: Value) -> String {
        let path = dir.join(name);
        fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
        path.display().to_string()
    }

    #[test]
    fn test_check_identifier_command() {
        let ok = execute(
            Command::CheckIdentifier { name: "users".into() },
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(ok["valid"], true);

        let bad = execute(
            Command::CheckIdentifier { name: "Users".into() },
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(bad["valid"], false);
        assert!(bad["message"].is_string());
    }

    #[test]
    fn test_validate_table_from_file() {
        let tmp = TempDir::new().unwrap();
        let input = write(
            tmp.path(),
            "users.json",
            json!({
                "name": "users",
                "fields": [
                    {"name": "id", "data_type": "text", "required": true},
                    {"name": "email", "data_type": "text", "required": true,
                     "config": {"max_length": 255}}
                ]
            }),
        );

        let data = execute(
            Command::ValidateTable { input, snapshot: None },
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(data["valid"], true);
        assert_eq!(data["errors"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_validate_table_respects_configured_description_limit() {
        let config = EngineConfig {
            max_description_length: 10,
            ..EngineConfig::default()
        };
        let draft = TableDraft::new("users", vec![FieldDraft::new("id", "text").required()])
            .with_description("far longer than ten characters");

        let data = validate_table(&draft, None, &config).unwrap();
        assert_eq!(data["valid"], false);
    }

    #[test]
    fn test_validate_dir_detects_cross_file_name_clash() {
        let tmp = TempDir::new().unwrap();
        let table = json!({"name": "users", "fields": [{"name": "id", "data_type": "text"}]});
        write(tmp.path(), "a.json", table.clone());
        write(tmp.path(), "b.json", table);

        let data = validate_dir(tmp.path(), &EngineConfig::default()).unwrap();
        assert_eq!(data["valid"], false);
        assert_eq!(data["tables"][0]["report"]["valid"], true);
        assert_eq!(data["tables"][1]["report"]["valid"], false);
        assert_eq!(data["tables"][1]["report"]["errors"][0]["kind"], "conflict");
    }

    #[test]
    fn test_malformed_input_is_invalid_input() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, "{ nope").unwrap();

        let err = execute(
            Command::ValidateRelationship { input: path.display().to_string() },
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), CliErrorCode::InvalidInput);
    }

    #[test]
    fn test_missing_config_file() {
        let tmp = TempDir::new().unwrap();
        let err = load_config(Some(&tmp.path().join("absent.json"))).unwrap_err();
        assert_eq!(err.code(), CliErrorCode::ConfigError);
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }
}
