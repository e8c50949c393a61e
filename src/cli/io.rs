//! JSON I/O for the CLI
//!
//! - Input: one JSON document from a file or stdin (`-`)
//! - Output: one JSON object per invocation on stdout

use std::fs;
use std::io::{self, Read, Write};

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Reads the raw input named by `source`
pub fn read_input(source: &str) -> CliResult<String> {
    let content = if source == "-" {
        let mut buffer = String::new();
        io::stdin().lock().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(source)
            .map_err(|e| CliError::io_error(format!("Failed to read '{}': {}", source, e)))?
    };

    if content.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }
    Ok(content)
}

/// Reads and decodes the input named by `source`
pub fn read_json<T: DeserializeOwned>(source: &str) -> CliResult<T> {
    let content = read_input(source)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&serde_json::json!({
        "status": "ok",
        "data": data
    }))
}

pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    }))
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
