//! Table and field definitions
//!
//! Supported data types:
//! - text: UTF-8 string, optional length bounds and pattern
//! - number: decimal, optional precision/scale and value bounds
//! - boolean: no configuration
//! - date: format token and "default to now" flag
//!
//! Configuration is a tagged union keyed by data type; each variant
//! carries only its legal keys. Raw JSON configuration from clients is
//! converted by `constraints::parse_config`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Field data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Date,
}

impl DataType {
    /// Returns the type name for messages
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
        }
    }

    /// Parses a client-supplied type name. Returns None for unsupported types.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(DataType::Text),
            "number" => Some(DataType::Number),
            "boolean" => Some(DataType::Boolean),
            "date" => Some(DataType::Date),
            _ => None,
        }
    }

    /// Whether fields of this type may be used as relationship endpoints
    pub fn is_relationship_eligible(&self) -> bool {
        matches!(self, DataType::Text | DataType::Number)
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    /// Regular expression a text default must match somewhere in the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Number configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberConfig {
    /// Total significant digits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    /// Digits after the decimal point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
}

/// Date configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateConfig {
    /// Storage format token (date, time, datetime, timestamp, timestamptz)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Storage layer fills the current time when no value is given
    #[serde(default)]
    pub default_now: bool,
}

/// Type-specific field configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "lowercase")]
pub enum FieldConfig {
    Text(TextConfig),
    Number(NumberConfig),
    Boolean,
    Date(DateConfig),
}

impl FieldConfig {
    /// Returns the data type this configuration belongs to
    pub fn data_type(&self) -> DataType {
        match self {
            FieldConfig::Text(_) => DataType::Text,
            FieldConfig::Number(_) => DataType::Number,
            FieldConfig::Boolean => DataType::Boolean,
            FieldConfig::Date(_) => DataType::Date,
        }
    }

    /// Unconstrained configuration for a data type
    pub fn empty(data_type: DataType) -> Self {
        match data_type {
            DataType::Text => FieldConfig::Text(TextConfig::default()),
            DataType::Number => FieldConfig::Number(NumberConfig::default()),
            DataType::Boolean => FieldConfig::Boolean,
            DataType::Date => FieldConfig::Date(DateConfig::default()),
        }
    }
}

/// A field definition as submitted by a client.
///
/// `data_type` and `config` are untyped here; the table validator
/// converts them into a `FieldConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDraft {
    /// Structural name
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    pub data_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default)]
    pub config: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl FieldDraft {
    /// Create an optional field draft with no configuration
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            data_type: data_type.into(),
            required: false,
            default_value: None,
            config: Map::new(),
            position: None,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Set the raw configuration. Non-object values are ignored.
    pub fn with_config(mut self, config: Value) -> Self {
        if let Value::Object(map) = config {
            self.config = map;
        }
        self
    }
}

/// A validated, persisted field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: Uuid,
    pub table_id: Uuid,
    /// Structural name
    pub name: String,
    pub display_name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub config: FieldConfig,
    pub position: u32,
}

impl Field {
    /// Create an optional field with unconstrained configuration
    pub fn new(table_id: Uuid, name: impl Into<String>, data_type: DataType) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            table_id,
            display_name: name.clone(),
            name,
            required: false,
            default_value: None,
            config: FieldConfig::empty(data_type),
            position: 0,
        }
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn data_type(&self) -> DataType {
        self.config.data_type()
    }
}

/// Table lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Draft,
    Active,
    Deprecated,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Draft => "draft",
            TableStatus::Active => "active",
            TableStatus::Deprecated => "deprecated",
        }
    }
}

impl std::fmt::Display for TableStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A table definition as submitted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDraft {
    /// Structural name
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDraft>,
}

impl TableDraft {
    pub fn new(name: impl Into<String>, fields: Vec<FieldDraft>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: None,
            fields,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A persisted table.
///
/// Never physically removed; retired through `TableStatus::Deprecated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Structural name, unique within the project
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TableStatus,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Free-form snapshot kept alongside the structured definition
    #[serde(default)]
    pub schema_snapshot: Value,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every structural change; optimistic locks record it
    #[serde(default)]
    pub version: u64,
}

impl Table {
    /// Create an empty draft table
    pub fn new(project_id: Uuid, name: impl Into<String>, created_by: impl Into<String>) -> Self {
        let name = name.into();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            display_name: name.clone(),
            name,
            description: None,
            status: TableStatus::Draft,
            fields: Vec::new(),
            schema_snapshot: Value::Null,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Append a field, taking ownership and fixing up its table and position
    pub fn with_field(mut self, mut field: Field) -> Self {
        field.table_id = self.id;
        field.position = self.fields.len() as u32;
        self.fields.push(field);
        self
    }

    pub fn field(&self, id: Uuid) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Records a structural change
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
