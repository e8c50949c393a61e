//! Engine configuration
//!
//! Loaded from an optional JSON file. Every key has a default, so an
//! empty object `{}` is a valid configuration.

use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::DEFAULT_MAX_DESCRIPTION_LENGTH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Lock duration used when a request does not name one
    #[serde(default = "default_lock_duration_secs")]
    pub default_lock_duration_secs: i64,

    /// Longest duration a single acquire or renew may ask for
    #[serde(default = "default_max_lock_duration_secs")]
    pub max_lock_duration_secs: i64,

    #[serde(default = "default_max_description_length")]
    pub max_description_length: usize,
}

/// Upper bound for either lock duration setting (one week)
pub const LOCK_DURATION_CEILING_SECS: i64 = 7 * 24 * 60 * 60;

fn default_lock_duration_secs() -> i64 {
    300
}

fn default_max_lock_duration_secs() -> i64 {
    3600
}

fn default_max_description_length() -> usize {
    DEFAULT_MAX_DESCRIPTION_LENGTH
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_lock_duration_secs: default_lock_duration_secs(),
            max_lock_duration_secs: default_max_lock_duration_secs(),
            max_description_length: default_max_description_length(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_lock_duration_secs <= 0 {
            return Err(ConfigError::Invalid(
                "default_lock_duration_secs must be > 0".into(),
            ));
        }

        if self.max_lock_duration_secs <= 0 {
            return Err(ConfigError::Invalid(
                "max_lock_duration_secs must be > 0".into(),
            ));
        }

        if self.max_lock_duration_secs > LOCK_DURATION_CEILING_SECS {
            return Err(ConfigError::Invalid(format!(
                "max_lock_duration_secs ({}) cannot exceed {}",
                self.max_lock_duration_secs, LOCK_DURATION_CEILING_SECS
            )));
        }

        if self.default_lock_duration_secs > self.max_lock_duration_secs {
            return Err(ConfigError::Invalid(format!(
                "default_lock_duration_secs ({}) cannot exceed max_lock_duration_secs ({})",
                self.default_lock_duration_secs, self.max_lock_duration_secs
            )));
        }

        if self.max_description_length == 0 {
            return Err(ConfigError::Invalid(
                "max_description_length must be > 0".into(),
            ));
        }

        Ok(())
    }

    pub fn default_lock_duration(&self) -> Duration {
        bounded_seconds(self.default_lock_duration_secs)
    }

    pub fn max_lock_duration(&self) -> Duration {
        bounded_seconds(self.max_lock_duration_secs)
    }
}

// Fields are public, so an unvalidated config is clamped into range here.
fn bounded_seconds(secs: i64) -> Duration {
    Duration::seconds(secs.clamp(0, LOCK_DURATION_CEILING_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_lock_duration(), Duration::minutes(5));
        assert_eq!(config.max_lock_duration(), Duration::hours(1));
    }

    #[test]
    fn test_default_cannot_exceed_max() {
        let err = EngineConfig::from_json(
            r#"{"default_lock_duration_secs": 600, "max_lock_duration_secs": 60}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_non_positive_values_rejected() {
        for json in [
            r#"{"default_lock_duration_secs": 0}"#,
            r#"{"max_lock_duration_secs": -5}"#,
            r#"{"max_description_length": 0}"#,
        ] {
            assert!(EngineConfig::from_json(json).is_err(), "{}", json);
        }
    }

    #[test]
    fn test_max_duration_ceiling() {
        let err = EngineConfig::from_json(&format!(
            r#"{{"max_lock_duration_secs": {}}}"#,
            i64::MAX
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let at_ceiling = EngineConfig::from_json(&format!(
            r#"{{"max_lock_duration_secs": {}}}"#,
            LOCK_DURATION_CEILING_SECS
        ))
        .unwrap();
        assert_eq!(at_ceiling.max_lock_duration(), Duration::weeks(1));
    }

    #[test]
    fn test_unvalidated_config_durations_are_clamped() {
        let config = EngineConfig {
            default_lock_duration_secs: i64::MIN,
            max_lock_duration_secs: i64::MAX,
            ..EngineConfig::default()
        };
        assert_eq!(config.default_lock_duration(), Duration::zero());
        assert_eq!(config.max_lock_duration(), Duration::weeks(1));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = EngineConfig::from_json(r#"{"lock_timeout": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("schemagate.json");
        fs::write(&path, r#"{"max_description_length": 120}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_description_length, 120);

        let missing = EngineConfig::load(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
