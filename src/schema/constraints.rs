//! Field constraint validation
//!
//! Three steps, each reporting every broken rule rather than the first:
//!
//! 1. `parse_config`: raw JSON object + type name -> `FieldConfig`
//!    (unsupported type, unknown keys, wrongly typed values)
//! 2. `validate_config`: internal consistency of a typed configuration
//! 3. `validate_default`: a default value against its configuration
//!
//! A date default must be one of the storage-evaluated function tokens.
//! Literal dates are rejected.

use regex::Regex;
use serde_json::{Map, Value};

use super::errors::ValidationIssue;
use super::types::{DataType, DateConfig, FieldConfig, NumberConfig, TextConfig};

/// Recognised date storage formats
pub const DATE_FORMATS: &[&str] = &["date", "time", "datetime", "timestamp", "timestamptz"];

/// Date default tokens, compared case-insensitively
pub const DATE_DEFAULT_TOKENS: &[&str] = &[
    "current_timestamp",
    "now",
    "now()",
    "current_date",
    "current_time",
];

const BOOLEAN_TRUE: &[&str] = &["true", "t", "yes", "1"];
const BOOLEAN_FALSE: &[&str] = &["false", "f", "no", "0"];

const TEXT_KEYS: &[&str] = &["min_length", "max_length", "pattern"];
const NUMBER_KEYS: &[&str] = &["precision", "scale", "min_value", "max_value"];
const DATE_KEYS: &[&str] = &["format", "default_now"];

/// Converts an untyped configuration object into a `FieldConfig`.
///
/// An unsupported `data_type` yields a single "unsupported field type"
/// issue; otherwise one issue is reported per unknown key or wrongly
/// typed value. `null` values are treated as absent.
pub fn parse_config(
    scope: &str,
    data_type: &str,
    raw: &Map<String, Value>,
) -> Result<FieldConfig, Vec<ValidationIssue>> {
    let data_type = DataType::parse(data_type).ok_or_else(|| {
        vec![ValidationIssue::structural(
            scope,
            format!("unsupported field type '{}'", data_type),
        )]
    })?;

    let mut issues = Vec::new();
    let config = match data_type {
        DataType::Text => {
            reject_unknown_keys(scope, data_type, raw, TEXT_KEYS, &mut issues);
            FieldConfig::Text(TextConfig {
                min_length: read_i64(scope, raw, "min_length", &mut issues),
                max_length: read_i64(scope, raw, "max_length", &mut issues),
                pattern: read_string(scope, raw, "pattern", &mut issues),
            })
        }
        DataType::Number => {
            reject_unknown_keys(scope, data_type, raw, NUMBER_KEYS, &mut issues);
            FieldConfig::Number(NumberConfig {
                precision: read_u32(scope, raw, "precision", &mut issues),
                scale: read_u32(scope, raw, "scale", &mut issues),
                min_value: read_f64(scope, raw, "min_value", &mut issues),
                max_value: read_f64(scope, raw, "max_value", &mut issues),
            })
        }
        DataType::Boolean => {
            for key in raw.keys() {
                issues.push(ValidationIssue::structural(
                    scope,
                    format!("boolean fields take no configuration (found '{}')", key),
                ));
            }
            FieldConfig::Boolean
        }
        DataType::Date => {
            reject_unknown_keys(scope, data_type, raw, DATE_KEYS, &mut issues);
            FieldConfig::Date(DateConfig {
                format: read_string(scope, raw, "format", &mut issues),
                default_now: read_bool(scope, raw, "default_now", &mut issues).unwrap_or(false),
            })
        }
    };

    if issues.is_empty() {
        Ok(config)
    } else {
        Err(issues)
    }
}

/// Checks that a typed configuration is internally consistent.
pub fn validate_config(scope: &str, config: &FieldConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    match config {
        FieldConfig::Text(text) => {
            if matches!(text.max_length, Some(max) if max < 0) {
                issues.push(ValidationIssue::structural(scope, "max_length must be >= 0"));
            }
            if matches!(text.min_length, Some(min) if min < 0) {
                issues.push(ValidationIssue::structural(scope, "min_length must be >= 0"));
            }
            if let (Some(min), Some(max)) = (text.min_length, text.max_length) {
                if min > max {
                    issues.push(ValidationIssue::structural(
                        scope,
                        "min_length cannot be greater than max_length",
                    ));
                }
            }
            if let Some(pattern) = &text.pattern {
                if let Err(e) = Regex::new(pattern) {
                    issues.push(ValidationIssue::structural(
                        scope,
                        format!("pattern is not a valid regular expression: {}", e),
                    ));
                }
            }
        }
        FieldConfig::Number(number) => {
            match (number.precision, number.scale) {
                (None, Some(_)) => issues.push(ValidationIssue::structural(
                    scope,
                    "scale requires precision to be set",
                )),
                (Some(precision), Some(scale)) if scale > precision => {
                    issues.push(ValidationIssue::structural(
                        scope,
                        format!("scale ({}) cannot exceed precision ({})", scale, precision),
                    ))
                }
                _ => {}
            }
            if number.precision == Some(0) {
                issues.push(ValidationIssue::structural(scope, "precision must be at least 1"));
            }
            if let (Some(min), Some(max)) = (number.min_value, number.max_value) {
                if min > max {
                    issues.push(ValidationIssue::structural(
                        scope,
                        "min_value cannot be greater than max_value",
                    ));
                }
            }
        }
        FieldConfig::Date(date) => {
            if let Some(format) = &date.format {
                if !DATE_FORMATS.contains(&format.as_str()) {
                    issues.push(ValidationIssue::structural(
                        scope,
                        format!(
                            "unrecognized date format '{}' (expected one of: {})",
                            format,
                            DATE_FORMATS.join(", ")
                        ),
                    ));
                }
            }
        }
        FieldConfig::Boolean => {}
    }

    issues
}

/// Checks a default value against a configuration.
///
/// Assumes `config` itself passed `validate_config`; an invalid pattern
/// is not reported a second time here.
pub fn validate_default(scope: &str, config: &FieldConfig, value: &str) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    match config {
        FieldConfig::Text(text) => {
            let len = value.chars().count() as i64;
            if let Some(min) = text.min_length {
                if len < min {
                    issues.push(ValidationIssue::structural(
                        scope,
                        format!("default value is shorter than min_length ({})", min),
                    ));
                }
            }
            if let Some(max) = text.max_length {
                if len > max {
                    issues.push(ValidationIssue::structural(
                        scope,
                        format!("default value exceeds max_length ({})", max),
                    ));
                }
            }
            if let Some(pattern) = &text.pattern {
                if let Ok(re) = Regex::new(pattern) {
                    if !re.is_match(value) {
                        issues.push(ValidationIssue::structural(
                            scope,
                            "default value does not match pattern",
                        ));
                    }
                }
            }
        }
        FieldConfig::Number(number) => match value.trim().parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => {
                if let Some(min) = number.min_value {
                    if parsed < min {
                        issues.push(ValidationIssue::structural(
                            scope,
                            format!("default value is below min_value ({})", min),
                        ));
                    }
                }
                if let Some(max) = number.max_value {
                    if parsed > max {
                        issues.push(ValidationIssue::structural(
                            scope,
                            format!("default value is above max_value ({})", max),
                        ));
                    }
                }
            }
            _ => issues.push(ValidationIssue::structural(
                scope,
                "default value is not a valid number",
            )),
        },
        FieldConfig::Date(_) => {
            if !contains_ignore_case(DATE_DEFAULT_TOKENS, value) {
                issues.push(ValidationIssue::structural(
                    scope,
                    format!(
                        "date defaults must be one of: {}",
                        DATE_DEFAULT_TOKENS.join(", ")
                    ),
                ));
            }
        }
        FieldConfig::Boolean => {
            if parse_boolean(value).is_none() {
                issues.push(ValidationIssue::structural(
                    scope,
                    "boolean default must be one of: true, false, t, f, yes, no, 1, 0",
                ));
            }
        }
    }

    issues
}

/// Interprets a boolean default token
pub fn parse_boolean(value: &str) -> Option<bool> {
    if contains_ignore_case(BOOLEAN_TRUE, value) {
        Some(true)
    } else if contains_ignore_case(BOOLEAN_FALSE, value) {
        Some(false)
    } else {
        None
    }
}

fn contains_ignore_case(set: &[&str], value: &str) -> bool {
    let value = value.trim();
    set.iter().any(|token| token.eq_ignore_ascii_case(value))
}

fn reject_unknown_keys(
    scope: &str,
    data_type: DataType,
    raw: &Map<String, Value>,
    allowed: &[&str],
    issues: &mut Vec<ValidationIssue>,
) {
    for key in raw.keys() {
        if !allowed.contains(&key.as_str()) {
            issues.push(ValidationIssue::structural(
                scope,
                format!("unknown configuration key '{}' for {} field", key, data_type),
            ));
        }
    }
}

fn present<'a>(raw: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    raw.get(key).filter(|v| !v.is_null())
}

fn read_i64(
    scope: &str,
    raw: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<i64> {
    let value = present(raw, key)?;
    let parsed = value.as_i64();
    if parsed.is_none() {
        issues.push(ValidationIssue::structural(
            scope,
            format!("{} must be an integer", key),
        ));
    }
    parsed
}

fn read_u32(
    scope: &str,
    raw: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<u32> {
    let value = present(raw, key)?;
    let parsed = value.as_u64().and_then(|v| u32::try_from(v).ok());
    if parsed.is_none() {
        issues.push(ValidationIssue::structural(
            scope,
            format!("{} must be a non-negative integer", key),
        ));
    }
    parsed
}

fn read_f64(
    scope: &str,
    raw: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<f64> {
    let value = present(raw, key)?;
    let parsed = value.as_f64();
    if parsed.is_none() {
        issues.push(ValidationIssue::structural(
            scope,
            format!("{} must be a number", key),
        ));
    }
    parsed
}

fn read_string(
    scope: &str,
    raw: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let value = present(raw, key)?;
    let parsed = value.as_str().map(str::to_string);
    if parsed.is_none() {
        issues.push(ValidationIssue::structural(
            scope,
            format!("{} must be a string", key),
        ));
    }
    parsed
}

fn read_bool(
    scope: &str,
    raw: &Map<String, Value>,
    key: &str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<bool> {
    let value = present(raw, key)?;
    let parsed = value.as_bool();
    if parsed.is_none() {
        issues.push(ValidationIssue::structural(
            scope,
            format!("{} must be a boolean", key),
        ));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn text(min: Option<i64>, max: Option<i64>, pattern: Option<&str>) -> FieldConfig {
        FieldConfig::Text(TextConfig {
            min_length: min,
            max_length: max,
            pattern: pattern.map(str::to_string),
        })
    }

    fn number(precision: Option<u32>, scale: Option<u32>, min: Option<f64>, max: Option<f64>) -> FieldConfig {
        FieldConfig::Number(NumberConfig {
            precision,
            scale,
            min_value: min,
            max_value: max,
        })
    }

    // =========================================================================
    // parse_config
    // =========================================================================

    #[test]
    fn test_parse_unsupported_type() {
        let issues = parse_config("fields.payload", "json", &Map::new()).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("unsupported field type"));
        assert_eq!(issues[0].scope, "fields.payload");
    }

    #[test]
    fn test_parse_text_config() {
        let config = parse_config(
            "f",
            "text",
            &raw(json!({"max_length": 255, "pattern": "^[a-z]+$", "min_length": null})),
        )
        .unwrap();
        assert_eq!(config, text(None, Some(255), Some("^[a-z]+$")));
    }

    #[test]
    fn test_parse_reports_every_bad_key() {
        let issues = parse_config(
            "f",
            "text",
            &raw(json!({"max_length": "long", "precision": 3, "pattern": 7})),
        )
        .unwrap_err();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().any(|i| i.message.contains("unknown configuration key 'precision'")));
        assert!(issues.iter().any(|i| i.message == "max_length must be an integer"));
        assert!(issues.iter().any(|i| i.message == "pattern must be a string"));
    }

    #[test]
    fn test_parse_number_rejects_negative_precision() {
        let issues = parse_config("f", "number", &raw(json!({"precision": -1}))).unwrap_err();
        assert!(issues[0].message.contains("non-negative integer"));
    }

    #[test]
    fn test_parse_date_default_now_must_be_bool() {
        let issues = parse_config("f", "date", &raw(json!({"default_now": "yes"}))).unwrap_err();
        assert_eq!(issues[0].message, "default_now must be a boolean");

        let config = parse_config("f", "date", &raw(json!({"default_now": true, "format": "date"}))).unwrap();
        assert_eq!(
            config,
            FieldConfig::Date(DateConfig {
                format: Some("date".into()),
                default_now: true
            })
        );
    }

    #[test]
    fn test_parse_boolean_takes_no_config() {
        assert_eq!(parse_config("f", "boolean", &Map::new()).unwrap(), FieldConfig::Boolean);
        let issues = parse_config("f", "boolean", &raw(json!({"max_length": 1}))).unwrap_err();
        assert!(issues[0].message.contains("no configuration"));
    }

    // =========================================================================
    // validate_config
    // =========================================================================

    #[test]
    fn test_text_negative_max_length() {
        let issues = validate_config("f", &text(None, Some(-1), None));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "max_length must be >= 0");
    }

    #[test]
    fn test_text_min_greater_than_max() {
        for (min, max) in [(5, 4), (1, 0), (256, 255)] {
            let issues = validate_config("f", &text(Some(min), Some(max), None));
            assert!(
                issues.iter().any(|i| i.message.contains("min_length cannot be greater")),
                "min={} max={}",
                min,
                max
            );
        }
        assert!(validate_config("f", &text(Some(3), Some(3), None)).is_empty());
    }

    #[test]
    fn test_text_invalid_pattern() {
        let issues = validate_config("f", &text(None, None, Some("([a-z")));
        assert!(issues[0].message.starts_with("pattern is not a valid regular expression"));
    }

    #[test]
    fn test_number_scale_without_precision() {
        for scale in [0, 2, 10] {
            let issues = validate_config("f", &number(None, Some(scale), None, None));
            assert!(issues.iter().any(|i| i.message == "scale requires precision to be set"));
        }
    }

    #[test]
    fn test_number_scale_exceeds_precision() {
        let issues = validate_config("f", &number(Some(5), Some(10), None, None));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].message, "scale (10) cannot exceed precision (5)");

        assert!(validate_config("f", &number(Some(10), Some(2), None, None)).is_empty());
    }

    #[test]
    fn test_number_bounds_and_zero_precision() {
        let issues = validate_config("f", &number(Some(0), None, Some(10.0), Some(1.0)));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_date_format_token() {
        let bad = FieldConfig::Date(DateConfig {
            format: Some("YYYY-MM-DD".into()),
            default_now: false,
        });
        assert!(validate_config("f", &bad)[0].message.contains("unrecognized date format"));

        for format in DATE_FORMATS {
            let ok = FieldConfig::Date(DateConfig {
                format: Some(format.to_string()),
                default_now: true,
            });
            assert!(validate_config("f", &ok).is_empty());
        }
    }

    // =========================================================================
    // validate_default
    // =========================================================================

    #[test]
    fn test_text_default_bounds_and_pattern() {
        let config = text(Some(2), Some(4), Some("^[a-z]+$"));
        assert!(validate_default("f", &config, "abc").is_empty());
        assert_eq!(validate_default("f", &config, "a").len(), 1);
        assert_eq!(validate_default("f", &config, "abcde").len(), 1);
        // too long and wrong charset
        assert_eq!(validate_default("f", &config, "ABCDE").len(), 2);
    }

    #[test]
    fn test_unanchored_pattern_matches_anywhere() {
        let config = text(None, None, Some("[0-9]"));
        assert!(validate_default("f", &config, "ab1c").is_empty());
        assert_eq!(validate_default("f", &config, "abcd").len(), 1);
    }

    #[test]
    fn test_number_default() {
        let config = number(None, None, Some(0.0), Some(100.0));
        assert!(validate_default("f", &config, "42.5").is_empty());
        assert!(validate_default("f", &config, " 7 ").is_empty());
        assert!(validate_default("f", &config, "-1")[0].message.contains("below min_value"));
        assert!(validate_default("f", &config, "101")[0].message.contains("above max_value"));
        assert!(validate_default("f", &config, "abc")[0].message.contains("not a valid number"));
        assert!(validate_default("f", &config, "NaN")[0].message.contains("not a valid number"));
    }

    #[test]
    fn test_date_default_tokens_only() {
        let config = FieldConfig::Date(DateConfig::default());
        for token in ["CURRENT_TIMESTAMP", "now", "NOW()", "current_date"] {
            assert!(validate_default("f", &config, token).is_empty(), "{}", token);
        }
        assert_eq!(validate_default("f", &config, "2024-01-01").len(), 1);
    }

    #[test]
    fn test_boolean_default_tokens() {
        for token in ["true", "FALSE", "1", "0", "Yes", "f"] {
            assert!(validate_default("f", &FieldConfig::Boolean, token).is_empty(), "{}", token);
        }
        assert_eq!(validate_default("f", &FieldConfig::Boolean, "maybe").len(), 1);
        assert_eq!(parse_boolean("T"), Some(true));
        assert_eq!(parse_boolean("0"), Some(false));
        assert_eq!(parse_boolean("2"), None);
    }
}
