//! Storage identifier rules
//!
//! Table and field structural names must match `^[a-z][a-z0-9_]{0,62}$`:
//! - non-empty, at most 63 characters
//! - first character is a lowercase ASCII letter
//! - remaining characters are lowercase ASCII letters, digits or `_`

use super::errors::ValidationIssue;

/// Maximum identifier length accepted by the storage layer
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Checks a structural name, returning a human-readable reason on failure.
pub fn check_identifier(name: &str) -> Result<(), String> {
    let mut chars = name.chars();

    let first = match chars.next() {
        Some(c) => c,
        None => return Err("identifier must not be empty".into()),
    };

    // Length is counted in characters, not bytes.
    if name.chars().count() > MAX_IDENTIFIER_LENGTH {
        return Err(format!(
            "identifier must be at most {} characters",
            MAX_IDENTIFIER_LENGTH
        ));
    }

    if !first.is_ascii_lowercase() {
        return Err("identifier must start with a lowercase letter".into());
    }

    if let Some(bad) = chars.find(|c| !is_identifier_char(*c)) {
        return Err(format!(
            "identifier may only contain lowercase letters, digits and underscores (found '{}')",
            bad
        ));
    }

    Ok(())
}

/// Returns true if `name` is a valid structural name
pub fn is_valid_identifier(name: &str) -> bool {
    check_identifier(name).is_ok()
}

/// Validates a structural name and scopes any failure to `scope`
pub fn validate_identifier(scope: &str, name: &str) -> Option<ValidationIssue> {
    check_identifier(name)
        .err()
        .map(|reason| ValidationIssue::structural(scope, reason))
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_valid_identifiers() {
        for name in ["a", "users", "user_id", "t1", "a_b_c_9", "x_"] {
            assert!(is_valid_identifier(name), "{} should be valid", name);
        }
    }

    #[test]
    fn test_empty_rejected() {
        let err = check_identifier("").unwrap_err();
        assert!(err.contains("empty"));
    }

    #[test]
    fn test_length_limit() {
        let max = "a".repeat(MAX_IDENTIFIER_LENGTH);
        assert!(is_valid_identifier(&max));

        let too_long = "a".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let err = check_identifier(&too_long).unwrap_err();
        assert!(err.contains("63"));
    }

    #[test]
    fn test_first_character_rule() {
        for name in ["_users", "1users", "Users", "-x"] {
            let err = check_identifier(name).unwrap_err();
            assert!(err.contains("start with a lowercase letter"), "{}", name);
        }
    }

    #[test]
    fn test_invalid_characters() {
        for name in ["userId", "user-id", "user id", "usér", "a.b"] {
            assert!(!is_valid_identifier(name), "{} should be invalid", name);
        }
    }

    #[test]
    fn test_validate_identifier_scopes_issue() {
        assert!(validate_identifier("name", "users").is_none());

        let issue = validate_identifier("fields.Email", "Email").unwrap();
        assert_eq!(issue.scope, "fields.Email");
    }

    #[test]
    fn test_matches_reference_pattern() {
        let pattern = Regex::new(r"^[a-z][a-z0-9_]{0,62}$").unwrap();
        let long_ok = "b".repeat(63);
        let long_bad = "b".repeat(64);
        let candidates = [
            "", "a", "z9", "a_", "_a", "9a", "aB", "ab-c", "ümlaut", "snake_case_1",
            long_ok.as_str(), long_bad.as_str(),
        ];
        for name in candidates {
            assert_eq!(
                is_valid_identifier(name),
                pattern.is_match(name),
                "mismatch for {:?}",
                name
            );
        }
    }
}
