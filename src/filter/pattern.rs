//! Pattern matching for permission filters
//!
//! Supports both exact string matching and glob pattern matching, with
//! auto-detection based on pattern characters.

use glob::Pattern;

use crate::errors::OptionParseError;
use crate::permissions::PermissionState;

/// Check if a filter string contains glob pattern characters
pub fn is_glob_pattern(filter: &str) -> bool {
    filter.contains('*') || filter.contains('?') || filter.contains('[')
}

/// Match a permission id against a filter using either exact or glob matching
pub fn matches_permission_filter(permission: &str, filter: &str) -> bool {
    if is_glob_pattern(filter) {
        match Pattern::new(filter) {
            Ok(pattern) => pattern.matches(permission),
            // Invalid patterns are rejected at parse time; fall back to exact
            Err(_) => permission == filter,
        }
    } else {
        permission == filter
    }
}

/// Whether any requested permission matches the filter
pub fn any_permission_matches(requested: &[PermissionState], filter: &str) -> bool {
    requested
        .iter()
        .any(|state| matches_permission_filter(state.id.as_str(), filter))
}

/// Validate that a filter is a syntactically correct glob pattern
pub fn validate_permission_filter(filter: &str) -> Result<(), OptionParseError> {
    if filter.is_empty() {
        return Err(OptionParseError::InvalidPattern {
            pattern: filter.to_string(),
            reason: "pattern is empty".to_string(),
        });
    }
    if is_glob_pattern(filter) {
        Pattern::new(filter).map_err(|e| OptionParseError::InvalidPattern {
            pattern: filter.to_string(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
