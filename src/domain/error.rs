//! Domain-level errors (no external dependencies besides the JSON value type)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::entry_type::EntryType;

/// Errors raised while building, parsing or navigating a settings tree.
///
/// All of them are raised at the point of detection; a constructor that
/// fails never hands out a partially built node.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("invalid identifier '{id}': illegal characters '{illegal}'")]
    InvalidIdentifier { id: String, illegal: String },

    #[error("unsupported entry type: {0}")]
    UnsupportedType(String),

    #[error("key '{key}' could not be found in node '{node}'")]
    MissingKey { key: String, node: String },

    #[error("entry type mismatch: expected '{expected}', got '{actual}'")]
    TypeMismatch {
        expected: EntryType,
        actual: EntryType,
    },

    #[error("value of key '{key}' has wrong kind: expected {expected}, got {actual}")]
    ValueTypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("group is not empty: {0}")]
    NotEmpty(String),

    #[error("'{id}' is a {actual}, not a {expected}")]
    WrongKind {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("path runs through scalar entry: {0}")]
    PathThroughEntry(String),

    #[error("malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    #[error("operation not supported: {0}")]
    NotSupported(String),
}

impl SettingsError {
    pub(crate) fn missing_key(key: &str, node: &str) -> Self {
        Self::MissingKey {
            key: key.to_string(),
            node: node.to_string(),
        }
    }

    pub(crate) fn value_kind(key: &str, expected: &str, actual: &serde_json::Value) -> Self {
        Self::ValueTypeMismatch {
            key: key.to_string(),
            expected: expected.to_string(),
            actual: json_kind(actual).to_string(),
        }
    }

    /// True for id/path lookups and missing files alike.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::FileNotFound(_))
    }
}

/// Name of the JSON kind of a value, as used in error messages.
pub(crate) fn json_kind(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() => "integer",
        Value::Number(n) if n.is_u64() => "integer out of i64 range",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result type for tree operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_kind_distinguishes_integers_from_floats() {
        assert_eq!(json_kind(&json!(3)), "integer");
        assert_eq!(json_kind(&json!(3.5)), "number");
        assert_eq!(json_kind(&json!(u64::MAX)), "integer out of i64 range");
        assert_eq!(json_kind(&json!(null)), "null");
        assert_eq!(json_kind(&json!([1])), "array");
    }

    #[test]
    fn test_is_not_found_covers_files() {
        assert!(SettingsError::FileNotFound(PathBuf::from("x.sbd")).is_not_found());
        assert!(SettingsError::NotFound("Root1".into()).is_not_found());
        assert!(!SettingsError::NotEmpty("Root1".into()).is_not_found());
    }
}
