//! Node type discriminant and the closed set of scalar values.

use std::fmt;

use serde_json::Value;

use crate::domain::error::{SettingsError, SettingsResult};

/// Type of a node in a settings tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryType {
    String,
    Int,
    Bool,
    Group,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::String,
        EntryType::Int,
        EntryType::Bool,
        EntryType::Group,
    ];

    /// Canonical tag written to documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::String => "String",
            EntryType::Int => "Int",
            EntryType::Bool => "Bool",
            EntryType::Group => "Group",
        }
    }

    /// Tag used by older documents.
    pub fn legacy_tag(&self) -> &'static str {
        match self {
            EntryType::String => "Settings.StringEntry",
            EntryType::Int => "Settings.IntEntry",
            EntryType::Bool => "Settings.BoolEntry",
            EntryType::Group => "Settings.EntryGroup",
        }
    }

    /// Resolve a document tag, canonical or legacy.
    pub fn from_tag(tag: &str) -> Option<EntryType> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == tag || t.legacy_tag() == tag)
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(self, EntryType::Group)
    }

    /// JSON kind expected for the payload of this type.
    pub(crate) fn payload_kind(&self) -> &'static str {
        match self {
            EntryType::String => "string",
            EntryType::Int => "integer",
            EntryType::Bool => "boolean",
            EntryType::Group => "array",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar value of an entry. `None` is a present-but-empty value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValue {
    String(Option<String>),
    Int(Option<i64>),
    Bool(Option<bool>),
}

impl EntryValue {
    /// Null value of the given scalar type.
    pub fn empty(entry_type: EntryType) -> SettingsResult<Self> {
        match entry_type {
            EntryType::String => Ok(EntryValue::String(None)),
            EntryType::Int => Ok(EntryValue::Int(None)),
            EntryType::Bool => Ok(EntryValue::Bool(None)),
            EntryType::Group => Err(SettingsError::UnsupportedType(format!(
                "{} is not a scalar type; accepted are String, Int and Bool",
                entry_type
            ))),
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            EntryValue::String(_) => EntryType::String,
            EntryValue::Int(_) => EntryType::Int,
            EntryValue::Bool(_) => EntryType::Bool,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            EntryValue::String(v) => v.is_none(),
            EntryValue::Int(v) => v.is_none(),
            EntryValue::Bool(v) => v.is_none(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EntryValue::String(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            EntryValue::Int(v) => *v,
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            EntryValue::Bool(v) => *v,
            _ => None,
        }
    }

    /// Read a document payload as a value of `entry_type`; null is accepted.
    pub(crate) fn from_json(entry_type: EntryType, value: &Value, key: &str) -> SettingsResult<Self> {
        let mismatch = || {
            SettingsError::value_kind(
                key,
                &format!("{} or null", entry_type.payload_kind()),
                value,
            )
        };
        let mut parsed = Self::empty(entry_type)?;
        if value.is_null() {
            return Ok(parsed);
        }
        match &mut parsed {
            EntryValue::String(v) => *v = Some(value.as_str().ok_or_else(mismatch)?.to_string()),
            EntryValue::Int(v) => *v = Some(value.as_i64().ok_or_else(mismatch)?),
            EntryValue::Bool(v) => *v = Some(value.as_bool().ok_or_else(mismatch)?),
        }
        Ok(parsed)
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            EntryValue::String(v) => v.clone().map_or(Value::Null, Value::String),
            EntryValue::Int(v) => v.map_or(Value::Null, Value::from),
            EntryValue::Bool(v) => v.map_or(Value::Null, Value::Bool),
        }
    }

    /// Parse command-line text into a value of `entry_type`.
    pub fn parse(entry_type: EntryType, text: &str) -> SettingsResult<Self> {
        let mismatch = || SettingsError::ValueTypeMismatch {
            key: "value".to_string(),
            expected: entry_type.payload_kind().to_string(),
            actual: format!("'{}'", text),
        };
        match entry_type {
            EntryType::String => Ok(EntryValue::String(Some(text.to_string()))),
            EntryType::Int => text
                .trim()
                .parse::<i64>()
                .map(|i| EntryValue::Int(Some(i)))
                .map_err(|_| mismatch()),
            EntryType::Bool => match text.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(EntryValue::Bool(Some(true))),
                "false" => Ok(EntryValue::Bool(Some(false))),
                _ => Err(mismatch()),
            },
            EntryType::Group => Self::empty(entry_type),
        }
    }
}

/// Renders the scalar; null renders as the empty string.
impl fmt::Display for EntryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryValue::String(Some(s)) => f.write_str(s),
            EntryValue::Int(Some(i)) => write!(f, "{}", i),
            EntryValue::Bool(Some(b)) => write!(f, "{}", b),
            _ => Ok(()),
        }
    }
}

impl From<&str> for EntryValue {
    fn from(value: &str) -> Self {
        EntryValue::String(Some(value.to_string()))
    }
}

impl From<String> for EntryValue {
    fn from(value: String) -> Self {
        EntryValue::String(Some(value))
    }
}

impl From<Option<String>> for EntryValue {
    fn from(value: Option<String>) -> Self {
        EntryValue::String(value)
    }
}

impl From<i64> for EntryValue {
    fn from(value: i64) -> Self {
        EntryValue::Int(Some(value))
    }
}

impl From<i32> for EntryValue {
    fn from(value: i32) -> Self {
        EntryValue::Int(Some(i64::from(value)))
    }
}

impl From<Option<i64>> for EntryValue {
    fn from(value: Option<i64>) -> Self {
        EntryValue::Int(value)
    }
}

impl From<bool> for EntryValue {
    fn from(value: bool) -> Self {
        EntryValue::Bool(Some(value))
    }
}

impl From<Option<bool>> for EntryValue {
    fn from(value: Option<bool>) -> Self {
        EntryValue::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("String", EntryType::String)]
    #[case("Settings.IntEntry", EntryType::Int)]
    #[case("Bool", EntryType::Bool)]
    #[case("Settings.EntryGroup", EntryType::Group)]
    fn test_from_tag_accepts_canonical_and_legacy(#[case] tag: &str, #[case] expected: EntryType) {
        assert_eq!(EntryType::from_tag(tag), Some(expected));
    }

    #[test]
    fn test_from_tag_rejects_unknown() {
        assert_eq!(EntryType::from_tag("Float"), None);
        assert_eq!(EntryType::from_tag("string"), None);
    }

    #[test]
    fn test_empty_group_value_is_unsupported() {
        assert!(matches!(
            EntryValue::empty(EntryType::Group),
            Err(SettingsError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_from_json_accepts_null_for_every_scalar() {
        for t in [EntryType::String, EntryType::Int, EntryType::Bool] {
            let v = EntryValue::from_json(t, &json!(null), "value").unwrap();
            assert!(v.is_null());
            assert_eq!(v.entry_type(), t);
        }
    }

    #[test]
    fn test_from_json_rejects_float_for_int() {
        let err = EntryValue::from_json(EntryType::Int, &json!(1.5), "value").unwrap_err();
        match err {
            SettingsError::ValueTypeMismatch { expected, actual, .. } => {
                assert_eq!(expected, "integer or null");
                assert_eq!(actual, "number");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_from_json_reports_int_beyond_i64() {
        let err = EntryValue::from_json(EntryType::Int, &json!(u64::MAX), "value").unwrap_err();
        assert_eq!(
            err.to_string(),
            "value of key 'value' has wrong kind: expected integer or null, got integer out of i64 range"
        );
    }

    #[test]
    fn test_display_renders_null_as_empty() {
        assert_eq!(EntryValue::Int(None).to_string(), "");
        assert_eq!(EntryValue::from(123).to_string(), "123");
        assert_eq!(EntryValue::from(false).to_string(), "false");
        assert_eq!(EntryValue::from("abc").to_string(), "abc");
    }

    #[rstest]
    #[case(EntryType::Int, "42", EntryValue::Int(Some(42)))]
    #[case(EntryType::Bool, "TRUE", EntryValue::Bool(Some(true)))]
    #[case(EntryType::String, "4 2", EntryValue::String(Some("4 2".into())))]
    fn test_parse(#[case] t: EntryType, #[case] text: &str, #[case] expected: EntryValue) {
        assert_eq!(EntryValue::parse(t, text).unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_bad_int() {
        assert!(matches!(
            EntryValue::parse(EntryType::Int, "forty"),
            Err(SettingsError::ValueTypeMismatch { .. })
        ));
    }
}
