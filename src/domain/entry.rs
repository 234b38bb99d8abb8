//! Leaf node holding a single typed scalar.

use std::fmt;

use serde_json::Value;

use crate::domain::document;
use crate::domain::entry_type::{EntryType, EntryValue};
use crate::domain::error::{SettingsError, SettingsResult};
use crate::domain::identifier;

/// A detached entry. Once added to a group it lives in the group's arena
/// and is reached through [`crate::domain::NodeRef`] / [`crate::domain::NodeMut`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    id: String,
    description: Option<String>,
    value: EntryValue,
}

impl Entry {
    /// Create an entry; the type is fixed by the value's variant.
    pub fn new(id: impl Into<String>, value: impl Into<EntryValue>) -> SettingsResult<Self> {
        let id = id.into();
        identifier::validate(&id)?;
        Ok(Self {
            id,
            description: None,
            value: value.into(),
        })
    }

    /// Create an entry with a null value of the given scalar type.
    pub fn empty(id: impl Into<String>, entry_type: EntryType) -> SettingsResult<Self> {
        let id = id.into();
        identifier::validate(&id)?;
        Ok(Self {
            id,
            description: None,
            value: EntryValue::empty(entry_type)?,
        })
    }

    /// Parse a `{ "<id>": { "type": ..., "value": ... } }` node of scalar type `entry_type`.
    pub fn from_document(value: &Value, entry_type: EntryType) -> SettingsResult<Self> {
        document::entry_from_document(value, entry_type)
    }

    pub fn to_document(&self) -> Value {
        document::entry_to_document(self)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    /// Replace the value. The entry type never changes.
    pub fn set_value(&mut self, value: impl Into<EntryValue>) -> SettingsResult<()> {
        let value = value.into();
        check_same_type(&self.value, &value)?;
        self.value = value;
        Ok(())
    }

    pub fn entry_type(&self) -> EntryType {
        self.value.entry_type()
    }

    /// A detached entry is its own path.
    pub fn path(&self) -> &str {
        &self.id
    }

    /// Entries have no children to index into.
    pub fn get(&self, id: &str) -> SettingsResult<()> {
        Err(SettingsError::NotSupported(format!(
            "cannot look up '{}' in scalar entry '{}'",
            id, self.id
        )))
    }

    pub(crate) fn from_parts(id: String, description: Option<String>, value: EntryValue) -> Self {
        Self {
            id,
            description,
            value,
        }
    }

    pub(crate) fn into_parts(self) -> (String, Option<String>, EntryValue) {
        (self.id, self.description, self.value)
    }
}

pub(crate) fn check_same_type(current: &EntryValue, new: &EntryValue) -> SettingsResult<()> {
    if current.entry_type() != new.entry_type() {
        return Err(SettingsError::TypeMismatch {
            expected: current.entry_type(),
            actual: new.entry_type(),
        });
    }
    Ok(())
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.value, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_keeps_type() {
        let mut entry = Entry::new("Port", 8080).unwrap();
        entry.set_value(9090).unwrap();
        assert_eq!(entry.value().as_int(), Some(9090));

        let err = entry.set_value("9090").unwrap_err();
        assert!(matches!(
            err,
            SettingsError::TypeMismatch {
                expected: EntryType::Int,
                actual: EntryType::String
            }
        ));
    }

    #[test]
    fn test_get_is_not_supported() {
        let entry = Entry::new("Flag", true).unwrap();
        assert!(matches!(entry.get("x"), Err(SettingsError::NotSupported(_))));
    }

    #[test]
    fn test_set_value_accepts_null_of_same_type() {
        let mut entry = Entry::new("Name", "abc").unwrap();
        entry.set_value(None::<String>).unwrap();
        assert!(entry.value().is_null());
        assert_eq!(entry.to_string(), "");
    }
}
