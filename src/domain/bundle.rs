//! Top-level container of root groups.

use serde_json::{Map, Value};
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::document::{DATA_KEY, DESC_KEY, METADATA_KEY};
use crate::domain::error::{SettingsError, SettingsResult};
use crate::domain::group::Group;
use crate::domain::node::{Node, NodeMut, NodeRef};

/// A described, ordered set of uniquely named root groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bundle {
    description: Option<String>,
    roots: Vec<Group>,
}

impl Bundle {
    pub fn new(description: Option<String>) -> Self {
        Self {
            description,
            roots: Vec::new(),
        }
    }

    /// Parse document text: `{ "metadata": {"desc": ...}, "data": [ <group>, ... ] }`.
    pub fn from_document_text(text: &str) -> SettingsResult<Self> {
        let doc: Value = serde_json::from_str(text)?;
        Self::from_document(&doc)
    }

    #[instrument(level = "debug", skip(doc))]
    pub fn from_document(doc: &Value) -> SettingsResult<Self> {
        let metadata = doc
            .get(METADATA_KEY)
            .ok_or_else(|| SettingsError::missing_key(METADATA_KEY, "<document>"))?;
        let data = doc
            .get(DATA_KEY)
            .ok_or_else(|| SettingsError::missing_key(DATA_KEY, "<document>"))?;

        let description = match metadata {
            Value::Object(meta) => match meta.get(DESC_KEY) {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => {
                    return Err(SettingsError::value_kind(DESC_KEY, "string or null", other))
                }
            },
            other => return Err(SettingsError::value_kind(METADATA_KEY, "object", other)),
        };
        let items = match data {
            Value::Array(items) => items,
            other => return Err(SettingsError::value_kind(DATA_KEY, "array", other)),
        };

        let mut bundle = Self::new(description);
        for item in items {
            bundle.add_root(Group::from_document(item, true)?)?;
        }
        debug!("parsed bundle with {} roots", bundle.roots.len());
        Ok(bundle)
    }

    pub fn to_document(&self) -> Value {
        let mut metadata = Map::new();
        metadata.insert(
            DESC_KEY.to_string(),
            self.description
                .as_deref()
                .map_or(Value::Null, Value::from),
        );
        let mut doc = Map::new();
        doc.insert(METADATA_KEY.to_string(), Value::Object(metadata));
        doc.insert(
            DATA_KEY.to_string(),
            Value::Array(self.roots.iter().map(Group::to_document).collect()),
        );
        Value::Object(doc)
    }

    pub fn to_document_string(&self, pretty: bool) -> SettingsResult<String> {
        let doc = self.to_document();
        let text = if pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };
        Ok(text)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub fn roots(&self) -> &[Group] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.roots.iter().any(|r| r.id() == id)
    }

    pub fn get(&self, id: &str) -> SettingsResult<&Group> {
        self.roots
            .iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| SettingsError::NotFound(id.to_string()))
    }

    /// Mutable view of a root. Its id and root flag stay owned by the bundle.
    pub fn get_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        self.roots
            .iter_mut()
            .find(|r| r.id() == id)
            .map(Group::as_node_mut)
            .ok_or_else(|| SettingsError::NotFound(id.to_string()))
    }

    /// Take ownership of `group` as a new root; returns its path.
    #[instrument(level = "debug", skip(self, group), fields(root = %group.id()))]
    pub fn add_root(&mut self, mut group: Group) -> SettingsResult<String> {
        if self.contains(group.id()) {
            return Err(SettingsError::AlreadyExists(group.id().to_string()));
        }
        group.set_root(true);
        let path = group.path();
        self.roots.push(group);
        debug!("added root {}", path);
        Ok(path)
    }

    /// Build and add a root in one step.
    pub fn add_root_with(
        &mut self,
        id: &str,
        children: Vec<Node>,
        description: Option<&str>,
    ) -> SettingsResult<String> {
        let mut group = Group::new(id, children, true)?;
        group.set_description(description.map(str::to_string));
        self.add_root(group)
    }

    /// Remove a root and hand it back; non-empty roots need `recursive`.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_root(&mut self, id: &str, recursive: bool) -> SettingsResult<Group> {
        let pos = self
            .roots
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| SettingsError::NotFound(id.to_string()))?;
        if self.roots[pos].has_children() && !recursive {
            return Err(SettingsError::NotEmpty(id.to_string()));
        }
        let mut group = self.roots.remove(pos);
        group.set_root(false);
        debug!("removed root {}", id);
        Ok(group)
    }

    /// Resolve a dotted path.
    ///
    /// A segment that does not exist yields `Ok(None)`. Stepping through a
    /// scalar entry before the last segment is an error.
    pub fn get_by_path(&self, path: &str) -> SettingsResult<Option<NodeRef<'_>>> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let Some(root) = self.roots.iter().find(|r| r.id() == first) else {
            return Ok(None);
        };
        let mut current = root.as_node();
        for segment in segments {
            if !current.is_group() {
                return Err(SettingsError::PathThroughEntry(current.path()));
            }
            match current.get(segment) {
                Ok(child) => current = child,
                Err(_) => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Mutable counterpart of [`Bundle::get_by_path`].
    pub fn get_by_path_mut(&mut self, path: &str) -> SettingsResult<Option<NodeMut<'_>>> {
        if self.get_by_path(path)?.is_none() {
            return Ok(None);
        }
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self.get_mut(first)?;
        for segment in segments {
            current = current.into_child(segment)?;
        }
        Ok(Some(current))
    }

    pub fn to_tree(&self) -> Tree<String> {
        let label = self.description.clone().unwrap_or_else(|| "bundle".to_string());
        Tree::new(label).with_leaves(self.roots.iter().map(Group::to_tree))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entry_type::EntryType;
    use serde_json::json;

    fn sample() -> Bundle {
        let mut bundle = Bundle::new(Some("sample".to_string()));
        bundle.add_root_with("Root1", Vec::new(), None).unwrap();
        let mut root = bundle.get_mut("Root1").unwrap();
        root.add_entry("R1-Int", 5, None).unwrap();
        root.add_group("Group1", Vec::new()).unwrap();
        root.get_mut("Group1")
            .unwrap()
            .add_entry("G1-String", "abc", None)
            .unwrap();
        bundle
    }

    #[test]
    fn test_get_by_path_resolves_nested_entry() {
        let bundle = sample();
        let node = bundle.get_by_path("Root1.Group1.G1-String").unwrap().unwrap();
        let manual = bundle
            .get("Root1")
            .unwrap()
            .get("Group1")
            .unwrap()
            .get("G1-String")
            .unwrap();
        assert_eq!(node, manual);
        assert_eq!(node.path(), "Root1.Group1.G1-String");
        assert_eq!(node.root().unwrap().id(), "Root1");
    }

    #[test]
    fn test_get_by_path_through_entry_fails() {
        let bundle = sample();
        assert!(matches!(
            bundle.get_by_path("Root1.R1-Int.AnythingElse"),
            Err(SettingsError::PathThroughEntry(ref p)) if p == "Root1.R1-Int"
        ));
    }

    #[test]
    fn test_get_by_path_miss_is_none() {
        let bundle = sample();
        assert!(bundle.get_by_path("Root1.NoSuchChild").unwrap().is_none());
        assert!(bundle.get_by_path("NoRoot").unwrap().is_none());
        assert!(bundle.get_by_path("").unwrap().is_none());
    }

    #[test]
    fn test_get_by_path_mut_updates_value() {
        let mut bundle = sample();
        bundle
            .get_by_path_mut("Root1.Group1.G1-String")
            .unwrap()
            .unwrap()
            .set_value("xyz")
            .unwrap();
        let node = bundle.get_by_path("Root1.Group1.G1-String").unwrap().unwrap();
        assert_eq!(node.to_string(), "xyz");
        assert_eq!(node.entry_type(), EntryType::String);
    }

    #[test]
    fn test_remove_root_clears_flag() {
        let mut bundle = sample();
        let root = bundle.remove_root("Root1", true).unwrap();
        assert!(!root.is_root());
        assert!(!bundle.contains("Root1"));
    }

    #[test]
    fn test_metadata_must_be_object() {
        let doc = json!({"metadata": "x", "data": []});
        assert!(matches!(
            Bundle::from_document(&doc),
            Err(SettingsError::ValueTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_document_round_trip() {
        let bundle = sample();
        let text = bundle.to_document_string(false).unwrap();
        let parsed = Bundle::from_document_text(&text).unwrap();
        assert_eq!(parsed, bundle);
        assert!(parsed.get("Root1").unwrap().is_root());
    }
}
