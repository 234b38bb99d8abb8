//! Composite node owning an ordered set of uniquely named children.

use generational_arena::Index;
use serde_json::Value;
use termtree::Tree;
use tracing::instrument;

use crate::domain::arena::{NodeArena, NodeKind};
use crate::domain::document;
use crate::domain::entry::Entry;
use crate::domain::entry_type::{EntryType, EntryValue};
use crate::domain::error::{SettingsError, SettingsResult};
use crate::domain::identifier;
use crate::domain::node::{Node, NodeMut, NodeRef};

/// An owned group and everything below it.
///
/// The whole subtree lives in one arena; `top` is this group's own slot.
/// Children are reached through [`NodeRef`] (read) and [`NodeMut`] (write)
/// handles that borrow the group.
#[derive(Debug, Clone)]
pub struct Group {
    arena: NodeArena,
    top: Index,
}

impl Group {
    /// Build a group from detached children. Child ids must be unique.
    #[instrument(level = "debug", skip(id, children), fields(children = children.len()))]
    pub fn new(id: impl Into<String>, children: Vec<Node>, is_root: bool) -> SettingsResult<Self> {
        let id = id.into();
        identifier::validate(&id)?;
        let mut arena = NodeArena::new();
        let top = arena.insert_node(
            id,
            None,
            NodeKind::Group {
                children: Vec::new(),
                is_root,
            },
            None,
        );
        let mut group = Self { arena, top };
        for child in children {
            group.add(child)?;
        }
        Ok(group)
    }

    /// Group without children.
    pub fn empty(id: impl Into<String>) -> SettingsResult<Self> {
        Self::new(id, Vec::new(), false)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.set_description(Some(description.into()));
        self
    }

    /// Parse a `{ "<id>": { "type": "Group", "contents": [...] } }` node.
    pub fn from_document(value: &Value, is_root: bool) -> SettingsResult<Self> {
        document::group_from_document(value, is_root)
    }

    pub fn to_document(&self) -> Value {
        self.as_node().to_document()
    }

    pub(crate) fn from_parts(arena: NodeArena, top: Index) -> Self {
        Self { arena, top }
    }

    pub(crate) fn into_parts(self) -> (NodeArena, Index) {
        (self.arena, self.top)
    }

    pub(crate) fn set_root(&mut self, root: bool) {
        if let Some(node) = self.arena.get_node_mut(self.top) {
            if let NodeKind::Group { is_root, .. } = &mut node.kind {
                *is_root = root;
            }
        }
    }

    pub fn as_node(&self) -> NodeRef<'_> {
        NodeRef::new(&self.arena, self.top)
            .unwrap_or_else(|| unreachable!("group top is never removed"))
    }

    pub fn as_node_mut(&mut self) -> NodeMut<'_> {
        NodeMut::new(&mut self.arena, self.top)
            .unwrap_or_else(|| unreachable!("group top is never removed"))
    }

    pub fn id(&self) -> &str {
        self.as_node().id()
    }

    pub fn description(&self) -> Option<&str> {
        self.as_node().description()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.as_node_mut().set_description(description);
    }

    pub fn entry_type(&self) -> EntryType {
        EntryType::Group
    }

    pub fn is_root(&self) -> bool {
        self.as_node().is_root()
    }

    /// An owned group has no parent, so its path is its id.
    pub fn path(&self) -> String {
        self.as_node().path()
    }

    /// Itself when flagged as a root, otherwise None.
    pub fn root(&self) -> Option<NodeRef<'_>> {
        self.as_node().root()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.as_node().children()
    }

    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.as_node().descendants()
    }

    pub fn len(&self) -> usize {
        self.as_node().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_children(&self) -> bool {
        !self.is_empty()
    }

    pub fn get(&self, id: &str) -> SettingsResult<NodeRef<'_>> {
        self.as_node().get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        NodeMut::new(&mut self.arena, self.top)
            .unwrap_or_else(|| unreachable!("group top is never removed"))
            .into_child(id)
    }

    pub fn entry_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        let child = self.get_mut(id)?;
        if child.view().is_group() {
            return Err(SettingsError::WrongKind {
                id: id.to_string(),
                expected: "entry",
                actual: "group",
            });
        }
        Ok(child)
    }

    pub fn group_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        let child = self.get_mut(id)?;
        if !child.view().is_group() {
            return Err(SettingsError::WrongKind {
                id: id.to_string(),
                expected: "group",
                actual: "entry",
            });
        }
        Ok(child)
    }

    /// Every node of the group, itself first, depth-first.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'_>> + '_ {
        self.descendants()
    }

    pub fn index_of(&self, id: &str) -> SettingsResult<usize> {
        self.as_node().index_of(id)
    }

    pub fn add(&mut self, node: impl Into<Node>) -> SettingsResult<String> {
        self.as_node_mut().add(node)
    }

    pub fn add_entry(
        &mut self,
        id: &str,
        value: impl Into<EntryValue>,
        description: Option<&str>,
    ) -> SettingsResult<String> {
        self.as_node_mut().add_entry(id, value, description)
    }

    pub fn add_group(&mut self, id: &str, children: Vec<Node>) -> SettingsResult<String> {
        self.as_node_mut().add_group(id, children)
    }

    pub fn remove_entry(&mut self, id: &str) -> SettingsResult<Entry> {
        self.as_node_mut().remove_entry(id)
    }

    pub fn remove_group(&mut self, id: &str, recursive: bool) -> SettingsResult<Group> {
        self.as_node_mut().remove_group(id, recursive)
    }

    pub fn to_tree(&self) -> Tree<String> {
        self.as_node().to_tree()
    }
}

/// Structural equality: same root flag and same document.
impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.is_root() == other.is_root() && self.to_document() == other.to_document()
    }
}
