//! Owned nodes and borrowed views into a group's arena.

use std::fmt;

use generational_arena::Index;
use serde_json::Value;
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeKind, TreeNode};
use crate::domain::document;
use crate::domain::entry::{check_same_type, Entry};
use crate::domain::entry_type::{EntryType, EntryValue};
use crate::domain::error::{SettingsError, SettingsResult};
use crate::domain::group::Group;

/// A detached node: what `add` consumes and `remove_*` hands back.
#[derive(Debug, Clone)]
pub enum Node {
    Entry(Entry),
    Group(Group),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Entry(e) => e.id(),
            Node::Group(g) => g.id(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Node::Entry(e) => e.description(),
            Node::Group(g) => g.description(),
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            Node::Entry(e) => e.entry_type(),
            Node::Group(_) => EntryType::Group,
        }
    }

    pub fn to_document(&self) -> Value {
        match self {
            Node::Entry(e) => document::entry_to_document(e),
            Node::Group(g) => g.to_document(),
        }
    }
}

impl From<Entry> for Node {
    fn from(entry: Entry) -> Self {
        Node::Entry(entry)
    }
}

impl From<Group> for Node {
    fn from(group: Group) -> Self {
        Node::Group(group)
    }
}

fn kind_name(node: &TreeNode) -> &'static str {
    match node.kind {
        NodeKind::Entry(_) => "entry",
        NodeKind::Group { .. } => "group",
    }
}

/// Read-only handle to a node stored in a group's arena.
///
/// Two handles are equal when they point at the same stored node.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a NodeArena,
    idx: Index,
    node: &'a TreeNode,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(arena: &'a NodeArena, idx: Index) -> Option<Self> {
        let node = arena.get_node(idx)?;
        Some(Self { arena, idx, node })
    }

    pub fn id(&self) -> &'a str {
        &self.node.id
    }

    pub fn description(&self) -> Option<&'a str> {
        self.node.description.as_deref()
    }

    pub fn entry_type(&self) -> EntryType {
        self.node.entry_type()
    }

    pub fn is_group(&self) -> bool {
        matches!(self.node.kind, NodeKind::Group { .. })
    }

    /// Scalar value, None for groups.
    pub fn value(&self) -> Option<&'a EntryValue> {
        match &self.node.kind {
            NodeKind::Entry(value) => Some(value),
            NodeKind::Group { .. } => None,
        }
    }

    /// True only for groups owned directly by a bundle.
    pub fn is_root(&self) -> bool {
        matches!(self.node.kind, NodeKind::Group { is_root: true, .. })
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node.parent.and_then(|p| NodeRef::new(self.arena, p))
    }

    /// Dot-joined ids from the top-most group down to this node.
    pub fn path(&self) -> String {
        self.arena.path(self.idx)
    }

    /// Nearest root group above (or at) this node, None when detached.
    pub fn root(&self) -> Option<NodeRef<'a>> {
        self.arena
            .root_of(self.idx)
            .and_then(|r| NodeRef::new(self.arena, r))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let (arena, node) = (self.arena, self.node);
        node.children()
            .iter()
            .filter_map(move |&c| NodeRef::new(arena, c))
    }

    pub fn len(&self) -> usize {
        self.node.children().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_children(&self) -> bool {
        !self.is_empty()
    }

    /// Direct child by id. Entries cannot be indexed.
    pub fn get(&self, id: &str) -> SettingsResult<NodeRef<'a>> {
        if !self.is_group() {
            return Err(SettingsError::NotSupported(format!(
                "cannot look up '{}' in scalar entry '{}'",
                id,
                self.path()
            )));
        }
        self.arena
            .find_child(self.idx, id)
            .and_then(|c| NodeRef::new(self.arena, c))
            .ok_or_else(|| SettingsError::NotFound(format!("{}.{}", self.path(), id)))
    }

    /// Position of a direct child.
    pub fn index_of(&self, id: &str) -> SettingsResult<usize> {
        self.node
            .children()
            .iter()
            .position(|&c| self.arena.get_node(c).is_some_and(|n| n.id == id))
            .ok_or_else(|| {
                SettingsError::NotFound(format!("'{}' is not a child of '{}'", id, self.path()))
            })
    }

    /// Depth-first pre-order walk over this node and everything below it.
    pub fn descendants(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let arena = self.arena;
        arena
            .iter_from(self.idx)
            .filter_map(move |i| NodeRef::new(arena, i))
    }

    pub fn to_document(&self) -> Value {
        document::node_to_document(*self)
    }

    /// Copy this node and its subtree out as a detached node.
    pub fn to_owned_node(&self) -> SettingsResult<Node> {
        document::node_from_document(&self.to_document())
    }

    pub fn to_tree(&self) -> Tree<String> {
        let label = match self.value() {
            Some(value) => format!("{} ({}) = {}", self.id(), self.entry_type(), value),
            None => self.id().to_string(),
        };
        Tree::new(label).with_leaves(self.children().map(|c| c.to_tree()))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.idx == other.idx
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", &self.path())
            .field("type", &self.entry_type())
            .finish()
    }
}

/// Renders the scalar of an entry (empty when null) or the id of a group.
impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => fmt::Display::fmt(value, f),
            None => f.write_str(self.id()),
        }
    }
}

/// Mutable handle to a node stored in a group's arena.
pub struct NodeMut<'a> {
    arena: &'a mut NodeArena,
    idx: Index,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(arena: &'a mut NodeArena, idx: Index) -> Option<Self> {
        arena.get_node(idx)?;
        Some(Self { arena, idx })
    }

    pub fn view(&self) -> NodeRef<'_> {
        NodeRef {
            arena: &*self.arena,
            idx: self.idx,
            node: self.node(),
        }
    }

    fn node(&self) -> &TreeNode {
        self.arena
            .get_node(self.idx)
            .unwrap_or_else(|| unreachable!("NodeMut always points at a live node"))
    }

    fn node_mut(&mut self) -> &mut TreeNode {
        self.arena
            .get_node_mut(self.idx)
            .unwrap_or_else(|| unreachable!("NodeMut always points at a live node"))
    }

    pub fn id(&self) -> &str {
        &self.node().id
    }

    pub fn path(&self) -> String {
        self.arena.path(self.idx)
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.node_mut().description = description;
    }

    /// Replace the scalar of an entry. The type is fixed at construction.
    #[instrument(level = "debug", skip(self), fields(path = %self.path()))]
    pub fn set_value(&mut self, value: impl Into<EntryValue> + fmt::Debug) -> SettingsResult<()> {
        let id = self.id().to_string();
        let value = value.into();
        match &mut self.node_mut().kind {
            NodeKind::Entry(current) => {
                check_same_type(current, &value)?;
                *current = value;
                Ok(())
            }
            NodeKind::Group { .. } => Err(SettingsError::WrongKind {
                id,
                expected: "entry",
                actual: "group",
            }),
        }
    }

    fn require_group(&self, op: &str) -> SettingsResult<()> {
        match self.node().kind {
            NodeKind::Group { .. } => Ok(()),
            NodeKind::Entry(_) => Err(SettingsError::NotSupported(format!(
                "{} on scalar entry '{}'",
                op,
                self.path()
            ))),
        }
    }

    /// Mutable handle to a direct child.
    pub fn get_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        NodeMut {
            arena: &mut *self.arena,
            idx: self.idx,
        }
        .into_child(id)
    }

    /// Mutable handle to a direct child that must be a scalar entry.
    pub fn entry_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        let child = self.get_mut(id)?;
        child.expect_kind("entry")?;
        Ok(child)
    }

    /// Mutable handle to a direct child that must be a group.
    pub fn group_mut(&mut self, id: &str) -> SettingsResult<NodeMut<'_>> {
        let child = self.get_mut(id)?;
        child.expect_kind("group")?;
        Ok(child)
    }

    fn expect_kind(&self, expected: &'static str) -> SettingsResult<()> {
        let actual = kind_name(self.node());
        if actual != expected {
            return Err(SettingsError::WrongKind {
                id: self.id().to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Turn this handle into one for a direct child.
    pub fn into_child(self, id: &str) -> SettingsResult<NodeMut<'a>> {
        self.require_group("lookup")?;
        let path = self.path();
        let child = self
            .arena
            .find_child(self.idx, id)
            .ok_or_else(|| SettingsError::NotFound(format!("{}.{}", path, id)))?;
        NodeMut::new(self.arena, child).ok_or_else(|| SettingsError::NotFound(path))
    }

    /// Attach a detached node as the last child; returns the child's path.
    #[instrument(level = "debug", skip(self, node), fields(parent = %self.path()))]
    pub fn add(&mut self, node: impl Into<Node>) -> SettingsResult<String> {
        self.require_group("add")?;
        let node = node.into();
        if self.arena.find_child(self.idx, node.id()).is_some() {
            return Err(SettingsError::AlreadyExists(format!(
                "{}.{}",
                self.path(),
                node.id()
            )));
        }
        let child = self.arena.attach(node, self.idx);
        let path = self.arena.path(child);
        debug!("added {}", path);
        Ok(path)
    }

    pub fn add_entry(
        &mut self,
        id: &str,
        value: impl Into<EntryValue>,
        description: Option<&str>,
    ) -> SettingsResult<String> {
        let mut entry = Entry::new(id, value)?;
        entry.set_description(description.map(str::to_string));
        self.add(entry)
    }

    pub fn add_group(&mut self, id: &str, children: Vec<Node>) -> SettingsResult<String> {
        let group = Group::new(id, children, false)?;
        self.add(group)
    }

    fn child_for_removal(&self, id: &str, expected: &'static str) -> SettingsResult<Index> {
        self.require_group("remove")?;
        let child = self
            .arena
            .find_child(self.idx, id)
            .ok_or_else(|| SettingsError::NotFound(format!("{}.{}", self.path(), id)))?;
        let node = self
            .arena
            .get_node(child)
            .ok_or_else(|| SettingsError::NotFound(format!("{}.{}", self.path(), id)))?;
        let actual = kind_name(node);
        if actual != expected {
            return Err(SettingsError::WrongKind {
                id: id.to_string(),
                expected,
                actual,
            });
        }
        Ok(child)
    }

    /// Detach a scalar child; the caller takes ownership.
    #[instrument(level = "debug", skip(self), fields(parent = %self.path()))]
    pub fn remove_entry(&mut self, id: &str) -> SettingsResult<Entry> {
        let child = self.child_for_removal(id, "entry")?;
        match self.arena.detach(child) {
            Some(Node::Entry(entry)) => Ok(entry),
            _ => Err(SettingsError::NotFound(id.to_string())),
        }
    }

    /// Detach a child group; non-empty groups need `recursive`.
    #[instrument(level = "debug", skip(self), fields(parent = %self.path()))]
    pub fn remove_group(&mut self, id: &str, recursive: bool) -> SettingsResult<Group> {
        let child = self.child_for_removal(id, "group")?;
        let has_children = self
            .arena
            .get_node(child)
            .is_some_and(|n| !n.children().is_empty());
        if has_children && !recursive {
            return Err(SettingsError::NotEmpty(self.arena.path(child)));
        }
        match self.arena.detach(child) {
            Some(Node::Group(group)) => Ok(group),
            _ => Err(SettingsError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Group {
        let mut group = Group::new("Root1", Vec::new(), false).unwrap();
        group.add_entry("R1-Int", 5, None).unwrap();
        group.add_group("Group1", Vec::new()).unwrap();
        group
    }

    #[test]
    fn test_entry_view_cannot_be_indexed() {
        let group = sample();
        let entry = group.get("R1-Int").unwrap();
        assert!(matches!(entry.get("x"), Err(SettingsError::NotSupported(_))));
    }

    #[test]
    fn test_handles_compare_by_identity() {
        let group = sample();
        let a = group.get("Group1").unwrap();
        let b = group.as_node().get("Group1").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, group.get("R1-Int").unwrap());
    }

    #[test]
    fn test_set_value_on_group_is_wrong_kind() {
        let mut group = sample();
        let mut child = group.get_mut("Group1").unwrap();
        assert!(matches!(
            child.set_value(1),
            Err(SettingsError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_to_tree_labels_entries_with_values() {
        let group = sample();
        let rendered = group.to_tree().to_string();
        assert!(rendered.contains("Root1"));
        assert!(rendered.contains("R1-Int (Int) = 5"));
    }
}
