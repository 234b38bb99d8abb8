use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::instrument;

use crate::domain::entry::Entry;
use crate::domain::entry_type::{EntryType, EntryValue};
use crate::domain::group::Group;
use crate::domain::node::Node;

/// Payload of a stored node.
#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Entry(EntryValue),
    Group {
        /// Child indices in insertion order
        children: Vec<Index>,
        is_root: bool,
    },
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    pub(crate) id: String,
    pub(crate) description: Option<String>,
    /// Index of the owning group, None for the top of the arena
    pub(crate) parent: Option<Index>,
    pub(crate) kind: NodeKind,
}

impl TreeNode {
    pub(crate) fn entry_type(&self) -> EntryType {
        match &self.kind {
            NodeKind::Entry(value) => value.entry_type(),
            NodeKind::Group { .. } => EntryType::Group,
        }
    }

    pub(crate) fn children(&self) -> &[Index] {
        match &self.kind {
            NodeKind::Group { children, .. } => children,
            NodeKind::Entry(_) => &[],
        }
    }
}

/// Arena storage for one owned subtree.
///
/// Parent links are arena indices, so ownership stays strictly top-down:
/// the arena owns every node, a group only lists the indices of its children.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeArena {
    arena: Arena<TreeNode>,
}

impl NodeArena {
    pub(crate) fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    #[instrument(level = "trace", skip(self, kind, description))]
    pub(crate) fn insert_node(
        &mut self,
        id: String,
        description: Option<String>,
        kind: NodeKind,
        parent: Option<Index>,
    ) -> Index {
        let node_idx = self.arena.insert(TreeNode {
            id,
            description,
            parent,
            kind,
        });
        if let Some(parent_idx) = parent {
            self.push_child(parent_idx, node_idx);
        }
        node_idx
    }

    fn push_child(&mut self, parent_idx: Index, child_idx: Index) {
        if let Some(TreeNode {
            kind: NodeKind::Group { children, .. },
            ..
        }) = self.arena.get_mut(parent_idx)
        {
            children.push(child_idx);
        }
    }

    pub(crate) fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub(crate) fn get_node_mut(&mut self, idx: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(idx)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.arena.len()
    }

    /// Direct child of `group_idx` with the given id.
    pub(crate) fn find_child(&self, group_idx: Index, id: &str) -> Option<Index> {
        self.get_node(group_idx)?
            .children()
            .iter()
            .copied()
            .find(|&child| self.get_node(child).is_some_and(|n| n.id == id))
    }

    /// Dot-joined ids from the top of the arena down to `idx`.
    pub(crate) fn path(&self, idx: Index) -> String {
        let mut ids = Vec::new();
        let mut current = Some(idx);
        while let Some(node) = current.and_then(|i| self.get_node(i)) {
            ids.push(node.id.as_str());
            current = node.parent;
        }
        ids.iter().rev().join(".")
    }

    /// Nearest group at or above `idx` flagged as a root.
    pub(crate) fn root_of(&self, idx: Index) -> Option<Index> {
        let mut current = Some(idx);
        while let Some(i) = current {
            let node = self.get_node(i)?;
            if let NodeKind::Group { is_root: true, .. } = node.kind {
                return Some(i);
            }
            current = node.parent;
        }
        None
    }

    /// Move an owned node below `parent` and return its new index.
    #[instrument(level = "trace", skip(self, node))]
    pub(crate) fn attach(&mut self, node: Node, parent: Index) -> Index {
        match node {
            Node::Entry(entry) => {
                let (id, description, value) = entry.into_parts();
                self.insert_node(id, description, NodeKind::Entry(value), Some(parent))
            }
            Node::Group(group) => {
                let (mut source, top) = group.into_parts();
                if let Some(TreeNode {
                    kind: NodeKind::Group { is_root, .. },
                    ..
                }) = source.get_node_mut(top)
                {
                    // only bundles own roots
                    *is_root = false;
                }
                source.move_subtree(top, self, Some(parent))
            }
        }
    }

    /// Unlink `idx` from its parent and hand the subtree back as an owned node.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn detach(&mut self, idx: Index) -> Option<Node> {
        let parent = self.get_node(idx)?.parent;
        if let Some(TreeNode {
            kind: NodeKind::Group { children, .. },
            ..
        }) = parent.and_then(|p| self.arena.get_mut(p))
        {
            children.retain(|&c| c != idx);
        }

        let is_entry = matches!(self.get_node(idx)?.kind, NodeKind::Entry(_));
        if is_entry {
            let node = self.arena.remove(idx)?;
            let NodeKind::Entry(value) = node.kind else {
                return None;
            };
            return Some(Node::Entry(Entry::from_parts(
                node.id,
                node.description,
                value,
            )));
        }

        let mut target = NodeArena::new();
        let top = self.move_subtree(idx, &mut target, None);
        Some(Node::Group(Group::from_parts(target, top)))
    }

    /// Move the subtree at `idx` into `target`, below `parent`.
    fn move_subtree(&mut self, idx: Index, target: &mut NodeArena, parent: Option<Index>) -> Index {
        let mut stack = vec![(idx, parent)];
        let mut moved_top = None;

        while let Some((current, new_parent)) = stack.pop() {
            let Some(mut node) = self.arena.remove(current) else {
                continue;
            };
            let children = match &mut node.kind {
                NodeKind::Group { children, .. } => std::mem::take(children),
                NodeKind::Entry(_) => Vec::new(),
            };
            node.parent = new_parent;
            let new_idx = target.arena.insert(node);
            if let Some(p) = new_parent {
                target.push_child(p, new_idx);
            }
            moved_top.get_or_insert(new_idx);
            // reversed so children are re-inserted in their original order
            for &child in children.iter().rev() {
                stack.push((child, Some(new_idx)));
            }
        }

        moved_top.unwrap_or(idx)
    }

    /// Depth-first pre-order walk starting at `start`.
    pub(crate) fn iter_from(&self, start: Index) -> TreeIterator<'_> {
        TreeIterator::new(self, start)
    }
}

pub(crate) struct TreeIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a NodeArena, start: Index) -> Self {
        Self {
            arena,
            stack: vec![start],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = Index;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children().iter().rev() {
                    self.stack.push(child);
                }
                return Some(current_idx);
            }
        }
        None
    }
}
