//! Arena-backed row tree.
//!
//! `RowTree` owns every [`RowNode`] of a grid and hands out [`NodeKey`]s.
//! Groups hold their children as keys, and a group and its footer refer to
//! each other through `sibling`.

use std::collections::HashMap;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{GridError, Result};
use slotmap::SlotMap;

use super::node::{NodeKey, NodeKind, RowNode};

/// Hierarchical storage for grid rows.
///
/// # Example
///
/// ```
/// use horizon_grid::model::RowTree;
///
/// let mut tree = RowTree::new();
/// let fruit = tree.add_group(None, "fruit", "Fruit", true).unwrap();
/// tree.add_leaf(Some(fruit), "apple", "Apple").unwrap();
/// tree.add_leaf(Some(fruit), "pear", "Pear").unwrap();
/// tree.add_footer(fruit, "fruit-footer", "2 items").unwrap();
///
/// assert_eq!(tree.children(fruit).len(), 2);
/// assert_eq!(tree.leaf_descendants(fruit).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RowTree<T> {
    nodes: SlotMap<NodeKey, RowNode<T>>,
    by_id: HashMap<String, NodeKey>,
    top_level: Vec<NodeKey>,
}

impl<T> Default for RowTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RowTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            by_id: HashMap::new(),
            top_level: Vec::new(),
        }
    }

    /// Number of nodes, footers included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Adds a data row under `parent`, or at the top level when `parent` is `None`.
    pub fn add_leaf(
        &mut self,
        parent: Option<NodeKey>,
        id: impl Into<String>,
        data: T,
    ) -> Result<NodeKey> {
        self.insert(parent, id.into(), data, NodeKind::Leaf)
    }

    /// Adds a group row under `parent`, or at the top level when `parent` is `None`.
    pub fn add_group(
        &mut self,
        parent: Option<NodeKey>,
        id: impl Into<String>,
        data: T,
        expanded: bool,
    ) -> Result<NodeKey> {
        let kind = NodeKind::Group {
            children: Vec::new(),
            expanded,
        };
        self.insert(parent, id.into(), data, kind)
    }

    /// Adds a footer row to `group` and links the two as siblings.
    ///
    /// The footer is not one of the group's children; it is shown after them
    /// while the group is expanded.
    pub fn add_footer(&mut self, group: NodeKey, id: impl Into<String>, data: T) -> Result<NodeKey> {
        let id = id.into();
        let group_node = self.require(group)?;
        if !group_node.is_group() {
            return Err(GridError::NotAGroup(group_node.id.clone()));
        }
        if group_node.sibling.is_some() {
            return Err(GridError::FooterAlreadyPresent(group_node.id.clone()));
        }
        if self.by_id.contains_key(&id) {
            return Err(GridError::DuplicateNodeId(id));
        }

        let footer = self.nodes.insert(RowNode {
            id: id.clone(),
            data,
            kind: NodeKind::Footer,
            parent: Some(group),
            sibling: Some(group),
        });
        self.by_id.insert(id, footer);
        if let Some(group_node) = self.nodes.get_mut(group) {
            group_node.sibling = Some(footer);
        }
        Ok(footer)
    }

    fn insert(
        &mut self,
        parent: Option<NodeKey>,
        id: String,
        data: T,
        kind: NodeKind,
    ) -> Result<NodeKey> {
        if self.by_id.contains_key(&id) {
            return Err(GridError::DuplicateNodeId(id));
        }
        if let Some(parent) = parent {
            let parent_node = self.require(parent)?;
            if !parent_node.is_group() {
                return Err(GridError::NotAGroup(parent_node.id.clone()));
            }
        }

        let key = self.nodes.insert(RowNode {
            id: id.clone(),
            data,
            kind,
            parent,
            sibling: None,
        });
        self.by_id.insert(id, key);

        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(RowNode {
                kind: NodeKind::Group { children, .. },
                ..
            }) => children.push(key),
            _ => self.top_level.push(key),
        }
        Ok(key)
    }

    fn require(&self, key: NodeKey) -> Result<&RowNode<T>> {
        self.nodes
            .get(key)
            .ok_or_else(|| GridError::UnknownNode(format!("{key:?}")))
    }

    /// Gets a node by key.
    pub fn node(&self, key: NodeKey) -> Option<&RowNode<T>> {
        self.nodes.get(key)
    }

    /// Looks up a node by its id.
    pub fn find(&self, id: &str) -> Option<NodeKey> {
        self.by_id.get(id).copied()
    }

    /// Nodes without a parent, in insertion order.
    pub fn top_level(&self) -> &[NodeKey] {
        &self.top_level
    }

    /// Children of a group. Empty for other rows and unknown keys.
    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes.get(key).map(RowNode::children).unwrap_or(&[])
    }

    /// All non-group rows below `key`, depth first.
    pub fn leaf_descendants(&self, key: NodeKey) -> Vec<NodeKey> {
        let mut leaves = Vec::new();
        self.collect_leaves(key, &mut leaves);
        leaves
    }

    fn collect_leaves(&self, key: NodeKey, leaves: &mut Vec<NodeKey>) {
        for &child in self.children(key) {
            match self.nodes.get(child) {
                Some(node) if node.is_group() => self.collect_leaves(child, leaves),
                Some(_) => leaves.push(child),
                None => {}
            }
        }
    }

    /// Expands or collapses a group.
    ///
    /// Returns `true` if the state changed.
    pub fn set_expanded(&mut self, key: NodeKey, expand: bool) -> bool {
        match self.nodes.get_mut(key) {
            Some(RowNode {
                kind: NodeKind::Group { expanded, .. },
                id,
                ..
            }) if *expanded != expand => {
                *expanded = expand;
                tracing::trace!(target: targets::MODEL, id = %id, expanded = expand, "group toggled");
                true
            }
            _ => false,
        }
    }
}
