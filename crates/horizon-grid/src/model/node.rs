//! Row nodes.

use slotmap::new_key_type;

new_key_type! {
    /// Handle to a node in a [`RowTree`](super::RowTree).
    ///
    /// Keys are stable for the lifetime of the tree they came from.
    pub struct NodeKey;
}

/// What kind of row a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Leaf,
    Group {
        children: Vec<NodeKey>,
        expanded: bool,
    },
    Footer,
}

/// A logical row: either a data leaf, a group aggregating child rows, or a
/// group's footer row.
#[derive(Debug, Clone)]
pub struct RowNode<T> {
    pub(crate) id: String,
    pub(crate) data: T,
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) sibling: Option<NodeKey>,
}

impl<T> RowNode<T> {
    /// The node's unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The row payload.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Returns `true` for group rows.
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    /// Returns `true` for a group's footer row.
    pub fn is_footer(&self) -> bool {
        matches!(self.kind, NodeKind::Footer)
    }

    /// Returns `true` for plain data rows.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    /// Child keys in order. Empty for anything but a group.
    pub fn children(&self) -> &[NodeKey] {
        match &self.kind {
            NodeKind::Group { children, .. } => children,
            _ => &[],
        }
    }

    /// Whether a group is expanded. Always `false` for other rows.
    pub fn is_expanded(&self) -> bool {
        matches!(self.kind, NodeKind::Group { expanded: true, .. })
    }

    /// The enclosing group, if any. A footer's parent is its group.
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// The paired row: a group's footer, or a footer's group.
    pub fn sibling(&self) -> Option<NodeKey> {
        self.sibling
    }
}
