//! Row model: ordered access to virtual rows.

use std::sync::Arc;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{Result, Signal};
use parking_lot::RwLock;

use super::node::NodeKey;
use super::tree::RowTree;

/// The row source a grid's selection and rendering read from.
///
/// A row model exposes the hierarchical tree and a flattened list of
/// "virtual rows" (what the grid would show if every row were mounted).
pub trait RowModel<T>: Send + Sync {
    /// Nodes without a parent, in display order.
    fn top_level_nodes(&self) -> Vec<NodeKey>;

    /// The node shown at virtual row `index`, if any.
    fn virtual_row(&self, index: usize) -> Option<NodeKey>;

    /// Number of virtual rows.
    fn virtual_row_count(&self) -> usize;

    /// A snapshot of the row tree.
    fn tree(&self) -> Arc<RowTree<T>>;
}

/// A row model over an in-memory [`RowTree`].
///
/// Virtual rows are the tree flattened in display order: an expanded group is
/// followed by its children and then its footer; a collapsed group hides
/// both.
///
/// # Example
///
/// ```
/// use horizon_grid::model::{InMemoryRowModel, RowModel};
///
/// let model = InMemoryRowModel::from_rows([("r1", 10), ("r2", 20)]).unwrap();
/// assert_eq!(model.virtual_row_count(), 2);
/// ```
pub struct InMemoryRowModel<T> {
    tree: RwLock<Arc<RowTree<T>>>,
    rows: RwLock<Vec<NodeKey>>,

    /// Emitted with the new virtual row count whenever rows are rebuilt.
    pub rows_changed: Signal<usize>,
}

impl<T: Clone + Send + Sync + 'static> InMemoryRowModel<T> {
    /// Creates a model over `tree`.
    pub fn new(tree: RowTree<T>) -> Self {
        let rows = flatten(&tree);
        Self {
            tree: RwLock::new(Arc::new(tree)),
            rows: RwLock::new(rows),
            rows_changed: Signal::new(),
        }
    }

    /// Creates a flat (ungrouped) model from `(id, data)` pairs.
    pub fn from_rows<I, S>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
    {
        let mut tree = RowTree::new();
        for (id, data) in rows {
            tree.add_leaf(None, id, data)?;
        }
        Ok(Self::new(tree))
    }

    /// Replaces the whole tree.
    ///
    /// Keys from the previous tree are no longer valid afterwards.
    pub fn set_tree(&self, tree: RowTree<T>) {
        *self.tree.write() = Arc::new(tree);
        self.rebuild_rows();
    }

    /// Expands or collapses a group and rebuilds the virtual rows.
    ///
    /// Returns `true` if the state changed.
    pub fn set_expanded(&self, key: NodeKey, expanded: bool) -> bool {
        let changed = {
            let mut tree = self.tree.write();
            Arc::make_mut(&mut tree).set_expanded(key, expanded)
        };
        if changed {
            self.rebuild_rows();
        }
        changed
    }

    /// The virtual row index of `key`, if it is currently visible.
    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        self.rows.read().iter().position(|&k| k == key)
    }

    fn rebuild_rows(&self) {
        let rows = {
            let tree = self.tree.read();
            flatten(&**tree)
        };
        let count = rows.len();
        *self.rows.write() = rows;
        tracing::debug!(target: targets::MODEL, count, "virtual rows rebuilt");
        self.rows_changed.emit(count);
    }
}

impl<T: Clone + Send + Sync + 'static> RowModel<T> for InMemoryRowModel<T> {
    fn top_level_nodes(&self) -> Vec<NodeKey> {
        self.tree.read().top_level().to_vec()
    }

    fn virtual_row(&self, index: usize) -> Option<NodeKey> {
        self.rows.read().get(index).copied()
    }

    fn virtual_row_count(&self) -> usize {
        self.rows.read().len()
    }

    fn tree(&self) -> Arc<RowTree<T>> {
        self.tree.read().clone()
    }
}

fn flatten<T>(tree: &RowTree<T>) -> Vec<NodeKey> {
    let mut rows = Vec::with_capacity(tree.len());
    flatten_into(tree, tree.top_level(), &mut rows);
    rows
}

fn flatten_into<T>(tree: &RowTree<T>, keys: &[NodeKey], rows: &mut Vec<NodeKey>) {
    for &key in keys {
        let Some(node) = tree.node(key) else { continue };
        rows.push(key);
        if node.is_expanded() {
            flatten_into(tree, node.children(), rows);
            if let Some(footer) = node.sibling() {
                rows.push(footer);
            }
        }
    }
}
