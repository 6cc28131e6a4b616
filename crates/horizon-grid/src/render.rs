//! Rendered row window.
//!
//! The grid only materializes a contiguous slice of its virtual rows. The
//! [`RowRenderer`] trait is how the selection controller learns which rows are
//! mounted and how it toggles their "selected" marker. [`RenderedRows`] is an
//! in-memory renderer that keeps that state without drawing anything; hosts
//! either wrap it or implement the trait over their own row elements.

use std::collections::{HashMap, HashSet};

use horizon_grid_core::logging::targets;
use parking_lot::RwLock;

use crate::model::NodeKey;
use crate::selection::SelectionController;

/// The rendering side of the grid, as seen by the selection controller.
pub trait RowRenderer: Send + Sync {
    /// The virtual row index at which `node` is mounted, if it is mounted.
    fn index_of_rendered_node(&self, node: NodeKey) -> Option<usize>;

    /// First mounted virtual row, or `None` when nothing is mounted.
    fn first_virtual_rendered_row(&self) -> Option<usize>;

    /// Last mounted virtual row (inclusive), or `None` when nothing is mounted.
    fn last_virtual_rendered_row(&self) -> Option<usize>;

    /// Applies or removes the selected marker on a mounted row.
    fn set_row_selected(&self, index: usize, selected: bool);
}

#[derive(Default)]
struct WindowState {
    range: Option<(usize, usize)>,
    mounted: HashMap<NodeKey, usize>,
    marked: HashSet<usize>,
}

/// In-memory [`RowRenderer`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use horizon_grid::model::InMemoryRowModel;
/// use horizon_grid::render::{RenderedRows, RowRenderer};
/// use horizon_grid::selection::SelectionController;
///
/// let model = Arc::new(InMemoryRowModel::from_rows((0..100).map(|i| (format!("r{i}"), i))).unwrap());
/// let mut selection = SelectionController::<i32>::default();
/// selection.set_row_model(model);
///
/// let renderer = Arc::new(RenderedRows::new());
/// renderer.mount_window(10, 29, &selection);
/// selection.set_row_renderer(renderer.clone());
///
/// assert_eq!(renderer.first_virtual_rendered_row(), Some(10));
/// assert_eq!(renderer.mounted_count(), 20);
/// ```
#[derive(Default)]
pub struct RenderedRows {
    state: RwLock<WindowState>,
}

impl RenderedRows {
    /// Creates a renderer with nothing mounted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts virtual rows `first..=last` from the controller's row model.
    ///
    /// The window is clamped to the rows that exist. Each mounted row's
    /// marker is taken from the controller, so rows scrolled into view show
    /// selection made while they were unmounted.
    pub fn mount_window<T>(&self, first: usize, last: usize, selection: &SelectionController<T>)
    where
        T: Clone + Send + Sync + 'static,
    {
        let Some(model) = selection.row_model() else {
            self.unmount_all();
            return;
        };
        let count = model.virtual_row_count();
        if count == 0 || first > last || first >= count {
            self.unmount_all();
            return;
        }
        let last = last.min(count - 1);

        let mut mounted = HashMap::with_capacity(last - first + 1);
        let mut marked = HashSet::new();
        for index in first..=last {
            let Some(key) = model.virtual_row(index) else { continue };
            mounted.insert(key, index);
            if selection.is_node_selected(key) == Some(true) {
                marked.insert(index);
            }
        }

        tracing::debug!(target: targets::RENDER, first, last, marked = marked.len(), "window mounted");
        *self.state.write() = WindowState {
            range: Some((first, last)),
            mounted,
            marked,
        };
    }

    /// Unmounts every row.
    pub fn unmount_all(&self) {
        *self.state.write() = WindowState::default();
    }

    /// Whether the row at `index` currently carries the selected marker.
    pub fn is_row_marked(&self, index: usize) -> bool {
        self.state.read().marked.contains(&index)
    }

    /// Number of mounted rows.
    pub fn mounted_count(&self) -> usize {
        self.state.read().mounted.len()
    }
}

impl RowRenderer for RenderedRows {
    fn index_of_rendered_node(&self, node: NodeKey) -> Option<usize> {
        self.state.read().mounted.get(&node).copied()
    }

    fn first_virtual_rendered_row(&self) -> Option<usize> {
        self.state.read().range.map(|(first, _)| first)
    }

    fn last_virtual_rendered_row(&self) -> Option<usize> {
        self.state.read().range.map(|(_, last)| last)
    }

    fn set_row_selected(&self, index: usize, selected: bool) {
        let mut state = self.state.write();
        match state.range {
            Some((first, last)) if (first..=last).contains(&index) => {}
            _ => {
                tracing::trace!(target: targets::RENDER, index, "marker ignored, row not mounted");
                return;
            }
        }
        if selected {
            state.marked.insert(index);
        } else {
            state.marked.remove(&index);
        }
    }
}
