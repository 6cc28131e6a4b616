//! Row selection for grids.
//!
//! [`SelectionController`] tracks which logical rows are selected across a
//! virtualized, possibly grouped row set. Selection state covers every row,
//! mounted or not; the "selected" marker is only applied to rows inside the
//! renderer's current window, and renderers re-query
//! [`is_node_selected`](SelectionController::is_node_selected) when they mount
//! a row.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::config::{RowSelection, SelectionOptions};
//! use horizon_grid::model::InMemoryRowModel;
//! use horizon_grid::selection::SelectionController;
//!
//! let model = Arc::new(InMemoryRowModel::from_rows([("r1", "a"), ("r2", "b")]).unwrap());
//! let options = SelectionOptions::new().with_row_selection(RowSelection::Multiple);
//!
//! let mut selection = SelectionController::<&str>::new(options);
//! selection.set_row_model(model);
//!
//! selection.selection_changed.connect(|_| println!("selection changed"));
//!
//! selection.select_index(0, true, false);
//! selection.select_index(1, true, false);
//! assert_eq!(selection.selected_rows(), &["a", "b"]);
//! ```
//!
//! # Group selection
//!
//! With [`GroupSelection::Children`](crate::config::GroupSelection::Children)
//! groups are never members of the selection. Selecting a group selects its
//! leaf rows, and the group reports a tri-state derived from them.
//!
//! # Reentrancy
//!
//! Mutating methods take `&mut self`, so slots connected to the synchronous
//! signals cannot call back into the controller. Slots that need to change
//! the selection in response should connect to
//! [`refresh_requested`](SelectionController::refresh_requested), which is
//! delivered through the [`TaskQueue`] after the mutation has returned.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use horizon_grid_core::logging::targets;
use horizon_grid_core::{PerfSpan, Signal, TaskQueue};

use crate::config::SelectionOptions;
use crate::model::{NodeKey, RowModel, RowTree};
use crate::render::RowRenderer;

/// A selection set entry.
#[derive(Debug, Clone, Copy)]
struct Selected {
    key: NodeKey,
    /// Position in `selection_order`.
    seq: u64,
}

/// Checkbox state for a row, as shown by selection checkboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckState {
    /// Not selected.
    Unchecked,
    /// Selected.
    Checked,
    /// A group whose descendants are partly selected.
    PartiallyChecked,
}

impl From<Option<bool>> for CheckState {
    fn from(selected: Option<bool>) -> Self {
        match selected {
            Some(true) => CheckState::Checked,
            Some(false) => CheckState::Unchecked,
            None => CheckState::PartiallyChecked,
        }
    }
}

/// Selection state of a subtree, derived from its leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubtreeState {
    Selected,
    Unselected,
    Mixed,
    /// No leaves below; must not influence the parent's determination.
    DoNotCare,
}

/// Manages row selection for a grid.
///
/// # Signals
///
/// - `virtual_row_selected`: a rendered row's marker changed. Args: (rendered index, state),
///   where `None` is a partially selected group
/// - `row_selected`: a node entered the selection. Args: (data, node)
/// - `selection_changed`: the selection changed; re-read [`selected_rows`](Self::selected_rows)
/// - `refresh_requested`: deferred through the task queue after every change
pub struct SelectionController<T> {
    options: SelectionOptions,
    row_model: Option<Arc<dyn RowModel<T>>>,
    renderer: Option<Arc<dyn RowRenderer>>,
    task_queue: Option<Arc<TaskQueue>>,

    /// Selected nodes by id.
    selected_by_id: HashMap<String, Selected>,
    /// Selected ids keyed by insertion sequence.
    selection_order: BTreeMap<u64, String>,
    next_seq: u64,
    /// Payloads of the selected rows, rebuilt after every change.
    selected_rows: Vec<T>,

    /// Emitted when a rendered row's marker changes. Args: (index, state)
    pub virtual_row_selected: Signal<(usize, Option<bool>)>,

    /// Emitted for each node that becomes selected. Args: (data, node)
    pub row_selected: Signal<(T, NodeKey)>,

    /// Emitted after the selection changed.
    pub selection_changed: Signal<()>,

    /// Queued on the task queue after the selection changed.
    pub refresh_requested: Signal<()>,
}

impl<T: Clone + Send + Sync + 'static> Default for SelectionController<T> {
    fn default() -> Self {
        Self::new(SelectionOptions::default())
    }
}

impl<T: Clone + Send + Sync + 'static> SelectionController<T> {
    /// Creates a controller with an empty selection.
    pub fn new(options: SelectionOptions) -> Self {
        Self {
            options,
            row_model: None,
            renderer: None,
            task_queue: None,
            selected_by_id: HashMap::new(),
            selection_order: BTreeMap::new(),
            next_seq: 0,
            selected_rows: Vec::new(),
            virtual_row_selected: Signal::new(),
            row_selected: Signal::new(),
            selection_changed: Signal::new(),
            refresh_requested: Signal::new(),
        }
    }

    // =========================================================================
    // Collaborators
    // =========================================================================

    /// Sets the row model and clears the selection, since node keys from a
    /// previous model are meaningless for the new one.
    pub fn set_row_model(&mut self, model: Arc<dyn RowModel<T>>) {
        self.row_model = Some(model);
        self.clear_selection();
    }

    /// Gets the current row model.
    pub fn row_model(&self) -> Option<&Arc<dyn RowModel<T>>> {
        self.row_model.as_ref()
    }

    /// Sets the renderer whose rows receive the selected marker.
    pub fn set_row_renderer(&mut self, renderer: Arc<dyn RowRenderer>) {
        self.renderer = Some(renderer);
    }

    /// Sets the queue `refresh_requested` is delivered through.
    ///
    /// Without a queue the refresh is emitted immediately.
    pub fn set_task_queue(&mut self, queue: Arc<TaskQueue>) {
        self.task_queue = Some(queue);
    }

    /// Gets the selection options.
    pub fn options(&self) -> &SelectionOptions {
        &self.options
    }

    /// Sets the selection options.
    ///
    /// Changing options does not alter the existing selection; subsequent
    /// operations follow the new options.
    pub fn set_options(&mut self, options: SelectionOptions) {
        self.options = options;
    }

    fn tree(&self) -> Option<Arc<RowTree<T>>> {
        self.row_model.as_ref().map(|model| model.tree())
    }

    // =========================================================================
    // Selection Queries
    // =========================================================================

    /// Whether `node` is selected.
    ///
    /// Returns `Some(true)` or `Some(false)` for ordinary rows. In children
    /// group selection a group returns `Some(true)` if all its leaves are
    /// selected, `Some(false)` if none are and `None` otherwise. A footer
    /// answers for its group.
    pub fn is_node_selected(&self, node: NodeKey) -> Option<bool> {
        match self.tree() {
            Some(tree) => self.is_node_selected_in(&tree, node),
            None => Some(false),
        }
    }

    /// [`is_node_selected`](Self::is_node_selected) as a checkbox state.
    pub fn check_state(&self, node: NodeKey) -> CheckState {
        self.is_node_selected(node).into()
    }

    /// Returns true if any rows are selected.
    pub fn has_selection(&self) -> bool {
        !self.selection_order.is_empty()
    }

    /// Returns the number of selected nodes.
    pub fn selected_count(&self) -> usize {
        self.selection_order.len()
    }

    /// Payloads of the selected rows, in selection order.
    pub fn selected_rows(&self) -> &[T] {
        &self.selected_rows
    }

    /// The selected nodes, in selection order.
    pub fn selected_nodes(&self) -> Vec<NodeKey> {
        self.selection_order
            .values()
            .filter_map(|id| self.selected_by_id.get(id))
            .map(|selected| selected.key)
            .collect()
    }

    /// The smallest set of nodes that covers the selection.
    ///
    /// Walks the tree top-down, starting from the row model's top-level
    /// nodes in the order the model reports them. A selected node is included and its subtree
    /// is not visited; an unselected group is descended into. Only actual
    /// members of the selection are returned, so in children group selection
    /// the result holds leaves, never groups.
    pub fn best_cost_node_selection(&self) -> Vec<NodeKey> {
        let Some(model) = &self.row_model else {
            return Vec::new();
        };

        let _span = PerfSpan::new("best_cost_node_selection");
        let tree = model.tree();
        let mut result = Vec::new();
        self.collect_best_cost(&tree, &model.top_level_nodes(), &mut result);
        result
    }

    fn collect_best_cost(&self, tree: &RowTree<T>, nodes: &[NodeKey], result: &mut Vec<NodeKey>) {
        for &key in nodes {
            let Some(node) = tree.node(key) else { continue };
            if self.selected_by_id.contains_key(node.id()) {
                result.push(key);
            } else if node.is_group() && !node.children().is_empty() {
                self.collect_best_cost(tree, node.children(), result);
            }
        }
    }

    fn is_node_selected_in(&self, tree: &RowTree<T>, key: NodeKey) -> Option<bool> {
        let Some(node) = tree.node(key) else {
            return Some(false);
        };
        if node.is_footer() {
            return match node.sibling() {
                Some(group) => self.is_node_selected_in(tree, group),
                None => Some(false),
            };
        }

        if self.options.is_group_select_children() && node.is_group() {
            match self.recursively_check_if_selected(tree, key) {
                SubtreeState::Selected => Some(true),
                SubtreeState::Unselected => Some(false),
                SubtreeState::Mixed | SubtreeState::DoNotCare => None,
            }
        } else {
            Some(self.selected_by_id.contains_key(node.id()))
        }
    }

    fn recursively_check_if_selected(&self, tree: &RowTree<T>, key: NodeKey) -> SubtreeState {
        let mut found_selected = false;
        let mut found_unselected = false;

        for &child in tree.children(key) {
            let Some(child_node) = tree.node(child) else { continue };
            if child_node.is_group() {
                match self.recursively_check_if_selected(tree, child) {
                    SubtreeState::Selected => found_selected = true,
                    SubtreeState::Unselected => found_unselected = true,
                    SubtreeState::Mixed => return SubtreeState::Mixed,
                    SubtreeState::DoNotCare => {}
                }
            } else if child_node.is_leaf() {
                if self.selected_by_id.contains_key(child_node.id()) {
                    found_selected = true;
                } else {
                    found_unselected = true;
                }
            }

            if found_selected && found_unselected {
                return SubtreeState::Mixed;
            }
        }

        match (found_selected, found_unselected) {
            (true, _) => SubtreeState::Selected,
            (false, true) => SubtreeState::Unselected,
            (false, false) => SubtreeState::DoNotCare,
        }
    }

    // =========================================================================
    // Selection Operations
    // =========================================================================

    /// Selects the node at virtual row `index`.
    ///
    /// An index the row model cannot resolve is ignored.
    pub fn select_index(&mut self, index: usize, try_multi: bool, suppress_events: bool) -> bool {
        match self.resolve_index(index) {
            Some(node) => self.select_node(node, try_multi, suppress_events),
            None => false,
        }
    }

    /// Selects `node`.
    ///
    /// A footer selects its group. Unless `try_multi` is set and the options
    /// allow multiple rows, everything else is deselected first. In children
    /// group selection a group selects its leaves instead of itself.
    /// `suppress_events` silences `row_selected` and `selection_changed`.
    ///
    /// Returns `true` if the selection changed.
    pub fn select_node(&mut self, node: NodeKey, try_multi: bool, suppress_events: bool) -> bool {
        let Some(tree) = self.tree() else {
            return false;
        };
        let Some(target) = tree.node(node) else {
            tracing::trace!(target: targets::SELECTION, ?node, "select ignored, unknown node");
            return false;
        };
        let node_to_select = if target.is_footer() {
            match target.sibling() {
                Some(group) => group,
                None => return false,
            }
        } else {
            node
        };
        let select_children = self.options.is_group_select_children()
            && tree.node(node_to_select).is_some_and(|n| n.is_group());

        let multi = self.options.is_row_selection_multi() && try_multi;
        let mut unselected = false;
        if !multi {
            let keep: HashSet<NodeKey> = if select_children {
                tree.leaf_descendants(node_to_select).into_iter().collect()
            } else {
                HashSet::from([node_to_select])
            };
            unselected = self.deselect_all_nodes_except(&tree, &keep);
        }

        let selected = if select_children {
            self.recursively_select_all_children(&tree, node_to_select, suppress_events)
        } else {
            self.do_work_of_select_node(&tree, node_to_select, suppress_events)
        };

        let changed = unselected || selected;
        if changed {
            self.sync_selected_rows_and_call_listener(&tree, suppress_events);
        }
        self.update_group_parents_if_needed();
        changed
    }

    /// Deselects the node at virtual row `index`.
    ///
    /// An index the row model cannot resolve is ignored without notification.
    pub fn deselect_index(&mut self, index: usize) -> bool {
        match self.resolve_index(index) {
            Some(node) => self.deselect_node(node),
            None => false,
        }
    }

    /// Deselects `node`.
    ///
    /// A footer deselects its group. In children group selection a group
    /// deselects all its leaves.
    ///
    /// Returns `true` if the selection changed.
    pub fn deselect_node(&mut self, node: NodeKey) -> bool {
        let Some(tree) = self.tree() else {
            return false;
        };
        let Some(target) = tree.node(node) else {
            return false;
        };
        let node_to_deselect = match (target.is_footer(), target.sibling()) {
            (true, Some(group)) => group,
            _ => node,
        };
        let Some(target) = tree.node(node_to_deselect) else {
            return false;
        };

        let changed = if self.options.is_group_select_children() && target.is_group() {
            self.recursively_deselect_all_children(&tree, node_to_deselect)
        } else {
            self.do_work_of_deselect_node(&tree, target.id())
        };

        if changed {
            self.sync_selected_rows_and_call_listener(&tree, false);
        }
        self.update_group_parents_if_needed();
        changed
    }

    /// Empties the selection.
    ///
    /// No `row_selected` or `selection_changed` notifications are sent;
    /// markers on rendered rows are removed.
    pub fn clear_selection(&mut self) {
        let previous: Vec<NodeKey> = self.selected_by_id.drain().map(|(_, selected)| selected.key).collect();
        self.selection_order.clear();
        self.selected_rows.clear();

        if previous.is_empty() {
            return;
        }
        tracing::debug!(target: targets::SELECTION, cleared = previous.len(), "selection cleared");

        if let Some(tree) = self.tree() {
            for key in previous {
                self.set_marker_for_node(&tree, key, false);
            }
        }
        self.update_group_parents_if_needed();
    }

    /// Refreshes the markers of rendered group rows.
    ///
    /// For every row in the renderer's window that is a group (or a group's
    /// footer) the tri-state is recomputed, applied to the row and announced
    /// through `virtual_row_selected`. Only does anything in children group
    /// selection.
    pub fn update_group_parents_if_needed(&self) {
        if !self.options.is_group_select_children() {
            return;
        }
        let (Some(model), Some(renderer)) = (&self.row_model, &self.renderer) else {
            return;
        };
        let (Some(first), Some(last)) = (
            renderer.first_virtual_rendered_row(),
            renderer.last_virtual_rendered_row(),
        ) else {
            return;
        };

        let tree = model.tree();
        for row_index in first..=last {
            let Some(key) = model.virtual_row(row_index) else { continue };
            let Some(node) = tree.node(key) else { continue };
            if !node.is_group() && !node.is_footer() {
                continue;
            }

            let selected = self.is_node_selected_in(&tree, key);
            renderer.set_row_selected(row_index, selected == Some(true));
            self.virtual_row_selected.emit((row_index, selected));
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    fn resolve_index(&self, index: usize) -> Option<NodeKey> {
        let node = self.row_model.as_ref()?.virtual_row(index);
        if node.is_none() {
            tracing::trace!(target: targets::SELECTION, index, "row index did not resolve");
        }
        node
    }

    /// Adds one node to the selection, marks it and notifies `row_selected`.
    fn do_work_of_select_node(&mut self, tree: &RowTree<T>, key: NodeKey, suppress_events: bool) -> bool {
        let Some(node) = tree.node(key) else {
            return false;
        };
        if self.selected_by_id.contains_key(node.id()) {
            return false;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.selected_by_id.insert(node.id().to_string(), Selected { key, seq });
        self.selection_order.insert(seq, node.id().to_string());
        tracing::trace!(target: targets::SELECTION, id = node.id(), "node selected");

        self.set_marker_for_node(tree, key, true);

        if !suppress_events {
            self.row_selected.emit((node.data().clone(), key));
        }
        true
    }

    /// Removes one node from the selection by id and clears its marker.
    fn do_work_of_deselect_node(&mut self, tree: &RowTree<T>, id: &str) -> bool {
        let Some(Selected { key, seq }) = self.selected_by_id.remove(id) else {
            return false;
        };
        self.selection_order.remove(&seq);
        tracing::trace!(target: targets::SELECTION, id, "node deselected");

        self.set_marker_for_node(tree, key, false);
        true
    }

    /// Deselects every node not in `keep`.
    fn deselect_all_nodes_except(&mut self, tree: &RowTree<T>, keep: &HashSet<NodeKey>) -> bool {
        let doomed: Vec<String> = self
            .selection_order
            .values()
            .filter(|id| {
                self.selected_by_id
                    .get(*id)
                    .is_some_and(|selected| !keep.contains(&selected.key))
            })
            .cloned()
            .collect();

        let mut changed = false;
        for id in &doomed {
            changed |= self.do_work_of_deselect_node(tree, id);
        }
        changed
    }

    fn recursively_select_all_children(
        &mut self,
        tree: &RowTree<T>,
        key: NodeKey,
        suppress_events: bool,
    ) -> bool {
        let mut changed = false;
        for &child in tree.children(key) {
            let Some(child_node) = tree.node(child) else { continue };
            if child_node.is_group() {
                changed |= self.recursively_select_all_children(tree, child, suppress_events);
            } else {
                changed |= self.do_work_of_select_node(tree, child, suppress_events);
            }
        }
        changed
    }

    fn recursively_deselect_all_children(&mut self, tree: &RowTree<T>, key: NodeKey) -> bool {
        let mut changed = false;
        for &child in tree.children(key) {
            let Some(child_node) = tree.node(child) else { continue };
            if child_node.is_group() {
                changed |= self.recursively_deselect_all_children(tree, child);
            } else {
                changed |= self.do_work_of_deselect_node(tree, child_node.id());
            }
        }
        changed
    }

    /// Applies or removes the marker on `key`'s rendered row, and on its
    /// footer when `key` is an expanded group.
    fn set_marker_for_node(&self, tree: &RowTree<T>, key: NodeKey, selected: bool) {
        self.set_marker_for_rendered_row(key, selected);

        if let Some(node) = tree.node(key)
            && node.is_group()
            && node.is_expanded()
            && let Some(footer) = node.sibling()
        {
            self.set_marker_for_rendered_row(footer, selected);
        }
    }

    fn set_marker_for_rendered_row(&self, key: NodeKey, selected: bool) {
        let Some(renderer) = &self.renderer else {
            return;
        };
        if let Some(index) = renderer.index_of_rendered_node(key) {
            renderer.set_row_selected(index, selected);
            self.virtual_row_selected.emit((index, Some(selected)));
        }
    }

    /// Rebuilds the projection and notifies listeners.
    fn sync_selected_rows_and_call_listener(&mut self, tree: &RowTree<T>, suppress_events: bool) {
        self.selected_rows = self
            .selection_order
            .values()
            .filter_map(|id| self.selected_by_id.get(id))
            .filter_map(|selected| tree.node(selected.key))
            .map(|node| node.data().clone())
            .collect();

        tracing::debug!(
            target: targets::SELECTION,
            selected = self.selected_rows.len(),
            suppress_events,
            "selection synced"
        );

        if !suppress_events {
            self.selection_changed.emit(());
        }

        match &self.task_queue {
            Some(queue) => {
                self.refresh_requested.emit_queued((), queue);
            }
            None => {
                tracing::debug!(target: targets::SELECTION, "no task queue, refreshing immediately");
                self.refresh_requested.emit(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GroupSelection, RowSelection};
    use crate::model::InMemoryRowModel;
    use crate::render::RenderedRows;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn multi() -> SelectionOptions {
        SelectionOptions::new().with_row_selection(RowSelection::Multiple)
    }

    fn children_multi() -> SelectionOptions {
        multi().with_group_selection(GroupSelection::Children)
    }

    fn flat(options: SelectionOptions) -> (SelectionController<&'static str>, Arc<InMemoryRowModel<&'static str>>) {
        let model = Arc::new(
            InMemoryRowModel::from_rows([
                ("R1", "d1"),
                ("R2", "d2"),
                ("R3", "d3"),
                ("R4", "d4"),
                ("R5", "d5"),
            ])
            .unwrap(),
        );
        let mut selection = SelectionController::<&'static str>::new(options);
        selection.set_row_model(model.clone());
        (selection, model)
    }

    /// g (expanded) -> [c1, c2, c3], footer g-footer; then leaf x.
    fn grouped(options: SelectionOptions) -> (SelectionController<&'static str>, Arc<RowTree<&'static str>>) {
        let mut tree = RowTree::new();
        let g = tree.add_group(None, "g", "group", true).unwrap();
        tree.add_leaf(Some(g), "c1", "c1").unwrap();
        tree.add_leaf(Some(g), "c2", "c2").unwrap();
        tree.add_leaf(Some(g), "c3", "c3").unwrap();
        tree.add_footer(g, "g-footer", "total").unwrap();
        tree.add_leaf(None, "x", "x").unwrap();

        let model = Arc::new(InMemoryRowModel::new(tree));
        let mut selection = SelectionController::<&'static str>::new(options);
        selection.set_row_model(model.clone());
        (selection, model.tree())
    }

    fn key(tree: &RowTree<&'static str>, id: &str) -> NodeKey {
        tree.find(id).unwrap()
    }

    #[test]
    fn test_controller_creation() {
        let selection = SelectionController::<u32>::default();
        assert!(!selection.has_selection());
        assert!(selection.selected_rows().is_empty());
        assert!(!selection.options().is_row_selection_multi());
    }

    #[test]
    fn test_select_then_deselect() {
        let (mut selection, model) = flat(multi());
        let r2 = model.virtual_row(1).unwrap();

        assert!(selection.select_node(r2, true, false));
        assert_eq!(selection.is_node_selected(r2), Some(true));

        assert!(selection.deselect_node(r2));
        assert_eq!(selection.is_node_selected(r2), Some(false));
        assert!(!selection.has_selection());
        assert!(selection.selected_rows().is_empty());
    }

    #[test]
    fn test_redundant_operations_are_no_ops() {
        let (mut selection, model) = flat(multi());
        let r1 = model.virtual_row(0).unwrap();

        assert!(selection.select_node(r1, true, false));
        assert!(!selection.select_node(r1, true, false));
        assert!(selection.deselect_node(r1));
        assert!(!selection.deselect_node(r1));
    }

    #[test]
    fn test_multi_select_extends() {
        let (mut selection, _) = flat(multi());

        selection.select_index(0, true, false);
        selection.select_index(2, true, false);
        assert_eq!(selection.selected_rows(), &["d1", "d3"]);

        selection.deselect_index(0);
        assert_eq!(selection.selected_rows(), &["d3"]);
    }

    #[test]
    fn test_single_select_replaces() {
        let (mut selection, model) = flat(SelectionOptions::new());

        selection.select_index(1, false, false);
        selection.select_index(3, false, false);
        assert_eq!(selection.selected_rows(), &["d4"]);
        assert_eq!(selection.selected_nodes(), vec![model.virtual_row(3).unwrap()]);
    }

    #[test]
    fn test_try_multi_without_multi_option_replaces() {
        let (mut selection, _) = flat(SelectionOptions::new());

        selection.select_index(0, true, false);
        selection.select_index(1, true, false);
        assert_eq!(selection.selected_rows(), &["d2"]);
    }

    #[test]
    fn test_reselecting_sole_selection_reports_no_change() {
        let (mut selection, _) = flat(SelectionOptions::new());
        assert!(selection.select_index(2, false, false));
        assert!(!selection.select_index(2, false, false));
        assert_eq!(selection.selected_count(), 1);
    }

    #[test]
    fn test_unresolved_index_is_silent() {
        let (mut selection, _) = flat(multi());
        let changes = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        selection.selection_changed.connect(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!selection.select_index(99, true, false));
        assert!(!selection.deselect_index(99));
        assert_eq!(changes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_without_row_model() {
        let mut selection = SelectionController::<u32>::new(multi());
        assert!(!selection.select_index(0, true, false));
        assert!(selection.best_cost_node_selection().is_empty());
    }

    #[test]
    fn test_signals_and_suppression() {
        let (mut selection, _) = flat(multi());
        let rows = Arc::new(Mutex::new(Vec::new()));
        let changes = Arc::new(AtomicUsize::new(0));

        let rows_clone = rows.clone();
        selection.row_selected.connect(move |(data, _)| {
            rows_clone.lock().push(*data);
        });
        let changes_clone = changes.clone();
        selection.selection_changed.connect(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });

        selection.select_index(0, true, false);
        selection.select_index(1, true, true);

        assert_eq!(*rows.lock(), vec!["d1"]);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(selection.selected_rows(), &["d1", "d2"]);
    }

    #[test]
    fn test_clear_selection_is_silent() {
        let (mut selection, _) = flat(multi());
        selection.select_index(0, true, false);
        selection.select_index(1, true, false);

        let changes = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        selection.selection_changed.connect(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });

        selection.clear_selection();
        assert!(selection.selected_nodes().is_empty());
        assert!(selection.selected_rows().is_empty());
        assert_eq!(changes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_refresh_is_deferred() {
        let (mut selection, _) = flat(multi());
        let queue = Arc::new(TaskQueue::new());
        selection.set_task_queue(queue.clone());

        let refreshed = Arc::new(AtomicUsize::new(0));
        let refreshed_clone = refreshed.clone();
        selection.refresh_requested.connect(move |_| {
            refreshed_clone.fetch_add(1, Ordering::SeqCst);
        });

        selection.select_index(0, true, true);
        assert_eq!(refreshed.load(Ordering::SeqCst), 0);

        queue.process_all();
        assert_eq!(refreshed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_group_tri_state() {
        let (mut selection, tree) = grouped(children_multi());
        let g = key(&tree, "g");

        assert_eq!(selection.is_node_selected(g), Some(false));

        selection.select_node(key(&tree, "c1"), true, false);
        selection.select_node(key(&tree, "c2"), true, false);
        assert_eq!(selection.is_node_selected(g), None);
        assert_eq!(selection.check_state(g), CheckState::PartiallyChecked);

        selection.select_node(key(&tree, "c3"), true, false);
        assert_eq!(selection.is_node_selected(g), Some(true));
        assert_eq!(selection.check_state(g), CheckState::Checked);
    }

    #[test]
    fn test_selecting_group_selects_children() {
        let (mut selection, tree) = grouped(children_multi());
        let g = key(&tree, "g");

        assert!(selection.select_node(g, true, false));
        assert_eq!(selection.selected_rows(), &["c1", "c2", "c3"]);
        assert_eq!(selection.is_node_selected(g), Some(true));

        assert!(selection.deselect_node(g));
        assert!(!selection.has_selection());
        assert_eq!(selection.is_node_selected(g), Some(false));
    }

    #[test]
    fn test_footer_selects_group() {
        let (mut selection, tree) = grouped(multi());
        let g = key(&tree, "g");
        let footer = key(&tree, "g-footer");

        assert!(selection.select_node(footer, true, false));
        assert_eq!(selection.selected_nodes(), vec![g]);
        assert_eq!(selection.is_node_selected(footer), Some(true));
    }

    #[test]
    fn test_best_cost_returns_leaves_in_children_mode() {
        let (mut selection, tree) = grouped(children_multi());
        for id in ["c1", "c2", "c3"] {
            selection.select_node(key(&tree, id), true, false);
        }

        let best = selection.best_cost_node_selection();
        assert_eq!(best, vec![key(&tree, "c1"), key(&tree, "c2"), key(&tree, "c3")]);
    }

    #[test]
    fn test_best_cost_stops_at_selected_group() {
        let (mut selection, tree) = grouped(multi());
        selection.select_node(key(&tree, "c1"), true, false);
        selection.select_node(key(&tree, "g"), true, false);
        selection.select_node(key(&tree, "x"), true, false);

        let best = selection.best_cost_node_selection();
        assert_eq!(best, vec![key(&tree, "g"), key(&tree, "x")]);
    }

    #[test]
    fn test_empty_group_does_not_flip_parent() {
        let mut tree = RowTree::new();
        let outer = tree.add_group(None, "outer", "outer", true).unwrap();
        tree.add_group(Some(outer), "empty", "empty", true).unwrap();
        let leaf = tree.add_leaf(Some(outer), "leaf", "leaf").unwrap();
        let empty = tree.find("empty").unwrap();

        let mut selection = SelectionController::<&str>::new(children_multi());
        selection.set_row_model(Arc::new(InMemoryRowModel::new(tree)));

        assert_eq!(selection.is_node_selected(empty), None);
        assert_eq!(selection.is_node_selected(outer), Some(false));

        selection.select_node(leaf, true, false);
        assert_eq!(selection.is_node_selected(outer), Some(true));
    }

    #[test]
    fn test_markers_follow_selection() {
        let (mut selection, _) = flat(multi());
        let renderer = Arc::new(RenderedRows::new());
        renderer.mount_window(0, 2, &selection);
        selection.set_row_renderer(renderer.clone());

        let marks = Arc::new(Mutex::new(Vec::new()));
        let marks_clone = marks.clone();
        selection.virtual_row_selected.connect(move |&(index, state)| {
            marks_clone.lock().push((index, state));
        });

        selection.select_index(1, true, false);
        selection.select_index(4, true, false);
        assert!(renderer.is_row_marked(1));
        assert!(!renderer.is_row_marked(4));
        assert_eq!(*marks.lock(), vec![(1, Some(true))]);

        selection.clear_selection();
        assert!(!renderer.is_row_marked(1));
    }

    #[test]
    fn test_group_rows_updated_in_window() {
        let (mut selection, tree) = grouped(children_multi());
        let renderer = Arc::new(RenderedRows::new());
        renderer.mount_window(0, 5, &selection);
        selection.set_row_renderer(renderer.clone());

        let group_states = Arc::new(Mutex::new(Vec::new()));
        let states_clone = group_states.clone();
        selection.virtual_row_selected.connect(move |&(index, state)| {
            if index == 0 {
                states_clone.lock().push(state);
            }
        });

        selection.select_node(key(&tree, "c1"), true, false);
        assert!(!renderer.is_row_marked(0));
        assert_eq!(group_states.lock().last(), Some(&None));

        selection.select_node(key(&tree, "c2"), true, false);
        selection.select_node(key(&tree, "c3"), true, false);
        assert!(renderer.is_row_marked(0));
        assert!(renderer.is_row_marked(4));
        assert_eq!(group_states.lock().last(), Some(&Some(true)));
    }

    fn children_single() -> SelectionOptions {
        SelectionOptions::new().with_group_selection(GroupSelection::Children)
    }

    #[test]
    fn test_children_single_select_leaves_exactly_group_leaves() {
        let (mut selection, tree) = grouped(children_single());
        selection.select_node(key(&tree, "x"), false, false);

        assert!(selection.select_node(key(&tree, "g"), false, false));
        assert_eq!(selection.selected_rows(), &["c1", "c2", "c3"]);
        assert_eq!(selection.is_node_selected(key(&tree, "x")), Some(false));
        assert_eq!(selection.is_node_selected(key(&tree, "g")), Some(true));
    }

    #[test]
    fn test_children_single_reselect_group_is_no_op() {
        let (mut selection, tree) = grouped(children_single());
        let g = key(&tree, "g");
        assert!(selection.select_node(g, false, false));

        let changes = Arc::new(AtomicUsize::new(0));
        let changes_clone = changes.clone();
        selection.selection_changed.connect(move |_| {
            changes_clone.fetch_add(1, Ordering::SeqCst);
        });
        let rows = Arc::new(AtomicUsize::new(0));
        let rows_clone = rows.clone();
        selection.row_selected.connect(move |_| {
            rows_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!selection.select_node(g, false, false));
        assert_eq!(selection.selected_count(), 3);
        assert_eq!(changes.load(Ordering::SeqCst), 0);
        assert_eq!(rows.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_children_single_completes_partial_group() {
        let (mut selection, tree) = grouped(children_single());
        selection.select_node(key(&tree, "c2"), false, false);

        assert!(selection.select_node(key(&tree, "g"), false, false));
        // c2 keeps its place; the missing leaves follow.
        assert_eq!(selection.selected_rows(), &["c2", "c1", "c3"]);
    }

    #[test]
    fn test_children_footer_selects_group_leaves() {
        let (mut selection, tree) = grouped(children_single());
        let footer = key(&tree, "g-footer");

        assert!(selection.select_node(footer, false, false));
        assert_eq!(selection.selected_rows(), &["c1", "c2", "c3"]);
        assert_eq!(selection.is_node_selected(footer), Some(true));

        assert!(selection.deselect_node(footer));
        assert!(!selection.has_selection());
    }

    #[test]
    fn test_large_group_replaced_by_single_row() {
        let mut tree = RowTree::new();
        let big = tree.add_group(None, "big", 0, false).unwrap();
        for i in 0..20_000u32 {
            tree.add_leaf(Some(big), format!("leaf{i}"), i + 1).unwrap();
        }
        let other = tree.add_leaf(None, "other", 0).unwrap();

        let mut selection = SelectionController::<u32>::new(children_single());
        selection.set_row_model(Arc::new(InMemoryRowModel::new(tree)));

        assert!(selection.select_node(big, false, true));
        assert_eq!(selection.selected_count(), 20_000);

        assert!(selection.select_node(other, false, true));
        assert_eq!(selection.selected_nodes(), vec![other]);
        assert_eq!(selection.selected_rows(), &[0]);
    }

    #[test]
    fn test_order_kept_through_interleaved_deselects() {
        let model = Arc::new(
            InMemoryRowModel::from_rows((0..100u32).map(|i| (format!("r{i}"), i))).unwrap(),
        );
        let mut selection = SelectionController::<u32>::new(multi());
        selection.set_row_model(model);

        for index in (0..100).rev() {
            selection.select_index(index, true, true);
        }
        for index in (0..100).step_by(2) {
            selection.deselect_index(index);
        }

        let expected: Vec<u32> = (0..100).rev().filter(|i| i % 2 == 1).collect();
        assert_eq!(selection.selected_rows(), expected.as_slice());
    }

    /// Presents top-level rows in reverse, as a sorted grid would.
    struct ReversedTopLevel(InMemoryRowModel<&'static str>);

    impl RowModel<&'static str> for ReversedTopLevel {
        fn top_level_nodes(&self) -> Vec<NodeKey> {
            let mut nodes = self.0.top_level_nodes();
            nodes.reverse();
            nodes
        }

        fn virtual_row(&self, index: usize) -> Option<NodeKey> {
            self.0.virtual_row(index)
        }

        fn virtual_row_count(&self) -> usize {
            self.0.virtual_row_count()
        }

        fn tree(&self) -> Arc<RowTree<&'static str>> {
            self.0.tree()
        }
    }

    #[test]
    fn test_best_cost_follows_model_top_level_order() {
        let inner = InMemoryRowModel::from_rows([("R1", "d1"), ("R2", "d2"), ("R3", "d3")]).unwrap();
        let model = Arc::new(ReversedTopLevel(inner));
        let r1 = model.0.virtual_row(0).unwrap();
        let r3 = model.0.virtual_row(2).unwrap();

        let mut selection = SelectionController::<&'static str>::new(multi());
        selection.set_row_model(model);
        selection.select_node(r1, true, false);
        selection.select_node(r3, true, false);

        assert_eq!(selection.best_cost_node_selection(), vec![r3, r1]);
    }
}
