//! Horizon Grid - row selection for virtualized, grouped data grids.
//!
//! The crate is organized around three collaborators:
//!
//! - [`model`]: the row tree and the flattened "virtual rows" a grid shows
//! - [`render`]: the window of rows currently mounted, and their markers
//! - [`selection`]: the controller that owns the selection and keeps the
//!   other two in sync
//!
//! Options live in [`config`]; signals, deferred tasks and errors come from
//! `horizon-grid-core` and are re-exported here.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_grid::prelude::*;
//!
//! let mut tree = RowTree::new();
//! let team = tree.add_group(None, "team", "Team A", true).unwrap();
//! tree.add_leaf(Some(team), "ann", "Ann").unwrap();
//! tree.add_leaf(Some(team), "bob", "Bob").unwrap();
//!
//! let options = SelectionOptions::new()
//!     .with_row_selection(RowSelection::Multiple)
//!     .with_group_selection(GroupSelection::Children);
//! let mut selection = SelectionController::<&str>::new(options);
//! selection.set_row_model(Arc::new(InMemoryRowModel::new(tree)));
//!
//! // Row 0 is the group; selecting it selects its members.
//! selection.select_index(0, true, false);
//! assert_eq!(selection.selected_rows(), &["Ann", "Bob"]);
//! ```

pub mod config;
pub mod model;
pub mod prelude;
pub mod render;
pub mod selection;

pub use horizon_grid_core::{
    ConfigError, ConnectionGuard, ConnectionId, GridError, Result, Signal, TaskId, TaskQueue,
};
