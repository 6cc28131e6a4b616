//! Prelude module for Horizon Grid.
//!
//! ```ignore
//! use horizon_grid::prelude::*;
//! ```

pub use crate::config::{GroupSelection, RowSelection, SelectionOptions};
pub use crate::model::{InMemoryRowModel, NodeKey, RowModel, RowNode, RowTree};
pub use crate::render::{RenderedRows, RowRenderer};
pub use crate::selection::{CheckState, SelectionController};
pub use horizon_grid_core::{ConnectionId, Signal, TaskQueue};
