//! Row data for the grid.
//!
//! - `RowNode`: a logical row (leaf, group or group footer)
//! - `RowTree`: arena owning every node, addressed by `NodeKey`
//! - `RowModel`: the trait the selection controller reads rows through
//! - `InMemoryRowModel`: a `RowModel` over a `RowTree`, with expand/collapse
//!
//! ```text
//! RowTree ──flatten──> virtual rows [0, 1, 2, ...] ──> RowRenderer window
//!    │                                                     │
//!    └──────────── SelectionController <───────────────────┘
//! ```

mod node;
mod row_model;
mod tree;

pub use node::{NodeKey, RowNode};
pub use row_model::{InMemoryRowModel, RowModel};
pub use tree::RowTree;
