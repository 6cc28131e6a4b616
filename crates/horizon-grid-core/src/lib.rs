//! Core systems for Horizon Grid.
//!
//! This crate provides the building blocks the grid's selection subsystem is
//! wired with:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Task Queue**: Work deferred to the end of the current event turn
//! - **Errors**: Error types for row-tree construction and configuration
//! - **Logging**: `tracing` targets and performance spans
//!
//! # Example
//!
//! ```
//! use horizon_grid_core::{Signal, TaskQueue};
//!
//! let queue = TaskQueue::new();
//! let refreshed = Signal::<()>::new();
//! refreshed.connect(|_| println!("refresh"));
//!
//! // Nothing runs until the host drains the queue.
//! refreshed.emit_queued((), &queue);
//! queue.process_all();
//! ```

mod error;
pub mod logging;
pub mod signal;
mod task;

pub use error::{ConfigError, GridError, Result};
pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use task::{TaskId, TaskQueue};
