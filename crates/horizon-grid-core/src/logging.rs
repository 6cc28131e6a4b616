//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid::selection=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Deferred task queue target.
    pub const TASK: &str = "horizon_grid_core::task";
    /// Selection controller target.
    pub const SELECTION: &str = "horizon_grid::selection";
    /// Row model and row tree target.
    pub const MODEL: &str = "horizon_grid::model";
    /// Rendered row window target.
    pub const RENDER: &str = "horizon_grid::render";
    /// Configuration loading target.
    pub const CONFIG: &str = "horizon_grid::config";
}

/// Performance span guard.
///
/// Enters an `info` span on the `horizon_grid::perf` target for as long as
/// the guard lives. Used around tree traversals.
///
/// ```
/// use horizon_grid_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new("best_cost_node_selection");
///     // ... traversal ...
/// }
/// ```
pub struct PerfSpan {
    _span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            _span: span.entered(),
        }
    }
}
