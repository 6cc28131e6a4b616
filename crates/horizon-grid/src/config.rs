//! Selection options.
//!
//! Options are plain data and can be loaded from TOML:
//!
//! ```
//! use horizon_grid::config::{GroupSelection, RowSelection, SelectionOptions};
//!
//! let options = SelectionOptions::from_toml_str(r#"
//!     row-selection = "multiple"
//!     group-selection = "children"
//! "#).unwrap();
//!
//! assert_eq!(options.row_selection, RowSelection::Multiple);
//! assert!(options.is_group_select_children());
//! ```
//!
//! Callbacks are not part of the options; connect to the signals on
//! [`SelectionController`](crate::selection::SelectionController) instead.

use std::path::Path;

use horizon_grid_core::ConfigError;
use horizon_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

/// How many rows may be selected at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RowSelection {
    /// Selecting a row replaces the previous selection (default).
    #[default]
    Single,
    /// Rows may be added to the selection.
    Multiple,
}

/// What selecting a group row does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupSelection {
    /// The group row itself is selected (default).
    #[default]
    Group,
    /// The group's leaf rows are selected instead, and the group shows a
    /// tri-state derived from them.
    Children,
}

/// Configuration consumed by the selection controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SelectionOptions {
    /// Single or multiple row selection.
    pub row_selection: RowSelection,
    /// Group or children group selection.
    pub group_selection: GroupSelection,
}

impl SelectionOptions {
    /// Creates options with defaults (single selection, group mode).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the row selection mode.
    pub fn with_row_selection(mut self, row_selection: RowSelection) -> Self {
        self.row_selection = row_selection;
        self
    }

    /// Sets the group selection mode.
    pub fn with_group_selection(mut self, group_selection: GroupSelection) -> Self {
        self.group_selection = group_selection;
        self
    }

    /// Returns `true` if more than one row may be selected.
    pub fn is_row_selection_multi(&self) -> bool {
        self.row_selection == RowSelection::Multiple
    }

    /// Returns `true` if groups select their children rather than themselves.
    pub fn is_group_select_children(&self) -> bool {
        self.group_selection == GroupSelection::Children
    }

    /// Parses options from a TOML string. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads options from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let options = Self::from_toml_str(&content)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), ?options, "loaded selection options");
        Ok(options)
    }

    /// Serializes the options to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}
