//! Error types for Horizon Grid.
//!
//! Selection itself never fails; missing rows and redundant operations are
//! no-ops. Errors only arise while building row trees and loading
//! configuration.

use std::path::PathBuf;

/// The main error type for Horizon Grid operations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// A node with this id already exists in the tree.
    #[error("Duplicate node id '{0}'")]
    DuplicateNodeId(String),

    /// The referenced node does not exist in the tree.
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Children and footers can only be attached to group nodes.
    #[error("Node '{0}' is not a group")]
    NotAGroup(String),

    /// A group can have at most one footer.
    #[error("Group '{0}' already has a footer")]
    FooterAlreadyPresent(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised while loading selection options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text is not valid TOML or has unknown values.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be read.
    #[error("Could not read '{}': {source}", path.display())]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// A specialized Result type for Horizon Grid operations.
pub type Result<T> = std::result::Result<T, GridError>;
