//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Only structural failures are surfaced to callers. Per-file problems
/// (`ContentResolution`) and storage problems (`Persistence`) are logged by
/// the owner of the snapshot and never abort a whole import.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No records were supplied to the tree builder.
    #[error("Cannot build a tree from an empty file list")]
    EmptyInput,

    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The text of a single file could not be extracted.
    #[error("Failed to resolve content for {path}: {reason}")]
    ContentResolution { path: String, reason: String },

    /// The durable store is unavailable or holds unusable data.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    /// A projection or config could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents an error during the parsing or building of a glob pattern.
    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] globset::Error),
}

impl CoreError {
    /// Shorthand for a failed extraction of `path`.
    pub fn content(path: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::ContentResolution {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
