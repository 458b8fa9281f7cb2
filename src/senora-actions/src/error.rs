//! Error types for action loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a single action definition.
///
/// None of these abort a registry load; the offending action is skipped.
#[derive(Error, Debug)]
pub enum ActionError {
    /// The template file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template file is not valid JSON.
    #[error("Invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The JSON is well-formed but is not a usable modal.
    #[error("Invalid template {path}: {reason}")]
    InvalidTemplate { path: PathBuf, reason: String },

    /// The action directory has no template file.
    #[error("No template found at {0}")]
    MissingTemplate(PathBuf),
}

/// Result type for action loading.
pub type ActionResult<T> = std::result::Result<T, ActionError>;
