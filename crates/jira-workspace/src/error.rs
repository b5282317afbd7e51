//! Error types for workspace store operations.

use std::io;
use thiserror::Error;

/// The error type for workspace store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A workspace with this name already exists.
    #[error("Workspace '{0}' already exists")]
    DuplicateName(String),

    /// No workspace with this name exists.
    #[error("Workspace '{0}' not found")]
    NotFound(String),

    /// No workspace is active.
    #[error("No active workspace. Add one with add_workspace or switch with switch_workspace")]
    NoActiveWorkspace,

    /// The workspace still holds placeholder values.
    #[error(
        "Workspace '{0}' has incomplete credentials. Edit its file and replace the placeholder values"
    )]
    IncompleteCredentials(String),

    /// A profile field failed validation.
    #[error("Invalid {field}: {reason}")]
    InvalidProfile {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// IO error while reading or writing the store.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A profile file could not be parsed or written.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            field,
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for workspace store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
