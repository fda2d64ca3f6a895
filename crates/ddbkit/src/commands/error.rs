//! Error types for CLI commands.

use ddbkit_core::StoreError;
use thiserror::Error;

/// Result type alias for commands.
pub type Result<T> = std::result::Result<T, CommandError>;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Unknown attribute type '{0}', expected S, N or B")]
    UnknownAttributeType(String),

    #[error("Table {table} has a sort key ({name}), pass --sk")]
    MissingSortKey { table: String, name: String },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
