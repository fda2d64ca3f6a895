use thiserror::Error;

use crate::codec::CodecError;

/// Errors that can occur during store and table operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Table not found: {0}")]
    TableNotFound(String),
    #[error("Table already exists: {0}")]
    TableAlreadyExists(String),
    #[error("Item not found in {table}: {key}")]
    ItemNotFound { table: String, key: String },
    #[error("Item already exists in {table}: {key}")]
    ItemAlreadyExists { table: String, key: String },
    #[error("Table {table} did not become active after {attempts} attempts")]
    TableActivationTimeout { table: String, attempts: u32 },
    #[error("Throttled: {0}")]
    Throttled(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid update: {0}")]
    InvalidUpdate(String),
}

impl From<CodecError> for StoreError {
    fn from(err: CodecError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
