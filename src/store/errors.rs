//! # Store Errors
//!
//! Error types for document persistence and store connections.

use thiserror::Error;

use super::provider::StoreName;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a connected document store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique index rejected the write
    #[error("Duplicate value for {fields} in {collection}")]
    DuplicateKey { collection: String, fields: String },

    /// The document could not be interpreted
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Snapshot persistence failed
    #[error("Snapshot I/O failed: {0}")]
    Io(String),

    /// The store was closed
    #[error("Store is disconnected")]
    Disconnected,
}

impl StoreError {
    /// Whether the caller sent data the store refused to accept
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::DuplicateKey { .. } | StoreError::InvalidDocument(_)
        )
    }
}

/// Errors raised while establishing a store connection
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// No configuration registered for the store
    #[error("No configuration for store '{0}'")]
    NotConfigured(StoreName),

    /// The URI scheme has no connector
    #[error("Unsupported store URI: {0}")]
    UnsupportedScheme(String),

    /// A single connection attempt failed
    #[error("Connection to {uri} failed: {reason}")]
    Unreachable { uri: String, reason: String },

    /// Connected, but the resource models could not be bound
    #[error("Failed to bind resource models: {0}")]
    Binding(#[from] StoreError),

    /// Every retry attempt failed
    #[error("Could not connect to store '{store}' after {attempts} attempts: {last}")]
    Exhausted {
        store: StoreName,
        attempts: u32,
        last: Box<ConnectError>,
    },
}
