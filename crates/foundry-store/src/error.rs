//! Error types for the Foundry build store.

use thiserror::Error;

/// Result type alias for build store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during build store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to build store: {0}")]
    Connect(String),

    #[error("schema bootstrap failed: {0}")]
    Schema(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("no event code registered for event type {0:?}")]
    UnknownEventType(String),

    #[error("build {0} does not exist")]
    BuildNotFound(i64),
}
