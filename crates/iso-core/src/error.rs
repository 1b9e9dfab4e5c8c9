//! Error types for the engine boundary.

/// Error type for query engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("query fetch failed: {0}")]
    Fetch(String),

    #[error("malformed query descriptor: {0}")]
    Descriptor(String),

    #[error("store write failed: {0}")]
    Store(String),

    #[error("malformed query document: {0}")]
    Document(String),
}
