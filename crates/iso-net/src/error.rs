//! Error types for network dispatch.

/// Error type for fetch operations.
///
/// `Clone` so that shared response futures can hand the same failure to
/// every consumer of a field response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("server returned errors: {0}")]
    Server(String),

    #[error("response contained no data")]
    EmptyResponse,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("request aborted")]
    Aborted,
}
