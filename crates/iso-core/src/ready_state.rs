//! Engine-reported fetch status.

use crate::error::EngineError;

/// Status of a query-set fetch as reported by the query engine.
///
/// A fetch is settled once the state is terminal: the engine reported
/// `done`, an error, or an abort. Non-terminal states may be reported any
/// number of times while the fetch is in flight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadyState {
    /// Whether the fetch completed successfully.
    pub done: bool,
    /// Whether enough data is present to render.
    pub ready: bool,
    /// Whether the available data is stale.
    pub stale: bool,
    /// Whether the fetch was aborted.
    pub aborted: bool,
    /// Error reported by the engine, if any.
    pub error: Option<EngineError>,
}

impl ReadyState {
    /// An in-flight state with nothing settled yet.
    pub fn pending() -> Self {
        Self::default()
    }

    /// A successful, fully-fetched state.
    pub fn done() -> Self {
        Self {
            done: true,
            ready: true,
            ..Self::default()
        }
    }

    /// An aborted state. Aborts settle a fetch but are not errors.
    pub fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }

    /// A failed state carrying the engine's error.
    pub fn failed(error: EngineError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Whether this state settles the fetch.
    pub fn is_terminal(&self) -> bool {
        self.done || self.aborted || self.error.is_some()
    }

    /// Whether the fetch settled successfully.
    pub fn is_success(&self) -> bool {
        self.done && self.error.is_none() && !self.aborted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_is_not_terminal() {
        assert!(!ReadyState::pending().is_terminal());
    }

    #[test]
    fn test_done_is_terminal_and_success() {
        let state = ReadyState::done();
        assert!(state.is_terminal());
        assert!(state.is_success());
        assert!(state.ready);
    }

    #[test]
    fn test_abort_is_terminal_but_not_success() {
        let state = ReadyState::aborted();
        assert!(state.is_terminal());
        assert!(!state.is_success());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_error_is_terminal_but_not_success() {
        let state = ReadyState::failed(EngineError::Fetch("boom".into()));
        assert!(state.is_terminal());
        assert!(!state.is_success());
    }
}
