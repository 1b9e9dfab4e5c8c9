//! Boundary to the external query engine.

use futures::stream::BoxStream;
use serde_json::Value;

use crate::error::EngineError;
use crate::query::{QueryConfig, QueryHandle, QuerySet};
use crate::ready_state::ReadyState;

/// How a fetch should interact with the engine's own cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Cache-aware fetch; locally warmed data may satisfy the query.
    Prime,
    /// Bypass warm caches so every query reaches the fetch function.
    Force,
}

/// Interface the coordinators require from the external query engine.
///
/// The engine is a black box: it owns query construction, its store, and
/// the actual dispatch of field requests. Adapters implement this trait
/// over a concrete engine.
pub trait QueryEngine: Send + Sync + 'static {
    /// Engine-specific query handle type.
    type Query: QueryHandle;

    /// Resolve a query configuration into the concrete query set for it.
    fn build_query_set(&self, config: &QueryConfig) -> QuerySet<Self::Query>;

    /// Start fetching a query set, reporting ready-state changes as a
    /// stream. The fetch is settled by the first terminal state; anything
    /// emitted afterwards is ignored.
    fn fetch(
        &self,
        query_set: &QuerySet<Self::Query>,
        mode: FetchMode,
    ) -> BoxStream<'static, ReadyState>;

    /// Write a raw response payload for one query into the engine's store.
    fn write_store(&self, query: &Self::Query, data: &Value) -> Result<(), EngineError>;

    /// Reconstruct a query handle from its transport descriptor.
    fn query_from_descriptor(&self, descriptor: &Value) -> Result<Self::Query, EngineError>;
}
