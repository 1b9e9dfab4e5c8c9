//! Client-side coordinator: replay server-fetched data into the local
//! store.

use std::sync::Arc;

use tracing::warn;

use iso_core::{FetchMode, QueryConfig, QueryEngine, QuerySet, ReadyState, ServerData};

use crate::base::{Coordinator, Role};

/// Coordinator owning one client session's isomorphic hydration.
///
/// Fetch issuance uses the engine's cache-aware path, so replayed data
/// settles query sets without touching the network.
pub struct ClientEnvironment<E: QueryEngine> {
    coordinator: Coordinator<E>,
}

impl<E: QueryEngine> ClientEnvironment<E> {
    /// Create a client environment over the engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self {
            coordinator: Coordinator::new(engine, Role::Client, FetchMode::Prime),
        }
    }

    /// The underlying coordinator.
    pub fn coordinator(&self) -> &Coordinator<E> {
        &self.coordinator
    }

    /// See [`Coordinator::run_or_get_ready_state`].
    pub fn run_or_get_ready_state(&self, config: &QueryConfig) -> Option<ReadyState> {
        self.coordinator.run_or_get_ready_state(config)
    }

    /// See [`Coordinator::all_pending`].
    pub async fn all_pending(&self) {
        self.coordinator.all_pending().await;
    }

    /// Replay a server payload.
    ///
    /// For each transported query set: reconstruct every field's handle
    /// from its descriptor, write the paired data into the engine store,
    /// then run the reconstructed set through the cache-aware path so a
    /// later [`run_or_get_ready_state`](Self::run_or_get_ready_state) for
    /// a structurally equal set settles without a network call.
    ///
    /// An entry that fails to inject is skipped with a warning; it never
    /// blocks the entries after it.
    pub async fn inject_server_data(&self, server_data: ServerData) {
        let engine = self.coordinator.engine().clone();
        for server_result in server_data {
            let mut query_set = QuerySet::new();
            let mut failed = false;
            for (field_name, field_result) in server_result {
                let query = match engine.query_from_descriptor(&field_result.query) {
                    Ok(query) => query,
                    Err(error) => {
                        warn!(field = %field_name, %error, "skipping server result entry");
                        failed = true;
                        break;
                    }
                };
                if let Err(error) = engine.write_store(&query, &field_result.data) {
                    warn!(field = %field_name, %error, "skipping server result entry");
                    failed = true;
                    break;
                }
                query_set.insert(field_name, query);
            }
            if failed || query_set.is_empty() {
                continue;
            }
            self.coordinator.run_query_set(query_set);
        }
        self.coordinator.all_pending().await;
    }
}
