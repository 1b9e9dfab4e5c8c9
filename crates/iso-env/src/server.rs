//! Server-side coordinator: force-fetch everything, collect results, and
//! re-render until query discovery stabilizes.

use std::sync::Arc;

use tracing::{debug, warn};

use iso_core::{
    FetchMode, FieldResult, QueryConfig, QueryEngine, QueryHandle, ReadyState, ServerData,
    ServerResult,
};
use iso_net::ServerNetworkLayer;

use crate::base::{Coordinator, Role};

/// Default number of render passes before giving up on discovering new
/// queries.
pub const MAX_RENDER_PASSES: usize = 10;

/// Coordinator owning one server request's isomorphic render.
///
/// Every query set reaching this environment is force-fetched: later
/// render passes would otherwise have their queries satisfied by the
/// engine's warm cache, bypassing the network layer and leaving no
/// recorded result to transport.
pub struct ServerEnvironment<E: QueryEngine> {
    coordinator: Coordinator<E>,
    network: Arc<ServerNetworkLayer>,
}

impl<E: QueryEngine> ServerEnvironment<E> {
    /// Create a server environment fetching through `network`.
    pub fn new(engine: Arc<E>, network: Arc<ServerNetworkLayer>) -> Self {
        Self {
            coordinator: Coordinator::new(engine, Role::Server, FetchMode::Force),
            network,
        }
    }

    /// The underlying coordinator.
    pub fn coordinator(&self) -> &Coordinator<E> {
        &self.coordinator
    }

    /// The network layer recording per-field results.
    pub fn network(&self) -> &Arc<ServerNetworkLayer> {
        &self.network
    }

    /// See [`Coordinator::run_or_get_ready_state`].
    pub fn run_or_get_ready_state(&self, config: &QueryConfig) -> Option<ReadyState> {
        self.coordinator.run_or_get_ready_state(config)
    }

    /// See [`Coordinator::all_pending`].
    pub async fn all_pending(&self) {
        self.coordinator.all_pending().await;
    }

    /// Render the tree until query discovery stabilizes or the pass budget
    /// runs out, then wait for every fetch to settle and return the final
    /// markup.
    ///
    /// Rendering with fresh data can reveal child views whose own queries
    /// were invisible on earlier passes, so the loop re-renders after each
    /// wave of fetches settles and stops once a pass discovers nothing
    /// new. Budget exhaustion is not an error; the markup so far is
    /// returned as a best effort.
    pub async fn render_until_stable<F>(&self, mut render: F, max_passes: usize) -> String
    where
        F: FnMut(&Self) -> String,
    {
        let max_passes = max_passes.max(1);
        let mut previous_count = None;
        let mut pass = 0;
        loop {
            pass += 1;
            let markup = render(self);
            let discovered = self.coordinator.tracked_len();
            debug!(pass, query_sets = discovered, "server render pass");

            if previous_count == Some(discovered) || pass >= max_passes {
                self.coordinator.all_pending().await;
                return markup;
            }
            previous_count = Some(discovered);
            self.coordinator.all_pending().await;
        }
    }

    /// Assemble the transport payload: every tracked query set whose every
    /// field has a recorded result, in discovery order.
    ///
    /// A set with any unrecorded field is dropped whole; partial results
    /// are never transported.
    pub fn client_payload(&self) -> ServerData {
        self.coordinator
            .query_sets()
            .iter()
            .filter_map(|query_set| {
                let mut result = ServerResult::new();
                for (field_name, query) in query_set.iter() {
                    match self.network.recorded(&query.id()) {
                        Some(data) => {
                            result.insert(
                                field_name.clone(),
                                FieldResult {
                                    query: query.to_descriptor(),
                                    data,
                                },
                            );
                        }
                        None => {
                            warn!(field = %field_name, "dropping query set without a recorded result");
                            return None;
                        }
                    }
                }
                if result.is_empty() {
                    None
                } else {
                    Some(result)
                }
            })
            .collect()
    }
}
