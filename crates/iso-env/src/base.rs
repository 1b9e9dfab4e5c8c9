//! Base coordinator for isomorphic query execution.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::debug;

use iso_core::{FetchMode, QueryConfig, QueryEngine, QuerySet, ReadyState};

use crate::query_set_map::QuerySetMap;

/// Which side of the isomorphic render a coordinator serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// One server request's render.
    Server,
    /// One long-lived client session.
    Client,
}

/// Tracking record for one issued query set.
///
/// The record is created Pending when the fetch is issued and settles
/// exactly once, on the engine's first terminal ready state.
pub struct PendingQuery {
    fetch: Option<BoxFuture<'static, ReadyState>>,
    ready_state: Option<ReadyState>,
}

impl PendingQuery {
    fn in_flight(fetch: BoxFuture<'static, ReadyState>) -> Self {
        Self {
            fetch: Some(fetch),
            ready_state: None,
        }
    }

    fn take_fetch(&mut self) -> Option<BoxFuture<'static, ReadyState>> {
        self.fetch.take()
    }

    fn settle(&mut self, ready_state: ReadyState) {
        // Written exactly once; later reports are ignored.
        if self.ready_state.is_none() {
            self.ready_state = Some(ready_state);
        }
    }

    /// Ready state once the fetch has settled.
    pub fn ready_state(&self) -> Option<&ReadyState> {
        self.ready_state.as_ref()
    }

    /// Whether the fetch has settled.
    pub fn is_settled(&self) -> bool {
        self.ready_state.is_some()
    }
}

type TrackingMap<Q> = QuerySetMap<Q, PendingQuery>;

/// Coordinates "run this query set or return its settled state" across a
/// render pass.
///
/// Each structurally distinct query set is issued at most once per
/// coordinator; a coordinator belongs to exactly one environment (one
/// server request, or one client session).
pub struct Coordinator<E: QueryEngine> {
    engine: Arc<E>,
    role: Role,
    fetch_mode: FetchMode,
    state: Mutex<TrackingMap<E::Query>>,
}

impl<E: QueryEngine> Coordinator<E> {
    pub(crate) fn new(engine: Arc<E>, role: Role, fetch_mode: FetchMode) -> Self {
        Self {
            engine,
            role,
            fetch_mode,
            state: Mutex::new(QuerySetMap::new()),
        }
    }

    /// The engine this coordinator fetches through.
    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Whether this coordinator serves a server render.
    pub fn is_server(&self) -> bool {
        self.role == Role::Server
    }

    /// Resolve the query set for `config`, returning its settled ready
    /// state or ensuring a fetch is underway.
    ///
    /// Returns `None` while a fetch is outstanding. An unseen set is
    /// issued only on the server side; on the client, unseen sets stay
    /// untracked so the view layer falls back to its normal fetch path.
    pub fn run_or_get_ready_state(&self, config: &QueryConfig) -> Option<ReadyState> {
        let query_set = self.engine.build_query_set(config);
        {
            let state = self.lock_state();
            if let Some(pending) = state.get(&query_set) {
                return pending.ready_state().cloned();
            }
        }

        if self.role == Role::Server {
            self.run_query_set(query_set);
        }
        None
    }

    /// Start fetching a query set and track its settlement.
    ///
    /// The stored fetch resolves on the engine's first terminal ready
    /// state. If the engine's stream ends without one, the record settles
    /// as aborted so nothing awaiting [`Coordinator::all_pending`] hangs.
    pub fn run_query_set(&self, query_set: QuerySet<E::Query>) {
        debug!(fields = query_set.len(), "issuing query set fetch");
        let mut updates = self.engine.fetch(&query_set, self.fetch_mode);
        let fetch = Box::pin(async move {
            while let Some(ready_state) = updates.next().await {
                if ready_state.is_terminal() {
                    return ready_state;
                }
            }
            ReadyState::aborted()
        });
        self.lock_state().set(query_set, PendingQuery::in_flight(fetch));
    }

    /// Drive every fetch issued so far to settlement.
    ///
    /// Resolves once each query set tracked at the time of the call has a
    /// recorded ready state. Fetch failures settle their own record and
    /// never fail a sibling's.
    pub async fn all_pending(&self) {
        let in_flight: Vec<(usize, BoxFuture<'static, ReadyState>)> = {
            let mut state = self.lock_state();
            (0..state.len())
                .filter_map(|index| {
                    state
                        .value_at_mut(index)
                        .and_then(PendingQuery::take_fetch)
                        .map(|fetch| (index, fetch))
                })
                .collect()
        };
        if in_flight.is_empty() {
            return;
        }

        let mut settling: FuturesUnordered<_> = in_flight
            .into_iter()
            .map(|(index, fetch)| async move { (index, fetch.await) })
            .collect();
        while let Some((index, ready_state)) = settling.next().await {
            if let Some(pending) = self.lock_state().value_at_mut(index) {
                pending.settle(ready_state);
            }
        }
    }

    /// Number of structurally distinct query sets tracked so far.
    pub fn tracked_len(&self) -> usize {
        self.lock_state().len()
    }

    /// Settled ready states in discovery order; `None` marks a fetch still
    /// in flight.
    pub fn ready_states(&self) -> Vec<Option<ReadyState>> {
        self.lock_state()
            .values()
            .iter()
            .map(|pending| pending.ready_state().cloned())
            .collect()
    }

    /// Snapshot of tracked query sets in discovery order.
    pub fn query_sets(&self) -> Vec<QuerySet<E::Query>> {
        self.lock_state().keys().to_vec()
    }

    fn lock_state(&self) -> MutexGuard<'_, TrackingMap<E::Query>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_network_layer, TestEngine};
    use serde_json::json;

    #[tokio::test]
    async fn test_server_issues_unseen_sets_once() {
        let engine = TestEngine::new();
        engine.register_view("Profile", &["user"]);
        let (network, calls) =
            test_network_layer(|_| Ok(json!({"user": {"username": "myusername"}})));
        engine.attach_network(network);

        let coordinator = Coordinator::new(engine.clone(), Role::Server, FetchMode::Force);
        let config = QueryConfig::new("Profile").with_param("userId", "user1");

        assert_eq!(coordinator.run_or_get_ready_state(&config), None);
        assert_eq!(coordinator.tracked_len(), 1);

        // A structurally equal set is not issued again.
        assert_eq!(coordinator.run_or_get_ready_state(&config), None);
        assert_eq!(coordinator.tracked_len(), 1);
        assert_eq!(engine.force_fetches(), 1);

        coordinator.all_pending().await;
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

        let ready = coordinator
            .run_or_get_ready_state(&config)
            .expect("settled state");
        assert!(ready.done);
        assert!(ready.ready);
        assert_eq!(ready.error, None);
        assert!(!ready.aborted);
        // Reading a settled state issues nothing new.
        assert_eq!(engine.force_fetches(), 1);
    }

    #[tokio::test]
    async fn test_client_does_not_issue_unseen_sets() {
        let engine = TestEngine::new();
        engine.register_view("Profile", &["user"]);

        let coordinator = Coordinator::new(engine.clone(), Role::Client, FetchMode::Prime);
        let config = QueryConfig::new("Profile").with_param("userId", "user1");

        assert_eq!(coordinator.run_or_get_ready_state(&config), None);
        assert_eq!(coordinator.tracked_len(), 0);
        assert_eq!(engine.prime_fetches(), 0);
    }

    #[tokio::test]
    async fn test_failure_settles_without_failing_siblings() {
        let engine = TestEngine::new();
        engine.register_view("Profile", &["user"]);
        engine.register_view("Feed", &["feed"]);
        let (network, _calls) = test_network_layer(|payload| {
            if payload.query.contains("user") {
                Err("ERROR".to_string())
            } else {
                Ok(json!({"feed": []}))
            }
        });
        engine.attach_network(network);

        let coordinator = Coordinator::new(engine.clone(), Role::Server, FetchMode::Force);
        coordinator.run_or_get_ready_state(&QueryConfig::new("Profile"));
        coordinator.run_or_get_ready_state(&QueryConfig::new("Feed"));
        coordinator.all_pending().await;

        let states = coordinator.ready_states();
        assert_eq!(states.len(), 2);
        let profile = states[0].as_ref().expect("settled");
        let feed = states[1].as_ref().expect("settled");
        assert!(profile.error.is_some());
        assert!(!profile.done);
        assert!(feed.is_success());
    }

    #[tokio::test]
    async fn test_stream_ending_without_terminal_state_settles_as_aborted() {
        let engine = TestEngine::new();
        engine.register_view("Profile", &["user"]);

        // Prime mode with a cold store yields an empty update stream.
        let coordinator = Coordinator::new(engine.clone(), Role::Client, FetchMode::Prime);
        let query_set = engine.build_query_set(&QueryConfig::new("Profile"));
        coordinator.run_query_set(query_set);
        coordinator.all_pending().await;

        let states = coordinator.ready_states();
        let state = states[0].as_ref().expect("settled");
        assert!(state.aborted);
        assert!(state.is_terminal());
    }

    #[tokio::test]
    async fn test_all_pending_with_nothing_tracked_returns_immediately() {
        let engine = TestEngine::new();
        let coordinator: Coordinator<TestEngine> =
            Coordinator::new(engine, Role::Server, FetchMode::Force);
        coordinator.all_pending().await;
        assert_eq!(coordinator.tracked_len(), 0);
    }
}
