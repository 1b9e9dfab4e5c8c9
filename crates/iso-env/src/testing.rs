//! Engine test doubles for exercising coordinators without a real query
//! engine.
//!
//! `TestEngine` resolves registered view names into one query per field,
//! force-fetches through an attached [`ServerNetworkLayer`], and serves
//! prime fetches from its own store, so the full server render → payload →
//! client injection path can run in-process.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use iso_core::{
    EngineError, FetchMode, QueryConfig, QueryEngine, QueryHandle, QuerySet, ReadyState,
};
use iso_net::{FetchError, FieldRequest, QueryPayload, ResponseEnvelope, ServerNetworkLayer};

/// Query handle used by [`TestEngine`]: one top-level field of a view,
/// with the view's parameters as variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestQuery {
    /// View (logical query) name.
    pub view: String,
    /// Top-level field name.
    pub field: String,
    /// Bound variables.
    pub variables: Value,
}

impl QueryHandle for TestQuery {
    fn equals(&self, other: &Self) -> bool {
        self == other
    }

    fn id(&self) -> String {
        format!("{}.{}|{}", self.view, self.field, self.variables)
    }

    fn variables(&self) -> Value {
        self.variables.clone()
    }

    fn to_descriptor(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// In-process engine fake with a field registry, a store, and fetch
/// counters per mode.
pub struct TestEngine {
    views: Mutex<BTreeMap<String, Vec<String>>>,
    store: Mutex<HashMap<String, Value>>,
    network: Mutex<Option<Arc<ServerNetworkLayer>>>,
    force: AtomicUsize,
    prime: AtomicUsize,
}

impl TestEngine {
    /// Create an engine with no registered views.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            views: Mutex::new(BTreeMap::new()),
            store: Mutex::new(HashMap::new()),
            network: Mutex::new(None),
            force: AtomicUsize::new(0),
            prime: AtomicUsize::new(0),
        })
    }

    /// Declare the top-level fields a view name resolves to.
    pub fn register_view(&self, name: &str, fields: &[&str]) {
        lock(&self.views).insert(
            name.to_string(),
            fields.iter().map(|field| (*field).to_string()).collect(),
        );
    }

    /// Attach the network layer force fetches dispatch through.
    pub fn attach_network(&self, network: Arc<ServerNetworkLayer>) {
        *lock(&self.network) = Some(network);
    }

    /// Number of force-mode fetches issued.
    pub fn force_fetches(&self) -> usize {
        self.force.load(Ordering::SeqCst)
    }

    /// Number of prime-mode fetches issued.
    pub fn prime_fetches(&self) -> usize {
        self.prime.load(Ordering::SeqCst)
    }

    /// Number of entries written to the store.
    pub fn store_len(&self) -> usize {
        lock(&self.store).len()
    }
}

impl QueryEngine for TestEngine {
    type Query = TestQuery;

    fn build_query_set(&self, config: &QueryConfig) -> QuerySet<TestQuery> {
        let views = lock(&self.views);
        let fields = views.get(&config.name).cloned().unwrap_or_default();
        fields
            .into_iter()
            .map(|field| {
                let query = TestQuery {
                    view: config.name.clone(),
                    field: field.clone(),
                    variables: Value::Object(config.params.clone()),
                };
                (field, query)
            })
            .collect()
    }

    fn fetch(
        &self,
        query_set: &QuerySet<TestQuery>,
        mode: FetchMode,
    ) -> BoxStream<'static, ReadyState> {
        match mode {
            FetchMode::Force => {
                self.force.fetch_add(1, Ordering::SeqCst);
                let Some(network) = lock(&self.network).clone() else {
                    return stream::once(async {
                        ReadyState::failed(EngineError::Fetch(
                            "no network layer attached".to_string(),
                        ))
                    })
                    .boxed();
                };
                let requests: Vec<FieldRequest<TestQuery>> = query_set
                    .iter()
                    .map(|(field, query)| {
                        FieldRequest::new(
                            query.view.clone(),
                            field.clone(),
                            format!("query {{ {} }}", query.field),
                            query.clone(),
                        )
                    })
                    .collect();
                stream::once(async move {
                    let results = network.send_queries(&requests).await;
                    match results.into_iter().find_map(Result::err) {
                        Some(error) => ReadyState::failed(EngineError::Fetch(error.to_string())),
                        None => ReadyState::done(),
                    }
                })
                .boxed()
            }
            FetchMode::Prime => {
                self.prime.fetch_add(1, Ordering::SeqCst);
                let store = lock(&self.store);
                let warm = query_set.iter().all(|(_, query)| store.contains_key(&query.id()));
                drop(store);
                if warm {
                    stream::once(async { ReadyState::done() }).boxed()
                } else {
                    // Nothing to satisfy the set locally; the stream ends
                    // without a terminal state.
                    stream::empty().boxed()
                }
            }
        }
    }

    fn write_store(&self, query: &TestQuery, data: &Value) -> Result<(), EngineError> {
        lock(&self.store).insert(query.id(), data.clone());
        Ok(())
    }

    fn query_from_descriptor(&self, descriptor: &Value) -> Result<TestQuery, EngineError> {
        serde_json::from_value(descriptor.clone())
            .map_err(|error| EngineError::Descriptor(error.to_string()))
    }
}

/// Build a [`ServerNetworkLayer`] whose fetch function answers from
/// `respond` and counts calls.
pub fn test_network_layer<F>(
    respond: F,
) -> (Arc<ServerNetworkLayer>, Arc<AtomicUsize>)
where
    F: Fn(&QueryPayload) -> Result<Value, String> + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let layer = ServerNetworkLayer::new(Arc::new(move |payload: QueryPayload| {
        counted.fetch_add(1, Ordering::SeqCst);
        let envelope = match respond(&payload) {
            Ok(data) => ResponseEnvelope::data(data),
            Err(message) => ResponseEnvelope::error(message),
        };
        async move { Ok::<_, FetchError>(envelope) }.boxed()
    }));
    (Arc::new(layer), calls)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
