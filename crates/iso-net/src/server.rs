//! Result-recording network layer for server renders.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{join_all, BoxFuture};
use serde_json::Value;
use tracing::{debug, warn};

use iso_core::QueryHandle;

use crate::error::FetchError;
use crate::request::{FieldRequest, QueryPayload, ResponseEnvelope};

/// Function that executes one query against the GraphQL backend.
pub type FetchQueryFn =
    Arc<dyn Fn(QueryPayload) -> BoxFuture<'static, Result<ResponseEnvelope, FetchError>> + Send + Sync>;

/// Network layer that runs queries through a caller-supplied fetch
/// function and records every successful field result by request id.
///
/// The recorded results are what the server coordinator pairs with query
/// handles when assembling the client payload; a field with no recorded
/// result is treated as failed there.
pub struct ServerNetworkLayer {
    fetch_query: FetchQueryFn,
    results: Mutex<HashMap<String, Value>>,
}

impl ServerNetworkLayer {
    /// Create a network layer dispatching through `fetch_query`.
    pub fn new(fetch_query: FetchQueryFn) -> Self {
        Self {
            fetch_query,
            results: Mutex::new(HashMap::new()),
        }
    }

    /// Dispatch a batch of field requests concurrently.
    ///
    /// Individual failures do not fail the batch; they simply leave no
    /// recorded result for that field.
    pub async fn send_queries<Q: QueryHandle>(
        &self,
        requests: &[FieldRequest<Q>],
    ) -> Vec<Result<Value, FetchError>> {
        join_all(requests.iter().map(|request| self.send_query(request))).await
    }

    /// Dispatch a single field request, recording its result on success.
    pub async fn send_query<Q: QueryHandle>(
        &self,
        request: &FieldRequest<Q>,
    ) -> Result<Value, FetchError> {
        debug!(id = %request.id, field = %request.field_name, "sending field request");
        let payload = QueryPayload {
            query: request.query_text.clone(),
            variables: request.variables(),
        };
        let envelope = (self.fetch_query)(payload).await?;
        match envelope.into_result() {
            Ok(data) => {
                self.lock_results().insert(request.id.clone(), data.clone());
                Ok(data)
            }
            Err(error) => {
                warn!(id = %request.id, %error, "field request failed");
                Err(error)
            }
        }
    }

    /// Recorded result for a request id, if the fetch completed.
    pub fn recorded(&self, id: &str) -> Option<Value> {
        self.lock_results().get(id).cloned()
    }

    /// Number of recorded results.
    pub fn recorded_len(&self) -> usize {
        self.lock_results().len()
    }

    fn lock_results(&self) -> MutexGuard<'_, HashMap<String, Value>> {
        self.results.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
