//! Grouping raw field responses into one record per logical query.
//!
//! The decorator layer dispatches one network request per top-level field,
//! so a single logical query surfaces as several independent responses.
//! Consumers such as a persistence cache want one coherent record per
//! logical query; this module buffers registrations made in one
//! synchronous pass and emits combined records at the next flush.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use futures::future::{try_join_all, BoxFuture, Shared};
use serde_json::{Map, Value};
use tracing::debug;

use iso_core::{FieldResult, QueryHandle, ServerResult};

use crate::error::FetchError;
use crate::request::FieldRequest;

/// Shared handle to a field response still being fetched.
pub type SharedResponse = Shared<BoxFuture<'static, Result<Value, FetchError>>>;

/// Callback receiving one aggregated record per logical query, with the
/// variables merged across all of its fields.
pub type QuerySubscriber = Box<dyn Fn(&str, &Value, ServerResult) + Send + Sync>;

struct PendingField<Q: QueryHandle> {
    request: FieldRequest<Q>,
    response: SharedResponse,
}

/// Buffers per-field responses and flushes them grouped by logical query
/// name.
///
/// Registrations made between two flushes form one tick; the buffer is
/// empty again once a flush returns, so a later tick never sees an
/// earlier tick's fields.
pub struct ResponseAggregator<Q: QueryHandle> {
    subscriber: QuerySubscriber,
    pending: Mutex<BTreeMap<String, BTreeMap<String, PendingField<Q>>>>,
}

impl<Q: QueryHandle> ResponseAggregator<Q> {
    /// Create an aggregator emitting records to `subscriber`.
    pub fn new(subscriber: impl Fn(&str, &Value, ServerResult) + Send + Sync + 'static) -> Self {
        Self {
            subscriber: Box::new(subscriber),
            pending: Mutex::new(BTreeMap::new()),
        }
    }

    /// Register one field request and its response future.
    ///
    /// A later registration for the same logical name and field replaces
    /// the earlier one within the current tick.
    pub fn register(&self, request: FieldRequest<Q>, response: SharedResponse) {
        self.lock_pending()
            .entry(request.logical_name.clone())
            .or_default()
            .insert(request.field_name.clone(), PendingField { request, response });
    }

    /// Await every buffered field response and emit one combined record
    /// per logical query.
    ///
    /// A group with any failed field emits nothing for this tick; other
    /// groups are unaffected. The buffer is empty when this returns.
    pub async fn flush(&self) {
        let drained = std::mem::take(&mut *self.lock_pending());
        for (logical_name, fields) in drained {
            let responses =
                try_join_all(fields.values().map(|field| field.response.clone())).await;
            match responses {
                Ok(data) => {
                    let mut variables = Map::new();
                    let mut record = ServerResult::new();
                    for ((field_name, field), data) in fields.into_iter().zip(data) {
                        if let Value::Object(bound) = field.request.variables() {
                            variables.extend(bound);
                        }
                        record.insert(
                            field_name,
                            FieldResult {
                                query: field.request.query.to_descriptor(),
                                data,
                            },
                        );
                    }
                    (self.subscriber)(&logical_name, &Value::Object(variables), record);
                }
                Err(error) => {
                    debug!(query = %logical_name, %error, "dropping aggregation group");
                }
            }
        }
    }

    /// Number of logical queries buffered for the current tick.
    pub fn pending_len(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(
        &self,
    ) -> MutexGuard<'_, BTreeMap<String, BTreeMap<String, PendingField<Q>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
