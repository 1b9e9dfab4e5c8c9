//! Per-field query requests and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use iso_core::QueryHandle;

use crate::error::FetchError;

/// One top-level field's network request.
///
/// A logical query declared by a view may be split into several of these
/// by the decorator layer, one per top-level field; the response
/// aggregator reassembles them into one record per logical query.
#[derive(Debug, Clone)]
pub struct FieldRequest<Q: QueryHandle> {
    /// Stable request id (the query handle's id).
    pub id: String,
    /// Logical query name the field belongs to.
    pub logical_name: String,
    /// Top-level field name.
    pub field_name: String,
    /// Printed query text sent to the fetch function.
    pub query_text: String,
    /// The query handle this request was built from.
    pub query: Q,
}

impl<Q: QueryHandle> FieldRequest<Q> {
    /// Create a request for one field of a logical query.
    pub fn new(
        logical_name: impl Into<String>,
        field_name: impl Into<String>,
        query_text: impl Into<String>,
        query: Q,
    ) -> Self {
        Self {
            id: query.id(),
            logical_name: logical_name.into(),
            field_name: field_name.into(),
            query_text: query_text.into(),
            query,
        }
    }

    /// Variables bound to the underlying query.
    pub fn variables(&self) -> Value {
        self.query.variables()
    }
}

/// Wire form of one query dispatch: printed text plus variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPayload {
    /// Printed query text.
    pub query: String,
    /// Variables for the query.
    pub variables: Value,
}

/// GraphQL-style response envelope returned by a fetch function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Response payload, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Errors reported by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<Value>>,
}

impl ResponseEnvelope {
    /// An envelope carrying only data.
    pub fn data(data: Value) -> Self {
        Self {
            data: Some(data),
            errors: None,
        }
    }

    /// An envelope carrying a single error message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            data: None,
            errors: Some(vec![Value::String(message.into())]),
        }
    }

    /// The payload, unless the envelope reports a failure.
    ///
    /// An envelope with an `errors` field is a failure even when data is
    /// also present; an envelope with neither is a failure too.
    pub fn into_result(self) -> Result<Value, FetchError> {
        if let Some(errors) = self.errors {
            let rendered = serde_json::to_string(&errors).unwrap_or_default();
            return Err(FetchError::Server(rendered));
        }
        self.data.ok_or(FetchError::EmptyResponse)
    }
}
