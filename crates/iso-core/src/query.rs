//! Query handles, query sets and query configuration.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Capability interface implemented over the external engine's query
/// objects.
///
/// Coordinators program against this trait only; engine-specific adapters
/// implement it for their own query representation.
pub trait QueryHandle: fmt::Debug + Clone + Send + Sync + 'static {
    /// Semantic equality as defined by the engine.
    fn equals(&self, other: &Self) -> bool;

    /// Stable identity of the underlying field request.
    fn id(&self) -> String;

    /// Variables bound to this query.
    fn variables(&self) -> Value;

    /// Serializable descriptor suitable for transport. The engine
    /// reconstructs a handle from it via
    /// [`QueryEngine::query_from_descriptor`](crate::QueryEngine::query_from_descriptor).
    fn to_descriptor(&self) -> Value;
}

/// A named collection of query handles that together satisfy one view's
/// data needs.
///
/// Query sets are built once and never mutated afterwards; identity is
/// structural, not referential.
#[derive(Debug, Clone)]
pub struct QuerySet<Q: QueryHandle> {
    fields: BTreeMap<String, Q>,
}

impl<Q: QueryHandle> QuerySet<Q> {
    /// Create an empty query set.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a query under a logical field name.
    pub fn insert(&mut self, name: impl Into<String>, query: Q) {
        self.fields.insert(name.into(), query);
    }

    /// Get the query for a field name.
    pub fn get(&self, name: &str) -> Option<&Q> {
        self.fields.get(name)
    }

    /// Number of fields in the set.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over field names and their queries.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Q)> {
        self.fields.iter()
    }

    /// Iterate over field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Structural equality: same field names, and for every name the other
    /// set's query reports equal under the engine's own predicate. Key
    /// order is irrelevant.
    pub fn structurally_equals(&self, other: &Self) -> bool {
        if self.fields.len() != other.fields.len() {
            return false;
        }
        self.fields
            .iter()
            .all(|(name, query)| other.fields.get(name).is_some_and(|o| o.equals(query)))
    }
}

impl<Q: QueryHandle> Default for QuerySet<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: QueryHandle> FromIterator<(String, Q)> for QuerySet<Q> {
    fn from_iter<I: IntoIterator<Item = (String, Q)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Declarative description of a view's data needs, resolved by the engine
/// into a concrete [`QuerySet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Logical query name, typically the view name.
    pub name: String,
    /// Parameter values keyed by parameter name.
    pub params: serde_json::Map<String, Value>,
}

impl QueryConfig {
    /// Create a configuration with no parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: serde_json::Map::new(),
        }
    }

    /// Add a parameter value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}
