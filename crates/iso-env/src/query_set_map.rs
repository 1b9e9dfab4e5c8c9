//! Associative container keyed by structural query-set equality.

use iso_core::{QueryHandle, QuerySet};

/// Map from query sets to values, where key equality is structural: two
/// keys match when they hold the same field names and pairwise-equal query
/// handles, regardless of identity or insertion order.
///
/// Lookup is a linear scan. The number of distinct query sets per view
/// tree is bounded by its component count, and handle equality is
/// semantic, so there is nothing stable to hash on.
pub struct QuerySetMap<Q: QueryHandle, V> {
    keys: Vec<QuerySet<Q>>,
    values: Vec<V>,
}

impl<Q: QueryHandle, V> QuerySetMap<Q, V> {
    /// Create an empty map.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Store a value under the query set, overwriting in place when a
    /// structurally equal key already exists.
    pub fn set(&mut self, key: QuerySet<Q>, value: V) {
        match self.index_of(&key) {
            Some(index) => self.values[index] = value,
            None => {
                self.keys.push(key);
                self.values.push(value);
            }
        }
    }

    /// Get the value stored under a structurally equal key.
    pub fn get(&self, key: &QuerySet<Q>) -> Option<&V> {
        self.index_of(key).map(|index| &self.values[index])
    }

    /// Mutable access to the value stored under a structurally equal key.
    pub fn get_mut(&mut self, key: &QuerySet<Q>) -> Option<&mut V> {
        self.index_of(key).map(|index| &mut self.values[index])
    }

    /// Position of a structurally equal key, if present.
    pub fn index_of(&self, key: &QuerySet<Q>) -> Option<usize> {
        self.keys
            .iter()
            .position(|existing| existing.structurally_equals(key))
    }

    /// Value at a slot index, in insertion order.
    pub fn value_at(&self, index: usize) -> Option<&V> {
        self.values.get(index)
    }

    /// Mutable value at a slot index, in insertion order.
    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut V> {
        self.values.get_mut(index)
    }

    /// Tracked keys in insertion order.
    pub fn keys(&self) -> &[QuerySet<Q>] {
        &self.keys
    }

    /// Stored values in insertion order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<Q: QueryHandle, V> Default for QuerySetMap<Q, V> {
    fn default() -> Self {
        Self::new()
    }
}
