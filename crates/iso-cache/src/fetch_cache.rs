//! TTL tracking for query re-fetches.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use iso_core::QueryConfig;

use crate::clock::{Clock, SystemClock};
use crate::key::QueryKey;

/// Hard ceiling on any re-fetch TTL.
pub const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Error raised for invalid cache configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("ttl {0:?} is longer than 24 hours - use a shorter TTL")]
    TtlTooLong(Duration),
}

/// Tracks when each logical query last completed successfully and decides
/// whether a mounted view should force a fresh fetch, independent of the
/// engine's own store.
///
/// One instance is owned by the provider-level environment context and
/// persists across navigations within a client session. Entries older than
/// [`MAX_TTL`] are purged on every write, so memory stays bounded without a
/// sweeper task.
pub struct QueryFetchCache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<QueryKey, Instant>>,
}

impl QueryFetchCache {
    /// Create a cache reading the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create a cache reading time from the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Record a successful completion for the query, then garbage-collect
    /// entries older than the hard ceiling.
    pub fn on_query_success(&self, config: &QueryConfig) {
        let now = self.clock.now();
        let mut entries = self.lock_entries();
        entries.insert(QueryKey::for_config(config), now);
        entries.retain(|_, recorded| now.duration_since(*recorded) <= MAX_TTL);
    }

    /// Whether the query should bypass warm data and fetch fresh.
    ///
    /// Returns `true` when no successful completion is recorded, or when
    /// the recorded one is at least `ttl` old. A `ttl` above the hard
    /// ceiling is a configuration error and leaves the cache untouched.
    pub fn should_force_fetch(
        &self,
        config: &QueryConfig,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        if ttl > MAX_TTL {
            return Err(CacheError::TtlTooLong(ttl));
        }

        let entries = self.lock_entries();
        match entries.get(&QueryKey::for_config(config)) {
            Some(recorded) => Ok(self.clock.now().duration_since(*recorded) >= ttl),
            None => Ok(true),
        }
    }

    /// Number of tracked queries.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    /// Whether no completions are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock_entries().is_empty()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<QueryKey, Instant>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for QueryFetchCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn cache_with_clock() -> (QueryFetchCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (QueryFetchCache::with_clock(clock.clone()), clock)
    }

    fn config(name: &str) -> QueryConfig {
        QueryConfig::new(name).with_param("userId", "user1")
    }

    #[test]
    fn test_unseen_query_forces_fetch() {
        let (cache, _clock) = cache_with_clock();
        assert_eq!(
            cache.should_force_fetch(&config("Profile"), Duration::from_secs(60)),
            Ok(true)
        );
    }

    #[test]
    fn test_fresh_entry_does_not_force_fetch() {
        let (cache, clock) = cache_with_clock();
        cache.on_query_success(&config("Profile"));

        clock.advance(Duration::from_secs(59));
        assert_eq!(
            cache.should_force_fetch(&config("Profile"), Duration::from_secs(60)),
            Ok(false)
        );
    }

    #[test]
    fn test_entry_at_ttl_forces_fetch() {
        let (cache, clock) = cache_with_clock();
        cache.on_query_success(&config("Profile"));

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            cache.should_force_fetch(&config("Profile"), Duration::from_secs(60)),
            Ok(true)
        );
    }

    #[test]
    fn test_params_are_part_of_the_identity() {
        let (cache, _clock) = cache_with_clock();
        cache.on_query_success(&config("Profile"));

        let other = QueryConfig::new("Profile").with_param("userId", "user2");
        assert_eq!(
            cache.should_force_fetch(&other, Duration::from_secs(60)),
            Ok(true)
        );
    }

    #[test]
    fn test_ttl_over_ceiling_is_an_error_and_does_not_mutate() {
        let (cache, _clock) = cache_with_clock();
        cache.on_query_success(&config("Profile"));

        let result = cache.should_force_fetch(&config("Profile"), MAX_TTL + Duration::from_secs(1));
        assert_eq!(
            result,
            Err(CacheError::TtlTooLong(MAX_TTL + Duration::from_secs(1)))
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_ttl_at_ceiling_is_allowed() {
        let (cache, _clock) = cache_with_clock();
        cache.on_query_success(&config("Profile"));
        assert_eq!(cache.should_force_fetch(&config("Profile"), MAX_TTL), Ok(false));
    }

    #[test]
    fn test_garbage_collection_purges_entries_past_the_ceiling() {
        let (cache, clock) = cache_with_clock();
        for i in 0..5 {
            cache.on_query_success(&config(&format!("Query{i}")));
        }
        assert_eq!(cache.len(), 5);

        clock.advance(MAX_TTL + Duration::from_secs(1));
        cache.on_query_success(&config("Fresh"));

        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.should_force_fetch(&config("Fresh"), Duration::from_secs(60)),
            Ok(false)
        );
        assert_eq!(
            cache.should_force_fetch(&config("Query0"), Duration::from_secs(60)),
            Ok(true)
        );
    }
}
