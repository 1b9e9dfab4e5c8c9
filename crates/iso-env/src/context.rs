//! Provider-level environment context shared by every consumer of one
//! render tree.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use iso_cache::{CacheError, QueryFetchCache};
use iso_core::QueryConfig;
use iso_net::RequestRegistry;

/// Callback run when the environment is reset.
pub type ResetListener = Arc<dyn Fn() + Send + Sync>;

/// Ambient per-environment state: the TTL re-fetch cache, the in-flight
/// request registry, the initial-render flag, and reset listeners.
///
/// Constructed once per environment and passed by reference to every
/// consumer; never a process-wide singleton, so tests can build isolated
/// instances.
pub struct EnvContext {
    fetch_cache: QueryFetchCache,
    requests: RequestRegistry,
    initial_render: AtomicBool,
    next_listener: AtomicUsize,
    reset_listeners: Mutex<Vec<(usize, ResetListener)>>,
}

impl EnvContext {
    /// Create a context with an empty cache and registry.
    pub fn new() -> Self {
        Self {
            fetch_cache: QueryFetchCache::new(),
            requests: RequestRegistry::new(),
            initial_render: AtomicBool::new(true),
            next_listener: AtomicUsize::new(0),
            reset_listeners: Mutex::new(Vec::new()),
        }
    }

    /// Create a context with a caller-supplied cache (e.g. one on a
    /// manual clock).
    pub fn with_fetch_cache(fetch_cache: QueryFetchCache) -> Self {
        Self {
            fetch_cache,
            ..Self::new()
        }
    }

    /// The TTL re-fetch cache.
    pub fn fetch_cache(&self) -> &QueryFetchCache {
        &self.fetch_cache
    }

    /// The in-flight request registry.
    pub fn requests(&self) -> &RequestRegistry {
        &self.requests
    }

    /// Whether the tree is still in its first client render (hydration).
    pub fn is_initial_render(&self) -> bool {
        self.initial_render.load(Ordering::SeqCst)
    }

    /// Mark hydration finished; later mounts fetch normally.
    pub fn finish_initial_render(&self) {
        self.initial_render.store(false, Ordering::SeqCst);
    }

    /// Register a listener notified on reset; returns a token for removal.
    pub fn add_reset_listener(&self, listener: impl Fn() + Send + Sync + 'static) -> usize {
        let token = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.lock_listeners().push((token, Arc::new(listener)));
        token
    }

    /// Remove a previously registered listener.
    pub fn remove_reset_listener(&self, token: usize) {
        self.lock_listeners().retain(|(id, _)| *id != token);
    }

    /// Notify every listener that the environment was rebuilt and abort
    /// whatever is still in flight.
    pub fn reset(&self) {
        self.requests.abort_all();
        let listeners: Vec<ResetListener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Record a successful query completion in the re-fetch cache.
    pub fn on_query_success(&self, config: &QueryConfig) {
        self.fetch_cache.on_query_success(config);
    }

    /// Whether a mounted view should force a fresh fetch for the query.
    pub fn should_force_fetch(
        &self,
        config: &QueryConfig,
        ttl: Duration,
    ) -> Result<bool, CacheError> {
        self.fetch_cache.should_force_fetch(config, ttl)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(usize, ResetListener)>> {
        self.reset_listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EnvContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_initial_render_flag_flips_once() {
        let context = EnvContext::new();
        assert!(context.is_initial_render());
        context.finish_initial_render();
        assert!(!context.is_initial_render());
    }

    #[test]
    fn test_reset_notifies_registered_listeners() {
        let context = EnvContext::new();
        let notified = Arc::new(AtomicU64::new(0));

        let counter = notified.clone();
        let token = context.add_reset_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = notified.clone();
        context.add_reset_listener(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        context.reset();
        assert_eq!(notified.load(Ordering::SeqCst), 2);

        context.remove_reset_listener(token);
        context.reset();
        assert_eq!(notified.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_reset_aborts_in_flight_requests() {
        let context = EnvContext::new();
        let aborted = Arc::new(AtomicU64::new(0));
        let counter = aborted.clone();
        context.requests().track("r1", move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        context.reset();
        assert_eq!(aborted.load(Ordering::SeqCst), 1);
        assert!(context.requests().is_empty());
    }

    #[test]
    fn test_ttl_pass_throughs_reach_the_cache() {
        let context = EnvContext::new();
        let config = QueryConfig::new("Profile").with_param("userId", "user1");

        assert_eq!(
            context.should_force_fetch(&config, Duration::from_secs(60)),
            Ok(true)
        );
        context.on_query_success(&config);
        assert_eq!(
            context.should_force_fetch(&config, Duration::from_secs(60)),
            Ok(false)
        );
    }
}
