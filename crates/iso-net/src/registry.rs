//! Tracking of in-flight requests for abort and progress reporting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

/// Callback invoked with (bytes sent, total bytes) as an upload progresses.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

type AbortHook = Box<dyn FnOnce() + Send>;

/// A single in-flight request tracked by the registry.
///
/// The transport owns the actual connection; this handle only carries the
/// cancellation hook and the upload-progress callback.
pub struct TrackedRequest {
    id: String,
    abort: Mutex<Option<AbortHook>>,
    progress: Mutex<Option<ProgressCallback>>,
}

impl TrackedRequest {
    fn new(id: String, abort: AbortHook) -> Self {
        Self {
            id,
            abort: Mutex::new(Some(abort)),
            progress: Mutex::new(None),
        }
    }

    /// The request id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Register a callback for upload progress events.
    pub fn on_upload_progress(&self, callback: impl Fn(u64, u64) + Send + Sync + 'static) {
        *lock(&self.progress) = Some(Box::new(callback));
    }

    /// Feed a progress event from the transport. Events with an unknown
    /// total are ignored.
    pub fn report_upload_progress(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        if let Some(callback) = &*lock(&self.progress) {
            callback(sent, total);
        }
    }

    fn run_abort(&self) {
        if let Some(abort) = lock(&self.abort).take() {
            abort();
        }
    }
}

/// Registry of in-flight requests, owned by one environment context.
///
/// Completed requests are removed with [`RequestRegistry::remove`];
/// aborting runs the request's cancellation hook and removes it in one
/// step.
#[derive(Default)]
pub struct RequestRegistry {
    requests: Mutex<HashMap<String, Arc<TrackedRequest>>>,
}

impl RequestRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a request; `abort` cancels the underlying transport call.
    pub fn track(
        &self,
        id: impl Into<String>,
        abort: impl FnOnce() + Send + 'static,
    ) -> Arc<TrackedRequest> {
        let id = id.into();
        let request = Arc::new(TrackedRequest::new(id.clone(), Box::new(abort)));
        lock(&self.requests).insert(id, request.clone());
        request
    }

    /// Look up an in-flight request.
    pub fn get(&self, id: &str) -> Option<Arc<TrackedRequest>> {
        lock(&self.requests).get(id).cloned()
    }

    /// Drop a request without aborting it (normal completion).
    pub fn remove(&self, id: &str) -> bool {
        lock(&self.requests).remove(id).is_some()
    }

    /// Abort one request and drop it from the registry.
    pub fn abort(&self, id: &str) -> bool {
        match lock(&self.requests).remove(id) {
            Some(request) => {
                debug!(id = %request.id(), "aborting in-flight request");
                request.run_abort();
                true
            }
            None => false,
        }
    }

    /// Abort everything still in flight.
    pub fn abort_all(&self) {
        let drained: Vec<_> = lock(&self.requests).drain().collect();
        for (_, request) in drained {
            debug!(id = %request.id(), "aborting in-flight request");
            request.run_abort();
        }
    }

    /// Number of in-flight requests.
    pub fn len(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Whether nothing is in flight.
    pub fn is_empty(&self) -> bool {
        lock(&self.requests).is_empty()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    #[test]
    fn test_abort_runs_hook_and_removes_entry() {
        let registry = RequestRegistry::new();
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = aborted.clone();
        registry.track("r1", move || flag.store(true, Ordering::SeqCst));

        assert!(registry.abort("r1"));
        assert!(aborted.load(Ordering::SeqCst));
        assert!(registry.is_empty());
        assert!(!registry.abort("r1"));
    }

    #[test]
    fn test_remove_does_not_run_abort_hook() {
        let registry = RequestRegistry::new();
        let aborted = Arc::new(AtomicBool::new(false));
        let flag = aborted.clone();
        registry.track("r1", move || flag.store(true, Ordering::SeqCst));

        assert!(registry.remove("r1"));
        assert!(!aborted.load(Ordering::SeqCst));
    }

    #[test]
    fn test_progress_events_reach_the_callback() {
        let registry = RequestRegistry::new();
        let request = registry.track("r1", || {});

        let seen = Arc::new(AtomicU64::new(0));
        let sink = seen.clone();
        request.on_upload_progress(move |sent, _total| sink.store(sent, Ordering::SeqCst));

        request.report_upload_progress(0, 0); // unknown total, ignored
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        request.report_upload_progress(512, 1024);
        assert_eq!(seen.load(Ordering::SeqCst), 512);
    }

    #[test]
    fn test_abort_all_drains_the_registry() {
        let registry = RequestRegistry::new();
        let count = Arc::new(AtomicU64::new(0));
        for i in 0..3 {
            let counter = count.clone();
            registry.track(format!("r{i}"), move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        registry.abort_all();
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(registry.is_empty());
    }
}
