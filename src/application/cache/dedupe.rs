//! Request deduplication.
//!
//! Concurrent calls sharing a `method:url:body` key within the dedupe window
//! join a single in-flight task instead of starting their own. Entries are
//! dropped one window after a successful resolution, and immediately after a
//! failure so retries are never blocked by a stale rejection.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::domain::errors::FeedError;

/// Default window during which identical requests are coalesced.
pub const DEFAULT_DEDUPE_WINDOW: Duration = Duration::from_millis(1000);

type SharedTask<T> = Shared<BoxFuture<'static, Result<T, FeedError>>>;

struct PendingRequest<T> {
    task: SharedTask<T>,
    created_at: Instant,
    generation: u64,
}

/// Collapses identical concurrent requests into one.
pub struct RequestDeduplicator<T> {
    window: Duration,
    pending: Arc<Mutex<HashMap<String, PendingRequest<T>>>>,
    next_generation: AtomicU64,
}

impl<T> std::fmt::Debug for RequestDeduplicator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDeduplicator")
            .field("window", &self.window)
            .field("pending", &self.pending.lock().len())
            .finish()
    }
}

impl<T> RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Builds a dedupe key from the request triple.
    #[must_use]
    pub fn request_key(method: &str, url: &str, body: Option<&str>) -> String {
        format!("{method}:{url}:{}", body.unwrap_or_default())
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Number of keys currently tracked.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Runs the task built by `factory`, or joins an identical one already in flight.
    ///
    /// Every joined caller observes the same resolution as the first caller, and
    /// the task itself runs once.
    ///
    /// # Errors
    /// Returns the error produced by the shared task.
    pub async fn dedupe<F, Fut>(&self, key: &str, factory: F) -> Result<T, FeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FeedError>> + Send + 'static,
    {
        let task = self.join_or_start(key, factory, true);
        task.await
    }

    /// Like [`dedupe`](Self::dedupe), but only joins a task that has not resolved yet.
    ///
    /// Used for forced refreshes, which must not be answered by a result
    /// produced before they were issued.
    ///
    /// # Errors
    /// Returns the error produced by the shared task.
    pub async fn dedupe_in_flight<F, Fut>(&self, key: &str, factory: F) -> Result<T, FeedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FeedError>> + Send + 'static,
    {
        let task = self.join_or_start(key, factory, false);
        task.await
    }

    fn join_or_start<F, Fut>(&self, key: &str, factory: F, reuse_resolved: bool) -> SharedTask<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FeedError>> + Send + 'static,
    {
        let mut pending = self.pending.lock();

        if let Some(entry) = pending.get(key) {
            let joinable = match entry.task.peek() {
                None => true,
                Some(Ok(_)) => reuse_resolved,
                Some(Err(_)) => false,
            };
            if joinable && entry.created_at.elapsed() < self.window {
                debug!(key, "Joining in-flight request");
                return entry.task.clone();
            }
        }

        let task = factory().boxed().shared();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        pending.insert(
            key.to_string(),
            PendingRequest {
                task: task.clone(),
                created_at: Instant::now(),
                generation,
            },
        );
        drop(pending);

        trace!(key, generation, "Started new request");
        self.schedule_cleanup(key.to_string(), generation, task.clone());
        task
    }

    fn schedule_cleanup(&self, key: String, generation: u64, task: SharedTask<T>) {
        let pending = Arc::clone(&self.pending);
        let window = self.window;

        tokio::spawn(async move {
            if task.await.is_ok() {
                tokio::time::sleep(window).await;
            }

            let mut pending = pending.lock();
            if pending
                .get(&key)
                .is_some_and(|entry| entry.generation == generation)
            {
                pending.remove(&key);
                trace!(key = %key, "Released pending request");
            }
        });
    }
}

impl<T> Default for RequestDeduplicator<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_DEDUPE_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_task(
        counter: &Arc<AtomicUsize>,
        result: Result<u32, FeedError>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, FeedError>> {
        let counter = Arc::clone(counter);
        move || {
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                result
            }
            .boxed()
        }
    }

    #[test]
    fn test_request_key_format() {
        let key = RequestDeduplicator::<u32>::request_key("GET", "/images?page=1", None);
        assert_eq!(key, "GET:/images?page=1:");

        let key = RequestDeduplicator::<u32>::request_key("POST", "/images", Some(r#"{"a":1}"#));
        assert_eq!(key, r#"POST:/images:{"a":1}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_calls_share_one_task() {
        let dedupe = RequestDeduplicator::new(DEFAULT_DEDUPE_WINDOW);
        let counter = Arc::new(AtomicUsize::new(0));

        let (first, second) = tokio::join!(
            dedupe.dedupe("GET:/images:", counting_task(&counter, Ok(7))),
            dedupe.dedupe("GET:/images:", counting_task(&counter, Ok(8))),
        );

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(first, Ok(7));
        assert_eq!(second, Ok(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_keys_run_separately() {
        let dedupe = RequestDeduplicator::new(DEFAULT_DEDUPE_WINDOW);
        let counter = Arc::new(AtomicUsize::new(0));

        let (first, second) = tokio::join!(
            dedupe.dedupe("GET:/images?category=A:", counting_task(&counter, Ok(1))),
            dedupe.dedupe("GET:/images?category=B:", counting_task(&counter, Ok(2))),
        );

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!((first, second), (Ok(1), Ok(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolved_result_reused_within_window() {
        let dedupe = RequestDeduplicator::new(DEFAULT_DEDUPE_WINDOW);
        let counter = Arc::new(AtomicUsize::new(0));

        let first = dedupe.dedupe("k", counting_task(&counter, Ok(1))).await;
        let second = dedupe.dedupe("k", counting_task(&counter, Ok(2))).await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_released_after_window() {
        let dedupe = RequestDeduplicator::new(DEFAULT_DEDUPE_WINDOW);
        let counter = Arc::new(AtomicUsize::new(0));

        let _ = dedupe.dedupe("k", counting_task(&counter, Ok(1))).await;
        tokio::time::sleep(DEFAULT_DEDUPE_WINDOW + Duration::from_millis(10)).await;

        assert_eq!(dedupe.pending_len(), 0);

        let again = dedupe.dedupe("k", counting_task(&counter, Ok(2))).await;
        assert_eq!(again, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_block_retry() {
        let dedupe = RequestDeduplicator::new(DEFAULT_DEDUPE_WINDOW);
        let counter = Arc::new(AtomicUsize::new(0));

        let (first, second) = tokio::join!(
            dedupe.dedupe("k", counting_task(&counter, Err(FeedError::network("reset")))),
            dedupe.dedupe("k", counting_task(&counter, Ok(5))),
        );
        assert_eq!(first, Err(FeedError::network("reset")));
        assert_eq!(second, Err(FeedError::network("reset")));

        let retry = dedupe.dedupe("k", counting_task(&counter, Ok(9))).await;

        assert_eq!(retry, Ok(9));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_variant_skips_resolved_result() {
        let dedupe = RequestDeduplicator::new(DEFAULT_DEDUPE_WINDOW);
        let counter = Arc::new(AtomicUsize::new(0));

        let _ = dedupe.dedupe("k", counting_task(&counter, Ok(1))).await;
        let (fresh, joined) = tokio::join!(
            dedupe.dedupe_in_flight("k", counting_task(&counter, Ok(2))),
            dedupe.dedupe("k", counting_task(&counter, Ok(3))),
        );

        assert_eq!(fresh, Ok(2));
        assert_eq!(joined, Ok(2));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
