//! Port for fetching pages of media items from the remote API.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::{FeedPage, FeedQuery};
use crate::domain::errors::FeedError;

/// Default page size used when a query does not name one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Per-call fetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ask the server and any edge cache for a fresh response.
    pub bust_cache: bool,
}

/// Port for the network fetch collaborator.
#[async_trait]
pub trait MediaSourcePort: Send + Sync {
    /// Fetches one page of items matching `query`.
    ///
    /// Implementations abort and return [`FeedError::Cancelled`] once `cancel` fires.
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        options: FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<FeedPage, FeedError>;

    /// Key identifying identical requests, as `method:url:body`.
    ///
    /// Must not include cache-busting tokens.
    fn request_key(&self, query: &FeedQuery) -> String {
        let params = query
            .query_pairs(DEFAULT_PAGE_SIZE)
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("GET:/images?{params}:")
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::domain::entities::MediaItem;

    /// Scripted media source for testing.
    ///
    /// Pages are keyed by category name (`"all"` when unfiltered) and page number.
    #[derive(Default)]
    pub struct MockMediaSource {
        pages: Mutex<HashMap<(String, u32), FeedPage>>,
        failures: Mutex<VecDeque<FeedError>>,
        delay: Mutex<Duration>,
        calls: AtomicUsize,
        requests: Mutex<Vec<(FeedQuery, FetchOptions)>>,
    }

    impl MockMediaSource {
        /// Creates new mock with no pages.
        pub fn new() -> Self {
            Self::default()
        }

        /// Sets first-page items for a category.
        pub fn set_items(&self, category: &str, items: Vec<MediaItem>) {
            self.set_page(category, 1, FeedPage::new(items, None));
        }

        /// Sets a specific page for a category.
        pub fn set_page(&self, category: &str, page: u32, feed_page: FeedPage) {
            self.pages.lock().insert((category.to_string(), page), feed_page);
        }

        /// Makes the next call fail with `error`.
        pub fn fail_next(&self, error: FeedError) {
            self.failures.lock().push_back(error);
        }

        /// Sets simulated network latency.
        pub fn set_delay(&self, delay: Duration) {
            *self.delay.lock() = delay;
        }

        /// Number of network calls made.
        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        /// Queries and options seen so far.
        pub fn requests(&self) -> Vec<(FeedQuery, FetchOptions)> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl MediaSourcePort for MockMediaSource {
        async fn fetch_page(
            &self,
            query: &FeedQuery,
            options: FetchOptions,
            cancel: &CancellationToken,
        ) -> Result<FeedPage, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push((query.clone(), options));

            let delay = *self.delay.lock();
            if !delay.is_zero() {
                tokio::select! {
                    () = cancel.cancelled() => return Err(FeedError::Cancelled),
                    () = tokio::time::sleep(delay) => {}
                }
            }

            if let Some(error) = self.failures.lock().pop_front() {
                return Err(error);
            }

            let key = (
                query.category_name().unwrap_or("all").to_string(),
                query.page_number(),
            );
            Ok(self.pages.lock().get(&key).cloned().unwrap_or_default())
        }
    }
}
