//! Shared engine context owned by the application root.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::cache::{
    CacheKey, CacheSnapshot, DEFAULT_QUERY_CACHE_CAPACITY, DEFAULT_TOMBSTONE_CAPACITY, QueryCache,
    RequestDeduplicator, TombstoneSet,
};
use crate::application::services::merge::{self, DEFAULT_RECENCY_WINDOW_SECS};
use crate::application::services::{DEFAULT_FAVORITES_CAPACITY, FavoriteStatusCache, RecencyWindow};
use crate::domain::entities::{FeedPage, MediaId, MediaItem};
use crate::domain::ports::{Clock, DEFAULT_PAGE_SIZE};

/// Tunables for the feed engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Items requested per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Window in which identical requests are coalesced, in milliseconds.
    #[serde(default = "default_dedupe_window_ms")]
    pub dedupe_window_ms: u64,

    /// How long a new item is protected from being dropped by a refetch, in seconds.
    #[serde(default = "default_recency_window_secs")]
    pub recency_window_secs: u64,

    /// Maximum number of remembered deletions.
    #[serde(default = "default_tombstone_capacity")]
    pub tombstone_capacity: usize,

    /// Maximum number of cached category snapshots.
    #[serde(default = "default_query_cache_capacity")]
    pub query_cache_capacity: usize,

    /// Maximum number of memoized favorite flags.
    #[serde(default = "default_favorites_capacity")]
    pub favorites_capacity: usize,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

const fn default_dedupe_window_ms() -> u64 {
    1000
}

#[allow(clippy::cast_sign_loss)]
const fn default_recency_window_secs() -> u64 {
    DEFAULT_RECENCY_WINDOW_SECS as u64
}

const fn default_tombstone_capacity() -> usize {
    DEFAULT_TOMBSTONE_CAPACITY
}

const fn default_query_cache_capacity() -> usize {
    DEFAULT_QUERY_CACHE_CAPACITY
}

const fn default_favorites_capacity() -> usize {
    DEFAULT_FAVORITES_CAPACITY
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            dedupe_window_ms: default_dedupe_window_ms(),
            recency_window_secs: default_recency_window_secs(),
            tombstone_capacity: default_tombstone_capacity(),
            query_cache_capacity: default_query_cache_capacity(),
            favorites_capacity: default_favorites_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Session-wide caches shared by every feed store.
///
/// Construct one per application session and hand it to stores by `Arc`.
pub struct FeedContext {
    query_cache: Mutex<QueryCache>,
    tombstones: Mutex<TombstoneSet>,
    requests: RequestDeduplicator<Arc<FeedPage>>,
    favorites: FavoriteStatusCache,
    recency: RecencyWindow,
    page_size: u32,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for FeedContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedContext")
            .field("cached_queries", &self.query_cache.lock().len())
            .field("tombstones", &self.tombstones.lock().len())
            .field("requests", &self.requests)
            .field("recency", &self.recency)
            .finish_non_exhaustive()
    }
}

impl FeedContext {
    #[must_use]
    pub fn new(config: &FeedConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            query_cache: Mutex::new(QueryCache::new(config.query_cache_capacity)),
            tombstones: Mutex::new(TombstoneSet::new(config.tombstone_capacity)),
            requests: RequestDeduplicator::new(Duration::from_millis(config.dedupe_window_ms)),
            favorites: FavoriteStatusCache::new(config.favorites_capacity),
            recency: RecencyWindow::from_secs(config.recency_window_secs),
            page_size: config.page_size,
            clock,
        }
    }

    pub(crate) const fn requests(&self) -> &RequestDeduplicator<Arc<FeedPage>> {
        &self.requests
    }

    #[must_use]
    pub const fn favorites(&self) -> &FavoriteStatusCache {
        &self.favorites
    }

    #[must_use]
    pub const fn recency(&self) -> RecencyWindow {
        self.recency
    }

    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn read_cache(&self, key: &CacheKey) -> Option<CacheSnapshot> {
        self.query_cache.lock().read(key)
    }

    pub fn write_cache(&self, key: CacheKey, snapshot: CacheSnapshot) {
        self.query_cache.lock().write(key, snapshot);
    }

    #[must_use]
    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.query_cache.lock().contains(key)
    }

    /// Drops the snapshot for `category` (`None` meaning all categories).
    pub fn invalidate_category(&self, category: Option<&str>) -> bool {
        self.query_cache
            .lock()
            .invalidate(&CacheKey::for_category(category))
    }

    /// Drops every cached snapshot.
    pub fn invalidate_all(&self) {
        self.query_cache.lock().clear();
        debug!("Invalidated all feed snapshots");
    }

    /// Remembers `id` as deleted. Returns false if it already was.
    pub fn tombstone(&self, id: MediaId) -> bool {
        self.tombstones.lock().insert(id)
    }

    #[must_use]
    pub fn is_tombstoned(&self, id: &MediaId) -> bool {
        self.tombstones.lock().contains(id)
    }

    /// Removes tombstoned items from `items`.
    #[must_use]
    pub fn without_tombstoned(&self, items: Vec<MediaItem>) -> Vec<MediaItem> {
        merge::filter_deleted_images(items, &self.tombstones.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::MockClock;

    fn context(config: &FeedConfig) -> FeedContext {
        let mut clock = MockClock::new();
        clock.expect_now().returning(Utc::now);
        FeedContext::new(config, Arc::new(clock))
    }

    #[test]
    fn test_config_defaults_from_empty_toml() {
        let config: FeedConfig = toml::from_str("").unwrap();

        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.tombstone_capacity, 1000);
        assert_eq!(config.dedupe_window_ms, 1000);
        assert_eq!(config.recency_window_secs, 900);
    }

    #[test]
    fn test_tombstones_capped_by_config() {
        let config = FeedConfig {
            tombstone_capacity: 2,
            ..FeedConfig::default()
        };
        let context = context(&config);

        context.tombstone(MediaId::new("a"));
        context.tombstone(MediaId::new("b"));
        context.tombstone(MediaId::new("c"));

        assert!(!context.is_tombstoned(&MediaId::new("a")));
        assert!(context.is_tombstoned(&MediaId::new("c")));
    }

    #[test]
    fn test_invalidate_all() {
        let context = context(&FeedConfig::default());
        let snapshot = CacheSnapshot {
            items: Vec::new(),
            pagination: None,
        };
        context.write_cache(CacheKey::for_category(Some("Nature")), snapshot.clone());
        context.write_cache(CacheKey::for_category(None), snapshot);

        context.invalidate_all();

        assert!(!context.is_cached(&CacheKey::for_category(Some("Nature"))));
        assert!(!context.is_cached(&CacheKey::for_category(None)));
    }
}
