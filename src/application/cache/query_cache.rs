//! Per-category snapshot cache for first-page results.

use tracing::{debug, trace};

use super::lru::BoundedLru;
use crate::domain::entities::{FeedQuery, MediaItem, Pagination};

/// Key used when no category filter is applied.
pub const ALL_CATEGORIES_KEY: &str = "all";

/// Default number of category snapshots kept.
pub const DEFAULT_QUERY_CACHE_CAPACITY: usize = 64;

/// Normalized category key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a category, or [`ALL_CATEGORIES_KEY`] when none is set.
    #[must_use]
    pub fn for_category(category: Option<&str>) -> Self {
        match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(name) => Self(name.to_string()),
            None => Self(ALL_CATEGORIES_KEY.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Last known first page for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSnapshot {
    pub items: Vec<MediaItem>,
    pub pagination: Option<Pagination>,
}

/// Snapshot store keyed by normalized category.
///
/// Only category-only browsing is cached; search and location queries always
/// go to the network.
#[derive(Debug)]
pub struct QueryCache {
    entries: BoundedLru<CacheKey, CacheSnapshot>,
}

impl QueryCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedLru::new(capacity),
        }
    }

    /// Computes the cache key, or `None` when the query must not be cached.
    #[must_use]
    pub fn compute_key(query: &FeedQuery) -> Option<CacheKey> {
        if query.search_term().is_some() || query.location_name().is_some() {
            return None;
        }
        Some(CacheKey::for_category(query.category_name()))
    }

    /// Key under which a snapshot for `query` may be written.
    #[must_use]
    pub fn writable_key(query: &FeedQuery) -> Option<CacheKey> {
        Self::compute_key(query).filter(|_| query.is_first_page())
    }

    /// Key from which `query` may be served without touching the network.
    #[must_use]
    pub fn readable_key(query: &FeedQuery) -> Option<CacheKey> {
        Self::writable_key(query).filter(|_| !query.refresh)
    }

    pub fn read(&mut self, key: &CacheKey) -> Option<CacheSnapshot> {
        let snapshot = self.entries.get(key).cloned();
        trace!(key = %key, hit = snapshot.is_some(), "Query cache lookup");
        snapshot
    }

    /// Stores `snapshot`, replacing any prior entry for `key`.
    pub fn write(&mut self, key: CacheKey, snapshot: CacheSnapshot) {
        debug!(key = %key, items = snapshot.items.len(), "Caching feed snapshot");
        self.entries.set(key, snapshot);
    }

    /// Removes the entry for `key`. Returns true if one existed.
    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        let removed = self.entries.delete(key).is_some();
        if removed {
            debug!(key = %key, "Invalidated feed snapshot");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.has(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_QUERY_CACHE_CAPACITY)
    }
}
