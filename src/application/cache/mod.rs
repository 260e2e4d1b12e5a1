//! In-memory caches backing the feed engine.
//!
//! This module provides:
//! - A bounded LRU primitive
//! - Request deduplication for identical in-flight calls
//! - The per-category query snapshot cache
//! - The FIFO-bounded deletion tombstone set

pub mod dedupe;
pub mod lru;
pub mod query_cache;
pub mod tombstones;

pub use dedupe::{DEFAULT_DEDUPE_WINDOW, RequestDeduplicator};
pub use lru::BoundedLru;
pub use query_cache::{
    ALL_CATEGORIES_KEY, CacheKey, CacheSnapshot, DEFAULT_QUERY_CACHE_CAPACITY, QueryCache,
};
pub use tombstones::{DEFAULT_TOMBSTONE_CAPACITY, TombstoneSet};
