//! Application layer: caches, merge rules and the feed store.

/// Request dedupe, query snapshots and deletion tombstones.
pub mod cache;
/// Pure merge functions and auxiliary caches.
pub mod services;
/// Feed store orchestration.
pub mod store;

pub use cache::{CacheKey, CacheSnapshot, QueryCache, RequestDeduplicator, TombstoneSet};
pub use services::{FavoriteStatusCache, RecencyWindow};
pub use store::{FeedConfig, FeedContext, FeedState, FeedStore, FetchOutcome};
