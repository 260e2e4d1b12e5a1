use serde::Serialize;

use crate::domain::entities::{FeedQuery, MediaItem, Pagination};
use crate::domain::errors::FeedError;

/// Observable state of one feed store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeedState {
    pub items: Vec<MediaItem>,
    pub loading: bool,
    /// User-facing message from the last failed fetch.
    pub error: Option<String>,
    pub pagination: Option<Pagination>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
}

impl FeedState {
    pub(crate) fn apply_filters_of(&mut self, query: &FeedQuery) {
        self.search = query.search_term().map(str::to_owned);
        self.category = query.category_name().map(str::to_owned);
        self.location = query.location_name().map(str::to_owned);
    }
}

/// How a call to `fetch` was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Nothing to do; the store already shows this query or the call was dropped.
    Skipped,
    /// Another fetch was in flight; this query replays once it completes.
    Queued,
    /// Served synchronously from the query cache.
    CacheHit,
    /// Loaded from the network.
    Loaded,
    /// Cancelled by the caller; state unchanged apart from loading.
    Cancelled,
    /// Network or server failure; previous items retained.
    Failed(FeedError),
}
