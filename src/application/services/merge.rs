//! Pure merge and filter functions deciding how a fetch result combines with
//! the displayed list.
//!
//! None of these functions can fail; every input produces a list.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::application::cache::TombstoneSet;
use crate::domain::entities::{FeedQuery, MediaId, MediaItem};

/// Default protection span for freshly created items.
pub const DEFAULT_RECENCY_WINDOW_SECS: i64 = 15 * 60;

/// Timestamps closer than this many milliseconds are treated as a tie.
pub const TIE_TOLERANCE_MS: i64 = 1000;

/// Time span after creation during which a local item survives a refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecencyWindow {
    span: Duration,
}

impl RecencyWindow {
    #[must_use]
    pub const fn new(span: Duration) -> Self {
        Self { span }
    }

    #[must_use]
    pub fn from_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        Self::new(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
    }

    #[must_use]
    pub const fn span(&self) -> Duration {
        self.span
    }

    /// Returns true if `item` was created within the window ending at `now`.
    #[must_use]
    pub fn contains(&self, item: &MediaItem, now: DateTime<Utc>) -> bool {
        item.created_at
            .is_some_and(|created| now.signed_duration_since(created) <= self.span)
    }
}

impl Default for RecencyWindow {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_RECENCY_WINDOW_SECS))
    }
}

/// Per-dimension comparison of a query against the applied filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterChanges {
    pub search: bool,
    pub category: bool,
    pub location: bool,
}

impl FilterChanges {
    #[must_use]
    pub const fn any(&self) -> bool {
        self.search || self.category || self.location
    }
}

/// Returns true for a fresh filter/search rather than a "load more" continuation.
#[must_use]
pub fn is_new_query(query: &FeedQuery) -> bool {
    query.search.is_some() || query.category.is_some() || query.location.is_some() || query.is_first_page()
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Compares each filter dimension of `query` with what is currently displayed.
#[must_use]
pub fn has_filters_changed(
    query: &FeedQuery,
    current_search: Option<&str>,
    current_category: Option<&str>,
    current_location: Option<&str>,
) -> FilterChanges {
    FilterChanges {
        search: query.search_term() != blank_to_none(current_search),
        category: query.category_name() != blank_to_none(current_category),
        location: query.location_name() != blank_to_none(current_location),
    }
}

/// Picks the displayed items that must survive a refetch.
///
/// Items inside the recency window that match the query's category are kept.
/// During a forced refresh without a category filter every timestamped item
/// is kept.
#[must_use]
pub fn filter_recent_uploads(
    existing: &[MediaItem],
    query: &FeedQuery,
    is_refresh: bool,
    window: RecencyWindow,
    now: DateTime<Utc>,
) -> Vec<MediaItem> {
    let category = query.category_name();

    existing
        .iter()
        .filter(|item| {
            let recent = window.contains(item, now) && item.in_category(category);
            let resync = is_refresh && category.is_none() && item.created_at.is_some();
            recent || resync
        })
        .cloned()
        .collect()
}

/// Orders newest first; items without a timestamp sink to the end.
pub fn sort_newest_first(items: &mut [MediaItem]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

// Whether `local` should be placed before `server` in a newest-first list.
fn goes_before(local: &MediaItem, server: &MediaItem) -> bool {
    match (local.created_at, server.created_at) {
        (Some(a), Some(b)) => {
            let tied = (a - b).abs() <= Duration::milliseconds(TIE_TOLERANCE_MS);
            if tied && local.recent_upload != server.recent_upload {
                local.recent_upload
            } else {
                a >= b
            }
        }
        (Some(_), None) => true,
        (None, Some(_)) => false,
        (None, None) => local.recent_upload || !server.recent_upload,
    }
}

/// Builds the displayed list for a fresh query.
///
/// Recent uploads missing from `new_items` are merged in newest first, and
/// win ties of up to [`TIE_TOLERANCE_MS`] against server items. The recent-upload
/// flag of items already displayed is carried over to their fetched copies.
#[must_use]
pub fn merge_images(
    existing: &[MediaItem],
    new_items: Vec<MediaItem>,
    recent_uploads: Vec<MediaItem>,
) -> Vec<MediaItem> {
    let flagged: HashSet<&MediaId> = existing
        .iter()
        .filter(|item| item.recent_upload)
        .map(|item| &item.id)
        .collect();

    let mut seen: HashSet<MediaId> = HashSet::with_capacity(new_items.len());
    let mut server: Vec<MediaItem> = new_items
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .map(|mut item| {
            if flagged.contains(&item.id) {
                item.recent_upload = true;
            }
            item
        })
        .collect();

    let mut local: Vec<MediaItem> = recent_uploads
        .into_iter()
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    sort_newest_first(&mut server);
    sort_newest_first(&mut local);

    let mut merged = Vec::with_capacity(server.len() + local.len());
    let mut server = server.into_iter().peekable();
    let mut local = local.into_iter().peekable();

    loop {
        let take_local = match (local.peek(), server.peek()) {
            (Some(l), Some(s)) => goes_before(l, s),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_local { local.next() } else { server.next() };
        merged.extend(next);
    }

    merged
}

/// Appends a continuation page, skipping ids already present.
#[must_use]
pub fn append_images(existing: &[MediaItem], new_items: Vec<MediaItem>) -> Vec<MediaItem> {
    let mut seen: HashSet<MediaId> = existing.iter().map(|item| item.id.clone()).collect();
    let mut result = existing.to_vec();
    result.extend(new_items.into_iter().filter(|item| seen.insert(item.id.clone())));
    result
}

/// Removes every tombstoned item.
#[must_use]
pub fn filter_deleted_images(mut items: Vec<MediaItem>, tombstones: &TombstoneSet) -> Vec<MediaItem> {
    if !tombstones.is_empty() {
        items.retain(|item| !tombstones.contains(&item.id));
    }
    items
}
