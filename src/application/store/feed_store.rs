//! Feed store orchestrating cache reads, network fetches, and merges.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::context::FeedContext;
use super::state::{FeedState, FetchOutcome};
use crate::application::cache::{CacheSnapshot, QueryCache};
use crate::application::services::merge::{self, FilterChanges};
use crate::domain::entities::{FeedPage, FeedQuery, MediaId, MediaItem};
use crate::domain::errors::FeedError;
use crate::domain::ports::{FetchOptions, MediaSourcePort};

type Deferred = (FeedQuery, Option<CancellationToken>);

#[derive(Debug, Default)]
struct FetchSlot {
    in_flight: usize,
    running: Option<FeedQuery>,
    deferred: Option<Deferred>,
}

impl FetchSlot {
    fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.running = None;
        }
    }
}

// Holds one in-flight claim on the slot; released on drop if `finish` never ran.
struct SlotGuard<'a> {
    slot: &'a Mutex<FetchSlot>,
    released: bool,
}

impl SlotGuard<'_> {
    /// Hands over the deferred intent if this is the last claim, else releases it.
    fn finish(&mut self) -> Option<Deferred> {
        let mut slot = self.slot.lock();
        if slot.in_flight == 1 {
            if let Some((query, cancel)) = slot.deferred.take() {
                slot.running = Some(query.clone());
                return Some((query, cancel));
            }
        }
        slot.release();
        self.released = true;
        None
    }
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.slot.lock().release();
        }
    }
}

/// Stateful owner of the displayed feed.
///
/// At most one non-forced fetch runs at a time, and a forced refresh in
/// flight counts as running too. A fetch requested meanwhile is remembered
/// (latest wins) and replayed once the in-flight work completes.
pub struct FeedStore {
    source: Arc<dyn MediaSourcePort>,
    context: Arc<FeedContext>,
    state: watch::Sender<FeedState>,
    slot: Mutex<FetchSlot>,
}

impl std::fmt::Debug for FeedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedStore")
            .field("context", &self.context)
            .field("slot", &*self.slot.lock())
            .finish_non_exhaustive()
    }
}

impl FeedStore {
    #[must_use]
    pub fn new(source: Arc<dyn MediaSourcePort>, context: Arc<FeedContext>) -> Self {
        let (state, _) = watch::channel(FeedState::default());
        Self {
            source,
            context,
            state,
            slot: Mutex::new(FetchSlot::default()),
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions. Each update is published whole.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    #[must_use]
    pub const fn context(&self) -> &Arc<FeedContext> {
        &self.context
    }

    /// Fetches the feed for `query`.
    ///
    /// A forced refresh always runs. Any other call made while a fetch is in
    /// flight is skipped when identical to it, and otherwise deferred: the
    /// latest deferred query runs once every in-flight fetch has finished,
    /// unless its cancellation token fired first.
    ///
    /// Failures are recorded in the store state and also returned as
    /// [`FetchOutcome::Failed`]; cancellation is reported but never recorded.
    pub async fn fetch(&self, query: FeedQuery, cancel: Option<CancellationToken>) -> FetchOutcome {
        {
            let mut slot = self.slot.lock();
            if slot.in_flight > 0 && !query.refresh {
                if slot.running.as_ref() == Some(&query) {
                    debug!(category = ?query.category_name(), "Identical fetch already running");
                    return FetchOutcome::Skipped;
                }
                debug!(category = ?query.category_name(), "Fetch already running, deferring");
                slot.deferred = Some((query, cancel));
                return FetchOutcome::Queued;
            }
            slot.in_flight += 1;
            slot.running = Some(query.clone());
        }

        let mut guard = SlotGuard {
            slot: &self.slot,
            released: false,
        };
        let outcome = self.run(query, cancel).await;

        while let Some((next, next_cancel)) = guard.finish() {
            if next_cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                debug!(category = ?next.category_name(), "Dropping cancelled deferred fetch");
                continue;
            }
            debug!(category = ?next.category_name(), "Replaying deferred fetch");
            match self.run(next, next_cancel).await {
                FetchOutcome::Failed(error) => warn!(error = %error, "Deferred fetch failed"),
                other => debug!(outcome = ?other, "Deferred fetch finished"),
            }
        }

        outcome
    }

    /// Fetches the page after the current one, if the server reported more.
    pub async fn load_more(&self, cancel: Option<CancellationToken>) -> FetchOutcome {
        let next = self.state.borrow().pagination.filter(|p| p.has_more());
        let Some(pagination) = next else {
            debug!("No further pages to load");
            return FetchOutcome::Skipped;
        };
        self.fetch(FeedQuery::next_page(pagination.page + 1), cancel).await
    }

    /// Removes an item locally and keeps it from reappearing.
    ///
    /// The id is tombstoned, the item leaves the displayed list, and the
    /// snapshot of the active category is invalidated.
    pub fn remove(&self, id: &MediaId) {
        let newly_removed = self.context.tombstone(id.clone());
        let category = self.state.borrow().category.clone();
        self.context.invalidate_category(category.as_deref());

        self.state.send_modify(|state| {
            state.items.retain(|item| &item.id != id);
            if newly_removed {
                if let Some(pagination) = state.pagination.as_mut() {
                    pagination.decrement_total();
                }
            }
        });

        info!(id = %id, category = ?category, "Removed item from feed");
    }

    /// Inserts a just-created item ahead of server confirmation.
    ///
    /// The item is shown immediately when it fits the active filters, and is
    /// protected by the recency window on later refetches.
    pub fn add_recent_upload(&self, item: MediaItem) {
        let item = item.as_recent_upload();
        let id = item.id.clone();

        if self.context.is_tombstoned(&id) {
            debug!(id = %id, "Ignoring upload of deleted item");
            return;
        }

        self.context.invalidate_category(item.category_name());
        self.context.invalidate_category(None);

        let shown = self.state.send_if_modified(|state| {
            let visible = state.search.is_none()
                && state.location.is_none()
                && item.in_category(state.category.as_deref());
            if !visible || state.items.iter().any(|existing| existing.id == item.id) {
                return false;
            }
            state.items.insert(0, item);
            if let Some(pagination) = state.pagination.as_mut() {
                pagination.increment_total();
            }
            true
        });

        info!(id = %id, shown, "Added recent upload");
    }

    async fn run(&self, query: FeedQuery, cancel: Option<CancellationToken>) -> FetchOutcome {
        let previous = self.snapshot();
        let fresh = merge::is_new_query(&query);

        let mut effective = if fresh {
            query.clone()
        } else {
            query.clone().with_filters_of(
                previous.search.as_deref(),
                previous.category.as_deref(),
                previous.location.as_deref(),
            )
        };
        effective.limit.get_or_insert(self.context.page_size());

        let changes = merge::has_filters_changed(
            &effective,
            previous.search.as_deref(),
            previous.category.as_deref(),
            previous.location.as_deref(),
        );

        if fresh
            && !query.refresh
            && !changes.any()
            && effective.is_first_page()
            && !previous.items.is_empty()
        {
            debug!(category = ?effective.category_name(), "Requested filters already displayed");
            return FetchOutcome::Skipped;
        }

        if self.serve_from_cache(&effective) {
            return FetchOutcome::CacheHit;
        }

        let cleared = query.refresh && !changes.any();
        self.state.send_if_modified(|state| {
            let before = (state.items.len(), state.loading, state.error.is_some());
            if cleared {
                state.items.clear();
            }
            state.loading = state.items.is_empty();
            state.error = None;
            before != (state.items.len(), state.loading, state.error.is_some())
        });

        let options = FetchOptions {
            bust_cache: effective.is_first_page() || query.refresh || changes.category || changes.search,
        };
        let token = cancel.unwrap_or_default();

        match self.request(&effective, options, query.refresh, &token).await {
            Ok(page) => {
                self.apply_page(&page, &effective, fresh, changes, query.refresh, &previous.items);
                FetchOutcome::Loaded
            }
            Err(error) if error.is_cancelled() => {
                debug!(category = ?effective.category_name(), "Feed fetch cancelled");
                self.settle_without_result(cleared, previous.items, None);
                FetchOutcome::Cancelled
            }
            Err(error) => {
                warn!(
                    error = %error,
                    category = ?effective.category_name(),
                    page = effective.page_number(),
                    "Feed fetch failed"
                );
                self.settle_without_result(cleared, previous.items, Some(error.user_message()));
                FetchOutcome::Failed(error)
            }
        }
    }

    fn serve_from_cache(&self, query: &FeedQuery) -> bool {
        let Some(key) = QueryCache::readable_key(query) else {
            return false;
        };
        let Some(snapshot) = self.context.read_cache(&key) else {
            debug!(key = %key, "Query cache miss");
            return false;
        };

        let items = self.context.without_tombstoned(snapshot.items);
        let pagination = snapshot.pagination;
        self.state.send_modify(|state| {
            state.items = items;
            state.pagination = pagination;
            state.apply_filters_of(query);
            state.loading = false;
            state.error = None;
        });

        debug!(key = %key, "Served feed from query cache");
        true
    }

    async fn request(
        &self,
        query: &FeedQuery,
        options: FetchOptions,
        refresh: bool,
        cancel: &CancellationToken,
    ) -> Result<Arc<FeedPage>, FeedError> {
        let key = self.source.request_key(query);
        let source = Arc::clone(&self.source);
        let task_query = query.clone();
        let task_cancel = cancel.clone();
        let factory = move || async move {
            source
                .fetch_page(&task_query, options, &task_cancel)
                .await
                .map(Arc::new)
        };

        let requests = self.context.requests();
        let shared = async {
            if refresh {
                requests.dedupe_in_flight(&key, factory).await
            } else {
                requests.dedupe(&key, factory).await
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FeedError::Cancelled),
            result = shared => result,
        }
    }

    fn apply_page(
        &self,
        page: &FeedPage,
        query: &FeedQuery,
        fresh: bool,
        changes: FilterChanges,
        refresh: bool,
        previous: &[MediaItem],
    ) {
        let fetched = self.context.without_tombstoned(page.items.clone());
        let displayed = self.snapshot();

        let items = if !fresh {
            merge::append_images(&displayed.items, fetched)
        } else if changes.any() {
            fetched
        } else {
            // Items added while the request was out count as displayed too.
            let known = merge::append_images(previous, displayed.items);
            let recent = merge::filter_recent_uploads(
                &known,
                query,
                refresh,
                self.context.recency(),
                self.context.now(),
            );
            merge::merge_images(&known, fetched, recent)
        };
        let items = self.context.without_tombstoned(items);

        let pagination = if fresh {
            page.pagination
        } else {
            page.pagination.or(displayed.pagination)
        };

        if let Some(key) = QueryCache::writable_key(query) {
            self.context.write_cache(
                key,
                CacheSnapshot {
                    items: items.clone(),
                    pagination,
                },
            );
        }

        let count = items.len();
        self.state.send_modify(|state| {
            state.items = items;
            state.pagination = pagination;
            state.apply_filters_of(query);
            state.loading = false;
            state.error = None;
        });

        info!(
            category = ?query.category_name(),
            page = query.page_number(),
            items = count,
            "Feed updated"
        );
    }

    fn settle_without_result(&self, cleared: bool, previous: Vec<MediaItem>, error: Option<String>) {
        let restored = if cleared {
            Some(self.context.without_tombstoned(previous))
        } else {
            None
        };

        self.state.send_if_modified(|state| {
            let mut changed = state.loading || error.is_some();
            state.loading = false;
            if let Some(items) = restored.filter(|_| state.items.is_empty()) {
                changed |= !items.is_empty();
                state.items = items;
            }
            if error.is_some() {
                state.error = error;
            }
            changed
        });
    }
}
