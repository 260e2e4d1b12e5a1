//! Memo of per-item favorite status.

use parking_lot::Mutex;

use crate::application::cache::BoundedLru;
use crate::domain::entities::MediaId;

/// Default number of remembered favorite flags.
pub const DEFAULT_FAVORITES_CAPACITY: usize = 500;

/// Thread-safe LRU memo of whether the user has favorited an item.
#[derive(Debug)]
pub struct FavoriteStatusCache {
    inner: Mutex<BoundedLru<MediaId, bool>>,
}

impl FavoriteStatusCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(BoundedLru::new(capacity)),
        }
    }

    /// Returns the remembered status, marking it most recently used.
    #[must_use]
    pub fn get(&self, id: &MediaId) -> Option<bool> {
        self.inner.lock().get(id).copied()
    }

    pub fn set(&self, id: MediaId, favorited: bool) {
        self.inner.lock().set(id, favorited);
    }

    pub fn invalidate(&self, id: &MediaId) {
        self.inner.lock().delete(id);
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for FavoriteStatusCache {
    fn default() -> Self {
        Self::new(DEFAULT_FAVORITES_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remembers_status() {
        let cache = FavoriteStatusCache::default();
        cache.set(MediaId::new("a"), true);
        cache.set(MediaId::new("b"), false);

        assert_eq!(cache.get(&MediaId::new("a")), Some(true));
        assert_eq!(cache.get(&MediaId::new("b")), Some(false));
        assert_eq!(cache.get(&MediaId::new("c")), None);
    }

    #[test]
    fn test_bounded() {
        let cache = FavoriteStatusCache::new(2);
        cache.set(MediaId::new("a"), true);
        cache.set(MediaId::new("b"), true);
        let _ = cache.get(&MediaId::new("a"));
        cache.set(MediaId::new("c"), true);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(&MediaId::new("b")), None);
        assert_eq!(cache.get(&MediaId::new("a")), Some(true));
    }

    #[test]
    fn test_invalidate() {
        let cache = FavoriteStatusCache::default();
        cache.set(MediaId::new("a"), true);
        cache.invalidate(&MediaId::new("a"));

        assert!(cache.is_empty());
    }
}
