//! Bounded least-recently-used cache.

use std::hash::Hash;
use std::num::NonZeroUsize;

use lru::LruCache;
use tracing::trace;

/// Fixed-capacity key/value store with least-recently-used eviction.
///
/// Not synchronized; wrap it in a lock when shared.
#[derive(Debug)]
pub struct BoundedLru<K: Hash + Eq, V> {
    inner: LruCache<K, V>,
}

impl<K: Hash + Eq, V> BoundedLru<K, V> {
    /// Creates a new cache. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: LruCache::new(cap),
        }
    }

    /// Returns the value for `key`, marking it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    /// Returns the value for `key` without touching its recency.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.inner.peek(key)
    }

    /// Inserts or updates `key`, evicting the least recently used entry when full.
    ///
    /// Returns the evicted entry, if any.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        let replacing = self.inner.contains(&key);
        let displaced = self.inner.push(key, value);
        if replacing {
            return None;
        }
        if displaced.is_some() {
            trace!(capacity = self.inner.cap().get(), "Evicted least recently used entry");
        }
        displaced
    }

    /// Returns true if `key` is present. Does not affect recency.
    #[must_use]
    pub fn has(&self, key: &K) -> bool {
        self.inner.contains(key)
    }

    /// Removes `key`, returning its value.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.inner.pop(key)
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut cache = BoundedLru::new(10);
        cache.set("a", 1);

        assert_eq!(cache.get(&"a"), Some(&1));
        assert_eq!(cache.get(&"missing"), None);
    }

    #[test]
    fn test_eviction_order() {
        let mut cache = BoundedLru::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        let evicted = cache.set("c", 3);

        assert_eq!(evicted, Some(("a", 1)));
        assert!(!cache.has(&"a"));
        assert!(cache.has(&"b"));
        assert!(cache.has(&"c"));
    }

    #[test]
    fn test_get_promotes() {
        let mut cache = BoundedLru::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        let _ = cache.get(&"a");
        cache.set("c", 3);

        assert!(cache.has(&"a"));
        assert!(!cache.has(&"b"));
    }

    #[test]
    fn test_update_promotes_without_eviction() {
        let mut cache = BoundedLru::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        assert_eq!(cache.set("a", 10), None);
        cache.set("c", 3);

        assert_eq!(cache.peek(&"a"), Some(&10));
        assert!(!cache.has(&"b"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_has_does_not_promote() {
        let mut cache = BoundedLru::new(2);
        cache.set("a", 1);
        cache.set("b", 2);

        assert!(cache.has(&"a"));
        cache.set("c", 3);

        assert!(!cache.has(&"a"));
    }

    #[test]
    fn test_delete_and_clear() {
        let mut cache = BoundedLru::new(3);
        cache.set("a", 1);
        cache.set("b", 2);

        assert_eq!(cache.delete(&"a"), Some(1));
        assert_eq!(cache.delete(&"a"), None);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let cache: BoundedLru<&str, i32> = BoundedLru::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}
