//! Locally remembered deletions.

use std::collections::{HashSet, VecDeque};

use tracing::trace;

use crate::domain::entities::MediaId;

/// Default maximum number of remembered deletions.
pub const DEFAULT_TOMBSTONE_CAPACITY: usize = 1000;

/// Insertion-ordered id set bounded by FIFO trimming.
///
/// Re-inserting an id that is already present does not move it.
#[derive(Debug, Clone)]
pub struct TombstoneSet {
    order: VecDeque<MediaId>,
    members: HashSet<MediaId>,
    capacity: usize,
}

impl TombstoneSet {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
            capacity,
        }
    }

    /// Adds `id`, trimming the oldest entries if over capacity.
    ///
    /// Returns false if `id` was already tombstoned.
    pub fn insert(&mut self, id: MediaId) -> bool {
        if !self.members.insert(id.clone()) {
            return false;
        }
        self.order.push_back(id);
        self.trim();
        true
    }

    #[must_use]
    pub fn contains(&self, id: &MediaId) -> bool {
        self.members.contains(id)
    }

    /// Drops the oldest entries until back at capacity. Returns how many were dropped.
    pub fn trim(&mut self) -> usize {
        let mut dropped = 0;
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
                trace!(id = %oldest, "Tombstone expired");
                dropped += 1;
            }
        }
        dropped
    }

    /// Ids oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &MediaId> {
        self.order.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TombstoneSet {
    fn default() -> Self {
        Self::new(DEFAULT_TOMBSTONE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_contains() {
        let mut set = TombstoneSet::new(10);

        assert!(set.insert(MediaId::new("a")));
        assert!(!set.insert(MediaId::new("a")));
        assert!(set.contains(&MediaId::new("a")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut set = TombstoneSet::new(3);
        for id in ["a", "b", "c", "d"] {
            set.insert(MediaId::new(id));
        }

        assert_eq!(set.len(), 3);
        assert!(!set.contains(&MediaId::new("a")));
        assert!(set.contains(&MediaId::new("d")));
    }

    #[test]
    fn test_repeat_insert_does_not_promote() {
        let mut set = TombstoneSet::new(2);
        set.insert(MediaId::new("a"));
        set.insert(MediaId::new("b"));
        set.insert(MediaId::new("a"));
        set.insert(MediaId::new("c"));

        let remaining: Vec<_> = set.iter().map(MediaId::as_str).collect();
        assert_eq!(remaining, vec!["b", "c"]);
    }

    #[test]
    fn test_default_capacity_bound() {
        let mut set = TombstoneSet::default();
        for i in 0..=DEFAULT_TOMBSTONE_CAPACITY {
            set.insert(MediaId::new(i.to_string()));
        }

        assert_eq!(set.len(), DEFAULT_TOMBSTONE_CAPACITY);
        assert!(!set.contains(&MediaId::new("0")));
        assert!(set.contains(&MediaId::new(DEFAULT_TOMBSTONE_CAPACITY.to_string())));
    }
}
