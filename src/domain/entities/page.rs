use serde::{Deserialize, Serialize};

use super::MediaItem;

/// Pagination metadata reported alongside a page of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    #[must_use]
    pub const fn new(page: u32, limit: u32, total: u64, pages: u32) -> Self {
        Self {
            page,
            limit,
            total,
            pages,
        }
    }

    /// Returns true if pages after the current one exist.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.page < self.pages
    }

    /// Decrements the total, never going below zero.
    pub const fn decrement_total(&mut self) {
        self.total = self.total.saturating_sub(1);
    }

    pub const fn increment_total(&mut self) {
        self.total = self.total.saturating_add(1);
    }
}

/// Canonical result of one network fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub items: Vec<MediaItem>,
    pub pagination: Option<Pagination>,
}

impl FeedPage {
    #[must_use]
    pub const fn new(items: Vec<MediaItem>, pagination: Option<Pagination>) -> Self {
        Self { items, pagination }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrement_total_floors_at_zero() {
        let mut pagination = Pagination::new(1, 20, 1, 1);

        pagination.decrement_total();
        pagination.decrement_total();

        assert_eq!(pagination.total, 0);
    }

    #[test]
    fn test_has_more() {
        assert!(Pagination::new(1, 20, 45, 3).has_more());
        assert!(!Pagination::new(3, 20, 45, 3).has_more());
    }
}
