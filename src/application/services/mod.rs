//! Feed services: merge algorithms and small memo caches.

pub mod favorites;
pub mod merge;

pub use favorites::{DEFAULT_FAVORITES_CAPACITY, FavoriteStatusCache};
pub use merge::{FilterChanges, RecencyWindow};
