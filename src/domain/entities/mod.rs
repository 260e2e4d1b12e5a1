//! Domain entity definitions.

mod media;
mod page;
mod query;

pub use media::{CategoryRef, MediaId, MediaItem};
pub use page::{FeedPage, Pagination};
pub use query::FeedQuery;
