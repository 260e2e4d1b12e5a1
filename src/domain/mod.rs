//! Domain layer with core feed entities, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{CategoryRef, FeedPage, FeedQuery, MediaId, MediaItem, Pagination};
pub use errors::FeedError;
pub use ports::{Clock, FetchOptions, MediaSourcePort};
