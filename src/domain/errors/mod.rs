//! Domain error types.

mod feed_error;

pub use feed_error::FeedError;
