//! Feed store and the session context it shares with other stores.

mod context;
mod feed_store;
mod state;

pub use context::{FeedConfig, FeedContext};
pub use feed_store::FeedStore;
pub use state::{FeedState, FetchOutcome};
