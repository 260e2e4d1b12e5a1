//! Photofeed - a client-side consistency engine for a paginated photo feed.
//!
//! The crate keeps a displayed list of media items consistent across
//! concurrent fetches, category switches, local deletions and fresh uploads.
//! It coalesces identical requests, serves previously seen categories from a
//! bounded snapshot cache, and never resurrects deleted items.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing caches, merge rules and the feed store.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "photofeed";
