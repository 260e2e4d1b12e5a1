//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Media API client.
pub mod http;
/// Wall clock adapter.
pub mod system_clock;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageManager};
pub use http::HttpMediaSource;
pub use system_clock::SystemClock;
