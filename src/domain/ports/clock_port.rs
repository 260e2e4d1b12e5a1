//! Clock abstraction.

use chrono::{DateTime, Utc};

/// Source of the current wall-clock time.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}
