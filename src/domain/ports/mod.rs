//! Port definitions for external collaborators.

mod clock_port;
mod media_source_port;

pub use clock_port::Clock;
pub use media_source_port::{DEFAULT_PAGE_SIZE, FetchOptions, MediaSourcePort};
