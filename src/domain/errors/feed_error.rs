//! Feed fetch error types.

use thiserror::Error;

/// Errors produced at the network boundary of the feed.
///
/// Cloneable so one in-flight result can be handed to every joined caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum FeedError {
    #[error("request was cancelled")]
    Cancelled,

    #[error("network error: {message}")]
    Network { message: String },

    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("failed to decode response: {message}")]
    Decode { message: String },

    #[error("unexpected feed error: {message}")]
    Unexpected { message: String },
}

impl FeedError {
    /// Creates network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates unexpected error.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected {
            message: message.into(),
        }
    }

    /// Returns whether the error is a caller-driven cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns whether retrying later may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Server { status, .. } => *status >= 500 || *status == 429,
            Self::Cancelled | Self::Decode { .. } | Self::Unexpected { .. } => false,
        }
    }

    /// Message suitable for a transient notification.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Cancelled => "Request cancelled".to_string(),
            Self::Network { .. } => "Could not reach the server. Showing the last loaded photos.".to_string(),
            Self::Server { status, .. } if *status >= 500 => {
                "The server had a problem loading photos. Please try again.".to_string()
            }
            Self::Server { message, .. } => format!("Failed to load photos: {message}"),
            Self::Decode { .. } | Self::Unexpected { .. } => "Failed to load photos.".to_string(),
        }
    }
}
