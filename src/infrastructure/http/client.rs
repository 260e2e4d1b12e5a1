//! `reqwest` adapter for the media API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url, header};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::dto::{ErrorResponse, ImagesResponse};
use crate::domain::entities::{FeedPage, FeedQuery};
use crate::domain::errors::FeedError;
use crate::domain::ports::{Clock, DEFAULT_PAGE_SIZE, FetchOptions, MediaSourcePort};

const USER_AGENT: &str = concat!("photofeed/", env!("CARGO_PKG_VERSION"));
const CACHE_BUST_PARAM: &str = "_t";

/// Fetches feed pages from `{base_url}/images`.
pub struct HttpMediaSource {
    client: Client,
    base_url: String,
    page_size: u32,
    clock: std::sync::Arc<dyn Clock>,
}

impl std::fmt::Debug for HttpMediaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMediaSource")
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl HttpMediaSource {
    /// Creates a client for the API at `base_url`.
    ///
    /// # Errors
    /// Returns error if HTTP client creation fails.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        clock: std::sync::Arc<dyn Clock>,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::unexpected(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            clock,
        })
    }

    /// Page size sent when a query does not name one.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// URL for `query`, without any cache-busting token.
    ///
    /// # Errors
    /// Returns error if the configured base URL is not a valid URL.
    pub fn images_url(&self, query: &FeedQuery) -> Result<Url, FeedError> {
        Url::parse_with_params(
            &format!("{}/images", self.base_url),
            query.query_pairs(self.page_size),
        )
        .map_err(|e| FeedError::unexpected(format!("invalid API base URL: {e}")))
    }

    async fn send(&self, query: &FeedQuery, options: FetchOptions) -> Result<FeedPage, FeedError> {
        let mut url = self.images_url(query)?;
        if options.bust_cache {
            let token = self.clock.now().timestamp_millis().to_string();
            url.query_pairs_mut().append_pair(CACHE_BUST_PARAM, &token);
        }

        debug!(url = %url, bust_cache = options.bust_cache, "Fetching feed page");

        let mut request = self.client.get(url);
        if options.bust_cache {
            request = request.header(header::CACHE_CONTROL, "no-cache");
        }

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Failed to reach media API");
            if e.is_timeout() {
                FeedError::network("request timed out")
            } else if e.is_connect() {
                FeedError::network("failed to connect to media API")
            } else {
                FeedError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, response).await);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::network(format!("failed to read response: {e}")))?;

        decode_page(&body)
    }

    async fn handle_error_response(status: StatusCode, response: reqwest::Response) -> FeedError {
        let message = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .and_then(ErrorResponse::into_message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        warn!(status = status.as_u16(), message = %message, "Media API returned an error");
        FeedError::server(status.as_u16(), message)
    }
}

/// Decodes an `/images` response body.
///
/// # Errors
/// Returns [`FeedError::Decode`] if the body matches no known shape.
pub fn decode_page(body: &str) -> Result<FeedPage, FeedError> {
    serde_json::from_str::<ImagesResponse>(body)
        .map(FeedPage::from)
        .map_err(|e| {
            warn!(error = %e, "Failed to parse feed response");
            FeedError::decode(e.to_string())
        })
}

#[async_trait]
impl MediaSourcePort for HttpMediaSource {
    async fn fetch_page(
        &self,
        query: &FeedQuery,
        options: FetchOptions,
        cancel: &CancellationToken,
    ) -> Result<FeedPage, FeedError> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FeedError::Cancelled),
            result = self.send(query, options) => result,
        }
    }

    fn request_key(&self, query: &FeedQuery) -> String {
        match self.images_url(query) {
            Ok(url) => format!("GET:{url}:"),
            Err(_) => format!("GET:{}/images:", self.base_url),
        }
    }
}
