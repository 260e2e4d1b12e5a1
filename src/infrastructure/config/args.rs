use super::app_config::LogLevel;
use crate::domain::entities::{FeedQuery, MediaId};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "photofeed",
    version,
    about = "Fetch, cache and print a filtered photo feed",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", env = "PHOTOFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", env = "PHOTOFEED_LOG_PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Base URL of the media API.
    #[arg(long, value_name = "URL", env = "PHOTOFEED_API_URL")]
    pub api_base_url: Option<String>,

    /// Items requested per page.
    #[arg(long)]
    pub page_size: Option<u32>,

    /// HTTP request timeout in seconds.
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,

    /// Category to show.
    #[arg(long)]
    pub category: Option<String>,

    /// Free-text search term.
    #[arg(long)]
    pub search: Option<String>,

    /// Location filter.
    #[arg(long)]
    pub location: Option<String>,

    /// Page to fetch.
    #[arg(long)]
    pub page: Option<u32>,

    /// Page size for this request only.
    #[arg(long)]
    pub limit: Option<u32>,

    /// Bypass the query cache and reload from the server.
    #[arg(long)]
    pub refresh: bool,

    /// Remove an item from the feed before printing. May be repeated.
    #[arg(long = "remove", value_name = "ID")]
    pub remove: Vec<String>,

    /// Also fetch the next page after the first one.
    #[arg(long)]
    pub load_more: bool,
}

impl CliArgs {
    /// Builds the feed query described by the filter flags.
    #[must_use]
    pub fn feed_query(&self) -> FeedQuery {
        let mut query = FeedQuery::new();
        if let Some(search) = &self.search {
            query = query.with_search(search.clone());
        }
        if let Some(category) = &self.category {
            query = query.with_category(category.clone());
        }
        if let Some(location) = &self.location {
            query = query.with_location(location.clone());
        }
        if let Some(page) = self.page {
            query = query.with_page(page);
        }
        if let Some(limit) = self.limit {
            query = query.with_limit(limit);
        }
        if self.refresh {
            query = query.refreshed();
        }
        query
    }

    /// Ids passed with `--remove`.
    #[must_use]
    pub fn removed_ids(&self) -> Vec<MediaId> {
        self.remove.iter().map(|id| MediaId::new(id.as_str())).collect()
    }
}
