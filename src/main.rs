use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Report, Result, eyre};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use photofeed::application::{FeedContext, FeedStore, FetchOutcome};
use photofeed::infrastructure::{AppConfig, CliArgs, HttpMediaSource, StorageManager, SystemClock};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let storage = StorageManager::new()?;
    let mut config = storage.load_config(args.config.as_deref())?;
    config.merge_with_args(args);
    Ok(config)
}

fn create_store(config: &AppConfig) -> Result<FeedStore> {
    let clock = Arc::new(SystemClock);
    let source = HttpMediaSource::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.feed.request_timeout_secs),
        clock.clone(),
    )?
    .with_page_size(config.feed.page_size);

    let context = Arc::new(FeedContext::new(&config.feed, clock));
    Ok(FeedStore::new(Arc::new(source), context))
}

fn check(outcome: FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::Failed(error) => {
            let message = error.user_message();
            Err(Report::new(error).wrap_err(message))
        }
        FetchOutcome::Cancelled => Err(eyre!("fetch cancelled")),
        other => {
            info!(outcome = ?other, "Fetch finished");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = photofeed::VERSION, base_url = %config.api_base_url, "Starting photofeed");

    let store = create_store(&config)?;

    check(store.fetch(args.feed_query(), None).await)?;
    if args.load_more {
        check(store.load_more(None).await)?;
    }
    for id in args.removed_ids() {
        store.remove(&id);
    }

    println!("{}", serde_json::to_string_pretty(&store.snapshot())?);

    Ok(())
}
