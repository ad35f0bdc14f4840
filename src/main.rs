//! # Byline Feed
//!
//! Builds an RSS feed of a single journalist's articles from a news site that
//! does not publish one. The default target is Tom Lisi on LancasterOnline.
//!
//! ## Usage
//!
//! ```sh
//! byline_feed -o tom_lisi_feed.xml
//! RUST_LOG=debug byline_feed --format html-v2
//! ```
//!
//! ## Architecture
//!
//! Each run is a straight pipeline with no state carried between runs:
//! 1. **Fetching**: one GET against the author page or search endpoint,
//!    retried on HTTP 429 with a randomized 3-7 second delay
//! 2. **Extraction**: the configured strategy maps the document to records
//! 3. **Ordering**: records are put in the configured order
//! 4. **Output**: the RSS document replaces the previous feed file
//!
//! A run that fails anywhere before the write leaves no new file behind.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod dates;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod utils;

use api::{HttpFetcher, RetryFetch, RetryPolicy};
use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("byline_feed starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref()).await.map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    args.apply(&mut config);
    info!(
        format = ?config.source.format,
        author = %config.source.author,
        output = %config.output.display(),
        "Configuration ready"
    );

    let policy = RetryPolicy::from_config(&config.retry)?;
    let fetcher = RetryFetch::new(HttpFetcher::new(&config.http)?, policy);

    match pipeline::run(&config, &fetcher).await {
        Ok(summary) => {
            let elapsed = start_time.elapsed();
            info!(
                path = %summary.path.display(),
                articles = summary.articles,
                bytes = summary.bytes,
                ?elapsed,
                "Execution complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Run failed; no feed written");
            Err(e.into())
        }
    }
}
