//! One run: fetch → extract → order → build → write.
//!
//! Any failure before the write leaves the previous feed file untouched.

use crate::api::{FetchAsync, build_request, fetch_document};
use crate::config::Config;
use crate::error::{FeedError, Result};
use crate::outputs::rss;
use crate::scrapers::{extractor_for, order_records};
use crate::utils::write_replacing;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub articles: usize,
    pub bytes: usize,
    pub path: PathBuf,
}

#[instrument(
    level = "info",
    skip_all,
    fields(format = ?config.source.format, order = ?config.order, output = %config.output.display())
)]
pub async fn run<F: FetchAsync>(config: &Config, fetcher: &F) -> Result<RunSummary> {
    // Selector and timezone problems surface before any request is made.
    let extractor = extractor_for(config)?;

    let request = build_request(config)?;
    let body = fetch_document(fetcher, &request).await?;

    let mut records = extractor.extract(&body)?;
    if records.is_empty() {
        warn!(url = %request.url, "No articles found; not writing a feed");
        return Err(FeedError::NoArticles);
    }
    order_records(&mut records, config.order);

    let bytes = rss::build(&records, &config.feed)?;
    write_replacing(&config.output, &bytes).await?;

    info!(articles = records.len(), bytes = bytes.len(), "RSS feed saved");
    Ok(RunSummary {
        articles: records.len(),
        bytes: bytes.len(),
        path: config.output.clone(),
    })
}
