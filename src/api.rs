//! HTTP fetching with a retry policy for rate-limited responses.
//!
//! # Architecture
//!
//! - [`FetchAsync`]: one GET, returning status and body
//! - [`HttpFetcher`]: the `reqwest` implementation with browser-like headers
//! - [`RetryFetch`]: decorator that retries any `FetchAsync` on retryable
//!   statuses according to a [`RetryPolicy`]
//!
//! # Retry Strategy
//!
//! - 3 attempts in total by default
//! - Uniform random delay of 3-7 seconds between attempts
//! - Only HTTP 429 is retried; every other status is handed back to the caller

use crate::config::{Config, HttpConfig, RetryConfig};
use crate::error::{FeedError, Result};
use crate::utils::truncate_for_log;
use rand::{Rng, rng};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// A GET request for the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Trait for one request/response exchange with the source site.
///
/// Implementors report any HTTP status as `Ok`; only transport failures are
/// errors. Status handling belongs to [`RetryFetch`] and the pipeline.
pub trait FetchAsync {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse>;
}

/// Build the request for the configured source.
///
/// HTML formats fetch the author page as-is. The JSON format appends `l`
/// (limit), `a` (author) and `f=json` to any query the search URL already
/// carries.
pub fn build_request(config: &Config) -> Result<FetchRequest> {
    let source = &config.source;
    if source.format.is_html() {
        return Ok(FetchRequest {
            url: source.page_url.clone(),
        });
    }

    let mut url = Url::parse(&source.search_url)?;
    url.query_pairs_mut()
        .append_pair("l", &source.limit.to_string())
        .append_pair("a", &source.author)
        .append_pair("f", "json");
    Ok(FetchRequest { url: url.into() })
}

/// Reqwest-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client that sends the configured `User-Agent`, `Accept` and
    /// `Referer` on every request.
    pub fn new(http: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header_value("user_agent", &http.user_agent)?);
        headers.insert(ACCEPT, header_value("accept", &http.accept)?);
        headers.insert(REFERER, header_value("referer", &http.referer)?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(http.timeout())
            .build()?;
        Ok(Self { client })
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FeedError::config(format!("invalid {name} header `{value}`: {e}")))
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let t0 = Instant::now();
        let response = self.client.get(&request.url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            preview = %truncate_for_log(&body, 200),
            "Fetched source document"
        );
        Ok(FetchResponse { status, body })
    }
}

/// When and how long to wait before retrying.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(3),
            max_delay: Duration::from_secs(7),
            retry_statuses: vec![429],
        }
    }
}

impl RetryPolicy {
    /// Validate retry settings from the configuration file.
    pub fn from_config(retry: &RetryConfig) -> Result<Self> {
        if retry.max_attempts == 0 {
            return Err(FeedError::config("retry.max_attempts must be at least 1"));
        }
        let min_delay = Duration::try_from_secs_f64(retry.min_delay_secs)
            .map_err(|e| FeedError::config(format!("retry.min_delay_secs: {e}")))?;
        let max_delay = Duration::try_from_secs_f64(retry.max_delay_secs)
            .map_err(|e| FeedError::config(format!("retry.max_delay_secs: {e}")))?;
        if min_delay > max_delay {
            return Err(FeedError::config(
                "retry.min_delay_secs must not exceed retry.max_delay_secs",
            ));
        }
        Ok(Self {
            max_attempts: retry.max_attempts,
            min_delay,
            max_delay,
            retry_statuses: retry.retry_statuses.clone(),
        })
    }

    pub fn is_retryable(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }

    /// Random delay in `[min_delay, max_delay]`.
    pub fn next_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        Duration::from_millis(rng().random_range(min..=max))
    }
}

/// Wrapper that retries rate-limited exchanges of any [`FetchAsync`].
///
/// Transport errors are returned immediately. A retryable status is retried
/// until `max_attempts` is reached, then reported as
/// [`FeedError::RateLimited`]. Any other response is passed through.
pub struct RetryFetch<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryFetch<T>
where
    T: FetchAsync,
{
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("policy", &self.policy)
            .finish()
    }
}

impl<T> FetchAsync for RetryFetch<T>
where
    T: FetchAsync,
{
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            attempt += 1;
            let response = self.inner.fetch(request).await?;

            if !self.policy.is_retryable(response.status) {
                info!(
                    attempt,
                    status = response.status,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    "fetch() completed"
                );
                return Ok(response);
            }

            if attempt >= self.policy.max_attempts {
                error!(
                    attempt,
                    max = self.policy.max_attempts,
                    status = response.status,
                    elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                    "fetch() exhausted retries"
                );
                return Err(FeedError::RateLimited {
                    url: request.url.clone(),
                    attempts: attempt,
                });
            }

            let delay = self.policy.next_delay();
            warn!(
                attempt,
                max = self.policy.max_attempts,
                status = response.status,
                ?delay,
                "Rate limited; backing off"
            );
            sleep(delay).await;
        }
    }
}

/// Fetch the source document, rejecting anything but HTTP 200.
#[instrument(level = "info", skip_all, fields(url = %request.url))]
pub async fn fetch_document<F: FetchAsync>(fetcher: &F, request: &FetchRequest) -> Result<String> {
    let response = fetcher.fetch(request).await?;
    if response.status != 200 {
        error!(status = response.status, "Failed to retrieve source document");
        return Err(FeedError::Status {
            status: response.status,
            url: request.url.clone(),
        });
    }
    info!(bytes = response.body.len(), "Retrieved source document");
    Ok(response.body)
}
