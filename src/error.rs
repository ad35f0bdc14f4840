//! Error types for the fetch → extract → build → write pipeline.
//!
//! Only whole-run failures live here. Per-field problems (an unparseable date,
//! a selector that matches nothing inside one card) are recovered where they
//! happen and only logged.

use thiserror::Error;

/// Everything that can abort a run.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level failure talking to the source site.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The source answered with a status that is neither 200 nor retryable.
    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// Every attempt allowed by the retry policy was rate-limited.
    #[error("rate limited by {url}; gave up after {attempts} attempts")]
    RateLimited { url: String, attempts: usize },

    /// The JSON source returned a body that is not the expected document.
    #[error("malformed JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// A configured CSS selector failed to parse.
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    /// Configuration values that cannot produce a valid run or feed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The YAML configuration file could not be decoded.
    #[error("failed to read configuration file: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Extraction produced nothing, so no feed is written.
    #[error("no articles found")]
    NoArticles,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeedError {
    /// Creates a [`FeedError::Config`] with a custom message.
    pub fn config(msg: impl Into<String>) -> Self {
        FeedError::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message() {
        let err = FeedError::RateLimited {
            url: "https://example.com/search/".to_string(),
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "rate limited by https://example.com/search/; gave up after 3 attempts"
        );
    }

    #[test]
    fn test_config_helper() {
        let err = FeedError::config("feed title is empty");
        assert!(matches!(err, FeedError::Config(ref m) if m == "feed title is empty"));
    }
}
