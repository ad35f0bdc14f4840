//! Run configuration, loaded once at startup and passed down explicitly.
//!
//! Every value has a default that targets Tom Lisi's page on LancasterOnline,
//! so the tool runs with no configuration file at all. A YAML file passed with
//! `--config` overrides any subset of keys, and CLI flags override the file.
//!
//! ```yaml
//! source:
//!   format: html-v2
//!   author: Tom Lisi
//! feed:
//!   image_mode: embed
//! order: reversed
//! output: feeds/tom_lisi.xml
//! ```

use crate::error::{FeedError, Result};
use crate::models::FeedMetadata;
use chrono_tz::Tz;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Which extraction strategy reads the fetched document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    /// Author page cards, images picked from known srcset widths.
    HtmlV1,
    /// Author page articles, last srcset candidate wins.
    HtmlV2,
    /// The site's search endpoint with `f=json`.
    #[default]
    Json,
}

impl SourceFormat {
    pub fn is_html(self) -> bool {
        matches!(self, SourceFormat::HtmlV1 | SourceFormat::HtmlV2)
    }
}

/// Order of records in the written feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RecordOrder {
    /// Keep the order the source listed them in.
    #[default]
    Document,
    /// Reverse the source order.
    Reversed,
    /// Sort by publication date, newest first; undated records go last.
    NewestFirst,
    /// Sort by publication date, oldest first; undated records go last.
    OldestFirst,
}

/// CSS selectors used by the HTML strategies.
///
/// All field selectors are evaluated inside a matched container. Keys left
/// out of a configuration file fall back to the `html-v2` layout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct HtmlSelectors {
    pub container: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub image: String,
    /// Attributes on the image element holding a srcset, tried in order.
    pub image_attrs: Vec<String>,
    pub date: String,
    pub date_attr: String,
}

impl HtmlSelectors {
    /// Card markup of the first author-page layout.
    pub fn v1() -> Self {
        Self {
            container: ".card-infinite".to_string(),
            title: ".tnt-headline".to_string(),
            link: ".image a[href]".to_string(),
            summary: "p.tnt-summary".to_string(),
            image: "img".to_string(),
            image_attrs: vec!["data-srcset".to_string()],
            date: "time[datetime]".to_string(),
            date_attr: "datetime".to_string(),
        }
    }

    /// Article markup of the later author-page layout.
    pub fn v2() -> Self {
        Self {
            container: "article.tnt-asset-type-article".to_string(),
            title: ".tnt-headline a".to_string(),
            link: ".tnt-headline a[href]".to_string(),
            summary: ".tnt-summary".to_string(),
            image: "img".to_string(),
            image_attrs: vec!["data-srcset".to_string(), "srcset".to_string()],
            date: "time[datetime]".to_string(),
            date_attr: "datetime".to_string(),
        }
    }
}

impl Default for HtmlSelectors {
    fn default() -> Self {
        Self::v2()
    }
}

/// Where articles come from and how to read them.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    pub format: SourceFormat,
    /// Scheme and host that relative links are resolved against.
    pub origin: String,
    /// Author page fetched by the HTML strategies.
    pub page_url: String,
    /// Search endpoint fetched by the JSON strategy.
    pub search_url: String,
    pub author: String,
    /// Value of the search `l` parameter.
    pub limit: u32,
    /// Overrides the built-in selectors of the chosen HTML strategy.
    pub selectors: Option<HtmlSelectors>,
    /// Widths kept by the `html-v1` srcset filter.
    pub srcset_widths: Vec<u32>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            format: SourceFormat::default(),
            origin: "https://lancasteronline.com".to_string(),
            page_url: "https://lancasteronline.com/staff/tomlisi/".to_string(),
            search_url: "https://lancasteronline.com/search/".to_string(),
            author: "Tom Lisi".to_string(),
            limit: 25,
            selectors: None,
            srcset_widths: vec![200, 225],
        }
    }
}

impl SourceConfig {
    pub fn origin_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.origin)?)
    }

    /// Selectors for the configured HTML strategy, custom ones first.
    pub fn html_selectors(&self) -> HtmlSelectors {
        match (&self.selectors, self.format) {
            (Some(custom), _) => custom.clone(),
            (None, SourceFormat::HtmlV1) => HtmlSelectors::v1(),
            (None, _) => HtmlSelectors::v2(),
        }
    }
}

/// Request headers and transport settings.
///
/// The search endpoint blocks obvious bots, so the defaults mimic a browser.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub referer: String,
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36"
                .to_string(),
            accept: "application/json, text/html;q=0.9, */*;q=0.8".to_string(),
            referer: "https://lancasteronline.com/".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry settings for rate-limited responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first request.
    pub max_attempts: usize,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay_secs: 3.0,
            max_delay_secs: 7.0,
            retry_statuses: vec![429],
        }
    }
}

/// The whole run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub feed: FeedMetadata,
    pub http: HttpConfig,
    pub retry: RetryConfig,
    /// IANA zone assumed for source dates without an offset.
    pub timezone: String,
    pub order: RecordOrder,
    pub output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            feed: FeedMetadata::default(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            timezone: "America/New_York".to_string(),
            order: RecordOrder::default(),
            output: PathBuf::from("tom_lisi_feed.xml"),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, or the defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = fs::read_to_string(path).await?;
                let config = Self::from_yaml(&raw)?;
                info!(path, format = ?config.source.format, "Loaded configuration file");
                Ok(config)
            }
            None => {
                info!("No configuration file given; using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to an all-default map.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn zone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| FeedError::config(format!("unknown timezone `{}`: {e}", self.timezone)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_target_lancasteronline() {
        let config = Config::default();
        assert_eq!(config.source.format, SourceFormat::Json);
        assert_eq!(config.source.origin, "https://lancasteronline.com");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.retry_statuses, vec![429]);
        assert_eq!(config.order, RecordOrder::Document);
        assert_eq!(config.output, PathBuf::from("tom_lisi_feed.xml"));
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
source:
  format: html-v1
  author: Jane Doe
order: newest-first
retry:
  max_attempts: 5
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.source.format, SourceFormat::HtmlV1);
        assert_eq!(config.source.author, "Jane Doe");
        assert_eq!(config.source.limit, 25);
        assert_eq!(config.order, RecordOrder::NewestFirst);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.min_delay_secs, 3.0);
        assert_eq!(config.timezone, "America/New_York");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        let config = Config::from_yaml("  \n").unwrap();
        assert_eq!(config.source.author, "Tom Lisi");
    }

    #[test]
    fn test_bad_yaml_is_error() {
        let err = Config::from_yaml("source: [1, 2").unwrap_err();
        assert!(matches!(err, FeedError::ConfigFile(_)));
    }

    #[test]
    fn test_html_selectors_follow_format() {
        let mut source = SourceConfig {
            format: SourceFormat::HtmlV1,
            ..SourceConfig::default()
        };
        assert_eq!(source.html_selectors(), HtmlSelectors::v1());

        source.format = SourceFormat::HtmlV2;
        assert_eq!(source.html_selectors(), HtmlSelectors::v2());

        let mut custom = HtmlSelectors::v2();
        custom.container = "div.story".to_string();
        source.selectors = Some(custom.clone());
        assert_eq!(source.html_selectors(), custom);
    }

    #[test]
    fn test_zone_parsing() {
        let mut config = Config::default();
        assert_eq!(config.zone().unwrap(), chrono_tz::America::New_York);

        config.timezone = "Mars/Olympus_Mons".to_string();
        assert!(matches!(config.zone(), Err(FeedError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        tokio::fs::write(&path, "output: out/feed.xml\n").await.unwrap();

        let config = Config::load(path.to_str()).await.unwrap();
        assert_eq!(config.output, PathBuf::from("out/feed.xml"));
    }
}
