//! Data models for scraped articles and the feed they are published in.
//!
//! - [`ArticleRecord`]: one normalized article, whichever source it came from
//! - [`FeedMetadata`]: channel-level values written once per feed
//! - [`ImageMode`]: how an article image is attached to its feed item

use chrono::{DateTime, FixedOffset};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use url::Url;

/// Title used when a card or search result has no headline.
pub const PLACEHOLDER_TITLE: &str = "No Title";

/// Format used for `pubDate` and `lastBuildDate`.
pub const RFC822_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// A single article, normalized from an HTML card or a JSON search result.
///
/// Links and images are stored as [`Url`], so anything held here is already
/// absolute. Records are built once per run and only reordered afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleRecord {
    pub title: String,
    pub link: Option<Url>,
    /// Plain-text summary, empty when the source had none.
    pub description: String,
    /// The largest image variant the source offered.
    pub image: Option<Url>,
    pub pub_date: Option<DateTime<FixedOffset>>,
}

impl ArticleRecord {
    /// Publication date rendered the way RSS `pubDate` expects it.
    pub fn pub_date_rfc822(&self) -> Option<String> {
        self.pub_date.map(|dt| dt.format(RFC822_FORMAT).to_string())
    }
}

/// Channel metadata for the generated feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeedMetadata {
    pub title: String,
    /// Canonical link of the channel, usually the author page.
    pub link: String,
    pub description: String,
    pub language: Option<String>,
    /// Where the feed itself is published, emitted as `atom:link rel="self"`.
    pub self_link: Option<String>,
    pub image_mode: ImageMode,
}

impl Default for FeedMetadata {
    fn default() -> Self {
        Self {
            title: "Tom Lisi's Articles - LancasterOnline".to_string(),
            link: "https://lancasteronline.com/staff/tomlisi/".to_string(),
            description: "Latest articles from journalist Tom Lisi on LancasterOnline"
                .to_string(),
            language: Some("en".to_string()),
            self_link: None,
            image_mode: ImageMode::Enclosure,
        }
    }
}

/// How an article image ends up in its `<item>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ImageMode {
    /// `<enclosure url=".." length="0" type="image/jpeg"/>`
    #[default]
    Enclosure,
    /// Wrap the description in HTML with a leading `<img>`.
    Embed,
    /// Drop images entirely.
    None,
}
