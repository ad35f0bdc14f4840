//! Extraction strategies that turn a fetched document into article records.
//!
//! The site has changed its markup several times, so each layout gets its own
//! strategy behind the [`Extractor`] trait and the configuration picks one.
//!
//! # Supported Sources
//!
//! | Format | Module | Input | Image policy |
//! |--------|--------|-------|--------------|
//! | `html-v1` | [`html`] | Author page cards | srcset filtered to known widths, widest wins |
//! | `html-v2` | [`html`] | Author page articles | last srcset candidate |
//! | `json` | [`search_api`] | Search endpoint `results` | explicit image field |
//!
//! # Field Fallbacks
//!
//! Every strategy resolves fields independently and never fails on a single
//! container:
//! - missing title → [`PLACEHOLDER_TITLE`]
//! - relative link → resolved against the origin; unusable link → `None`
//! - missing description → empty string
//! - missing image or unparseable date → `None`
//!
//! A container with neither a title nor a link is dropped.

pub mod html;
pub mod search_api;

use crate::config::{Config, RecordOrder, SourceFormat};
use crate::dates::DateNormalizer;
use crate::error::Result;
use crate::models::{ArticleRecord, PLACEHOLDER_TITLE};
use std::cmp::Reverse;
use tracing::debug;
use url::Url;

/// Maps a raw document body to normalized records, in document order.
pub trait Extractor {
    fn extract(&self, body: &str) -> Result<Vec<ArticleRecord>>;
}

/// Build the extractor for the configured source format.
pub fn extractor_for(config: &Config) -> Result<Box<dyn Extractor>> {
    let origin = config.source.origin_url()?;
    let zone = config.zone()?;

    let extractor: Box<dyn Extractor> = match config.source.format {
        SourceFormat::HtmlV1 => Box::new(html::HtmlExtractor::new(
            origin,
            &config.source.html_selectors(),
            html::SrcsetPolicy::KnownWidths(config.source.srcset_widths.clone()),
            DateNormalizer::new(zone, false),
        )?),
        SourceFormat::HtmlV2 => Box::new(html::HtmlExtractor::new(
            origin,
            &config.source.html_selectors(),
            html::SrcsetPolicy::Last,
            DateNormalizer::new(zone, false),
        )?),
        SourceFormat::Json => Box::new(search_api::SearchApiExtractor::new(
            origin,
            DateNormalizer::new(zone, true),
        )),
    };
    Ok(extractor)
}

/// Fields collected from one container before fallbacks are applied.
#[derive(Debug, Default)]
pub(crate) struct ArticleDraft {
    pub title: Option<String>,
    pub link: Option<Url>,
    pub description: Option<String>,
    pub image: Option<Url>,
    pub pub_date: Option<chrono::DateTime<chrono::FixedOffset>>,
}

impl ArticleDraft {
    /// Apply the field fallbacks. Returns `None` when the container had
    /// neither a title nor a link.
    pub fn finish(self) -> Option<ArticleRecord> {
        let title = self.title.filter(|t| !t.is_empty());
        if title.is_none() && self.link.is_none() {
            debug!("Dropping container with neither title nor link");
            return None;
        }
        Some(ArticleRecord {
            title: title.unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            link: self.link,
            description: self.description.unwrap_or_default(),
            image: self.image,
            pub_date: self.pub_date,
        })
    }
}

/// Put records in the configured order. Date sorts are stable and keep
/// undated records at the end.
pub fn order_records(records: &mut Vec<ArticleRecord>, order: RecordOrder) {
    match order {
        RecordOrder::Document => {}
        RecordOrder::Reversed => records.reverse(),
        RecordOrder::NewestFirst => {
            records.sort_by_key(|r| (r.pub_date.is_none(), r.pub_date.map(Reverse)))
        }
        RecordOrder::OldestFirst => records.sort_by_key(|r| (r.pub_date.is_none(), r.pub_date)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset};

    fn record(title: &str, date: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            title: title.to_string(),
            link: None,
            description: String::new(),
            image: None,
            pub_date: date.map(|d| DateTime::<FixedOffset>::parse_from_rfc3339(d).unwrap()),
        }
    }

    fn titles(records: &[ArticleRecord]) -> Vec<&str> {
        records.iter().map(|r| r.title.as_str()).collect()
    }

    fn sample() -> Vec<ArticleRecord> {
        vec![
            record("b", Some("2024-03-02T00:00:00Z")),
            record("undated", None),
            record("c", Some("2024-03-03T00:00:00Z")),
            record("a", Some("2024-03-01T00:00:00Z")),
        ]
    }

    #[test]
    fn test_order_document_is_untouched() {
        let mut records = sample();
        order_records(&mut records, RecordOrder::Document);
        assert_eq!(titles(&records), ["b", "undated", "c", "a"]);
    }

    #[test]
    fn test_order_reversed() {
        let mut records = sample();
        order_records(&mut records, RecordOrder::Reversed);
        assert_eq!(titles(&records), ["a", "c", "undated", "b"]);
    }

    #[test]
    fn test_order_by_date() {
        let mut records = sample();
        order_records(&mut records, RecordOrder::NewestFirst);
        assert_eq!(titles(&records), ["c", "b", "a", "undated"]);

        order_records(&mut records, RecordOrder::OldestFirst);
        assert_eq!(titles(&records), ["a", "b", "c", "undated"]);
    }

    #[test]
    fn test_draft_fallbacks() {
        let link = Url::parse("https://lancasteronline.com/news/123").unwrap();
        let record = ArticleDraft {
            link: Some(link.clone()),
            ..ArticleDraft::default()
        }
        .finish()
        .unwrap();

        assert_eq!(record.title, PLACEHOLDER_TITLE);
        assert_eq!(record.link, Some(link));
        assert_eq!(record.description, "");
        assert_eq!(record.image, None);
        assert_eq!(record.pub_date, None);
    }

    #[test]
    fn test_draft_without_title_or_link_is_dropped() {
        let draft = ArticleDraft {
            title: Some(String::new()),
            description: Some("orphan summary".to_string()),
            ..ArticleDraft::default()
        };
        assert!(draft.finish().is_none());
    }

    #[test]
    fn test_extractor_for_rejects_bad_origin() {
        let mut config = Config::default();
        config.source.origin = "not a url".to_string();
        assert!(extractor_for(&config).is_err());
    }
}
