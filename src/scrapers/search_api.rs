//! Extractor for the site's search endpoint (`/search/?a=<author>&f=json`).
//!
//! The endpoint is undocumented. Observed responses look like:
//!
//! ```json
//! {
//!   "total": 2,
//!   "results": [
//!     {
//!       "title": "Council votes on budget",
//!       "url": "/news/local/council-votes/article_1.html",
//!       "summary": "The council met Tuesday.",
//!       "starttime": { "iso8601": "2024-03-01T08:00:00-05:00", "utc": 1709298000 },
//!       "preview": { "url": "https://bloximages.example.com/a.jpg" }
//!     }
//!   ]
//! }
//! ```
//!
//! Field names vary a little between site versions, so common aliases are
//! accepted. The image comes from an explicit field, never from a srcset.

use super::{ArticleDraft, Extractor};
use crate::dates::DateNormalizer;
use crate::error::Result;
use crate::models::ArticleRecord;
use crate::utils::{clean_text, resolve_url};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};
use url::Url;

const TITLE_KEYS: &[&str] = &["title", "headline"];
const LINK_KEYS: &[&str] = &["url", "link"];
const SUMMARY_KEYS: &[&str] = &["summary", "description"];
const TIME_KEYS: &[&str] = &["starttime", "published", "date"];
const IMAGE_KEYS: &[&str] = &["image", "image_url"];

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<Value>,
}

/// First non-null value among `keys`, with the key it was found under.
fn lookup<'a>(
    fields: &'a Map<String, Value>,
    keys: &[&'static str],
) -> Option<(&'static str, &'a Value)> {
    keys.iter()
        .find_map(|&key| fields.get(key).filter(|v| !v.is_null()).map(|v| (key, v)))
}

/// Publication time as a string, an epoch number, or an object carrying one
/// of those under `iso8601` or `utc`.
fn raw_time(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(|secs| secs.to_string()),
        Value::Object(obj) => ["iso8601", "utc"]
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(raw_time),
        _ => None,
    }
}

/// Extractor for JSON search results.
#[derive(Debug)]
pub struct SearchApiExtractor {
    origin: Url,
    dates: DateNormalizer,
}

impl SearchApiExtractor {
    pub fn new(origin: Url, dates: DateNormalizer) -> Self {
        Self { origin, dates }
    }

    /// Build a record field by field. A field of the wrong shape is logged
    /// and treated as absent; the record survives as long as it keeps a
    /// title or a link.
    fn to_record(&self, index: usize, result: &Value) -> Option<ArticleRecord> {
        let Some(fields) = result.as_object() else {
            warn!(index, "Search result is not an object; skipping");
            return None;
        };

        let text = |keys: &[&'static str]| match lookup(fields, keys) {
            Some((_, Value::String(s))) => {
                Some(clean_text(s.split_whitespace())).filter(|s| !s.is_empty())
            }
            Some((key, other)) => {
                warn!(index, field = key, value = %other, "Ignoring non-string field");
                None
            }
            None => None,
        };

        let preview = match fields.get("preview") {
            Some(Value::Object(preview)) => preview.get("url").and_then(Value::as_str),
            Some(Value::String(url)) => Some(url.as_str()),
            Some(Value::Null) | None => None,
            Some(other) => {
                warn!(index, field = "preview", value = %other, "Ignoring unusable field");
                None
            }
        };
        let image = preview
            .map(str::to_string)
            .or_else(|| text(IMAGE_KEYS))
            .and_then(|raw| resolve_url(&self.origin, &raw));

        let pub_date = match lookup(fields, TIME_KEYS) {
            Some((key, value)) => match raw_time(value) {
                Some(raw) => self.dates.normalize(&raw),
                None => {
                    warn!(index, field = key, value = %value, "Ignoring unusable date field");
                    None
                }
            },
            None => None,
        };

        ArticleDraft {
            title: text(TITLE_KEYS),
            link: text(LINK_KEYS).and_then(|raw| resolve_url(&self.origin, &raw)),
            description: text(SUMMARY_KEYS),
            image,
            pub_date,
        }
        .finish()
    }
}

impl Extractor for SearchApiExtractor {
    #[instrument(level = "info", skip_all, fields(bytes = body.len()))]
    fn extract(&self, body: &str) -> Result<Vec<ArticleRecord>> {
        let response: SearchResponse = serde_json::from_str(body)?;
        let total = response.results.len();

        let records: Vec<ArticleRecord> = response
            .results
            .iter()
            .enumerate()
            .filter_map(|(index, value)| self.to_record(index, value))
            .collect();

        info!(
            count = records.len(),
            dropped = total - records.len(),
            "Extracted articles from search results"
        );
        Ok(records)
    }
}
