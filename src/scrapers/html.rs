//! Author-page scraper for the HTML layouts.
//!
//! Both layouts list one container per article with a headline, a link, a
//! summary, a lazily-loaded image carrying a srcset, and a `<time>` element.
//! They differ in selectors and in how the image is chosen from the srcset,
//! which is captured by [`SrcsetPolicy`].

use super::{ArticleDraft, Extractor};
use crate::config::HtmlSelectors;
use crate::dates::DateNormalizer;
use crate::error::{FeedError, Result};
use crate::models::ArticleRecord;
use crate::utils::{clean_text, resolve_url};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument};
use url::Url;

/// A srcset width/density descriptor, optionally glued to the next candidate
/// when the separator comma has no trailing space (`200w,https://...`).
static DESCRIPTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)?)([wx])(?:,(.*))?$").unwrap());

/// How a single image is picked from a srcset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrcsetPolicy {
    /// Keep only candidates whose width is listed and take the widest.
    /// An empty list accepts every width-described candidate.
    KnownWidths(Vec<u32>),
    /// Take the last candidate, which sites list as the largest.
    Last,
}

/// One `url [descriptor]` entry of a srcset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate {
    pub url: String,
    /// Width in pixels for `w` descriptors.
    pub width: Option<u32>,
}

/// Split a srcset attribute into its candidates, in listed order.
pub fn parse_srcset(srcset: &str) -> Vec<SrcsetCandidate> {
    fn push_url(candidates: &mut Vec<SrcsetCandidate>, raw: &str) {
        let url = raw.trim_matches(',');
        if !url.is_empty() {
            candidates.push(SrcsetCandidate {
                url: url.to_string(),
                width: None,
            });
        }
    }

    let mut candidates: Vec<SrcsetCandidate> = Vec::new();
    for token in srcset.split_whitespace() {
        match DESCRIPTOR.captures(token) {
            Some(caps) if !candidates.is_empty() => {
                if &caps[2] == "w" {
                    if let Some(last) = candidates.last_mut() {
                        last.width = caps[1].parse().ok();
                    }
                }
                if let Some(rest) = caps.get(3) {
                    push_url(&mut candidates, rest.as_str());
                }
            }
            _ => push_url(&mut candidates, token),
        }
    }
    candidates
}

impl SrcsetPolicy {
    /// Pick one URL out of `srcset`, if any candidate qualifies.
    pub fn select<'a>(&self, candidates: &'a [SrcsetCandidate]) -> Option<&'a str> {
        match self {
            SrcsetPolicy::Last => candidates.last().map(|c| c.url.as_str()),
            SrcsetPolicy::KnownWidths(widths) => candidates
                .iter()
                .filter_map(|c| c.width.map(|w| (w, c)))
                .filter(|(w, _)| widths.is_empty() || widths.contains(w))
                .max_by_key(|(w, _)| *w)
                .map(|(_, c)| c.url.as_str()),
        }
    }
}

/// Selectors parsed once per run.
#[derive(Debug)]
struct CompiledSelectors {
    container: Selector,
    title: Selector,
    link: Selector,
    summary: Selector,
    image: Selector,
    image_attrs: Vec<String>,
    date: Selector,
    date_attr: String,
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| FeedError::Selector {
        selector: selector.to_string(),
        reason: format!("{e:?}"),
    })
}

impl CompiledSelectors {
    fn new(raw: &HtmlSelectors) -> Result<Self> {
        Ok(Self {
            container: compile(&raw.container)?,
            title: compile(&raw.title)?,
            link: compile(&raw.link)?,
            summary: compile(&raw.summary)?,
            image: compile(&raw.image)?,
            image_attrs: raw.image_attrs.clone(),
            date: compile(&raw.date)?,
            date_attr: raw.date_attr.clone(),
        })
    }
}

/// Extractor for the author-page HTML layouts.
#[derive(Debug)]
pub struct HtmlExtractor {
    origin: Url,
    selectors: CompiledSelectors,
    srcset: SrcsetPolicy,
    dates: DateNormalizer,
}

impl HtmlExtractor {
    pub fn new(
        origin: Url,
        selectors: &HtmlSelectors,
        srcset: SrcsetPolicy,
        dates: DateNormalizer,
    ) -> Result<Self> {
        Ok(Self {
            origin,
            selectors: CompiledSelectors::new(selectors)?,
            srcset,
            dates,
        })
    }

    fn extract_card(&self, card: ElementRef<'_>) -> Option<ArticleRecord> {
        let sel = &self.selectors;

        let title = card
            .select(&sel.title)
            .next()
            .map(|el| clean_text(el.text()));

        let link = card
            .select(&sel.link)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| resolve_url(&self.origin, href));

        let description = card
            .select(&sel.summary)
            .next()
            .map(|el| clean_text(el.text()));

        let image = card.select(&sel.image).next().and_then(|img| {
            let candidates = sel
                .image_attrs
                .iter()
                .filter_map(|attr| img.value().attr(attr))
                .map(parse_srcset)
                .find(|c| !c.is_empty())?;
            let url = self.srcset.select(&candidates)?;
            resolve_url(&self.origin, url)
        });

        let pub_date = card.select(&sel.date).next().and_then(|el| {
            let raw = el
                .value()
                .attr(&sel.date_attr)
                .map(str::to_string)
                .unwrap_or_else(|| clean_text(el.text()));
            self.dates.normalize(&raw)
        });

        ArticleDraft {
            title,
            link,
            description,
            image,
            pub_date,
        }
        .finish()
    }
}

impl Extractor for HtmlExtractor {
    #[instrument(level = "info", skip_all, fields(bytes = body.len(), policy = ?self.srcset))]
    fn extract(&self, body: &str) -> Result<Vec<ArticleRecord>> {
        let document = Html::parse_document(body);
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for (index, card) in document.select(&self.selectors.container).enumerate() {
            match self.extract_card(card) {
                Some(record) => {
                    debug!(index, title = %record.title, "Extracted article card");
                    records.push(record);
                }
                None => dropped += 1,
            }
        }

        info!(count = records.len(), dropped, "Extracted articles from HTML");
        Ok(records)
    }
}
