//! RSS 2.0 serialization.
//!
//! Produces a pretty-printed UTF-8 document:
//!
//! ```text
//! <?xml version="1.0" encoding="UTF-8"?>
//! <rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
//!   <channel>
//!     <title>..</title>
//!     <link>..</link>
//!     <description>..</description>
//!     <item>
//!       <title>..</title>
//!       <link>..</link>
//!       <guid isPermaLink="true">..</guid>
//!       <description>..</description>
//!       <enclosure url=".." length="0" type="image/jpeg"/>
//!       <pubDate>Fri, 01 Mar 2024 08:00:00 -0500</pubDate>
//!     </item>
//!   </channel>
//! </rss>
//! ```

use crate::error::{FeedError, Result};
use crate::models::{ArticleRecord, FeedMetadata, ImageMode, RFC822_FORMAT};
use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write};
use tracing::{debug, info, instrument};

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const GENERATOR: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// Serialize `records` into an RSS 2.0 document.
///
/// Fails only when the channel itself is unusable (empty title or link).
/// Items with missing optional fields simply omit the matching element.
#[instrument(level = "info", skip_all, fields(items = records.len(), title = %meta.title))]
pub fn build(records: &[ArticleRecord], meta: &FeedMetadata) -> Result<Vec<u8>> {
    build_at(records, meta, Utc::now())
}

/// [`build`] with an explicit `lastBuildDate`.
pub fn build_at(
    records: &[ArticleRecord],
    meta: &FeedMetadata,
    built_at: DateTime<Utc>,
) -> Result<Vec<u8>> {
    validate(meta)?;

    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    rss.push_attribute(("xmlns:atom", ATOM_NS));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    write_text(&mut writer, "title", &meta.title)?;
    write_text(&mut writer, "link", &meta.link)?;
    write_text(&mut writer, "description", &meta.description)?;
    if let Some(self_link) = meta.self_link.as_deref() {
        writer
            .create_element("atom:link")
            .with_attributes([
                ("href", self_link),
                ("rel", "self"),
                ("type", "application/rss+xml"),
            ])
            .write_empty()?;
    }
    if let Some(language) = meta.language.as_deref().filter(|l| !l.is_empty()) {
        write_text(&mut writer, "language", language)?;
    }
    write_text(
        &mut writer,
        "lastBuildDate",
        &built_at.format(RFC822_FORMAT).to_string(),
    )?;
    write_text(&mut writer, "generator", GENERATOR)?;

    for record in records {
        write_item(&mut writer, record, meta.image_mode)?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    info!(bytes = bytes.len(), "Built RSS feed");
    Ok(bytes)
}

fn validate(meta: &FeedMetadata) -> Result<()> {
    if meta.title.trim().is_empty() {
        return Err(FeedError::config("feed title must not be empty"));
    }
    if meta.link.trim().is_empty() {
        return Err(FeedError::config("feed link must not be empty"));
    }
    Ok(())
}

fn write_text<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> std::io::Result<()> {
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn write_item<W: Write>(
    writer: &mut Writer<W>,
    record: &ArticleRecord,
    image_mode: ImageMode,
) -> std::io::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("item")))?;

    write_text(writer, "title", &record.title)?;
    if let Some(link) = &record.link {
        write_text(writer, "link", link.as_str())?;
        writer
            .create_element("guid")
            .with_attribute(("isPermaLink", "true"))
            .write_text_content(BytesText::new(link.as_str()))?;
    }

    let description = match (&record.image, image_mode) {
        (Some(image), ImageMode::Embed) => embed_image(record, image.as_str()),
        _ => record.description.clone(),
    };
    write_text(writer, "description", &description)?;

    if let (Some(image), ImageMode::Enclosure) = (&record.image, image_mode) {
        writer
            .create_element("enclosure")
            .with_attributes([
                ("url", image.as_str()),
                ("length", "0"),
                ("type", "image/jpeg"),
            ])
            .write_empty()?;
    }

    // pubDate is only written when the source date parsed.
    match record.pub_date_rfc822() {
        Some(date) => write_text(writer, "pubDate", &date)?,
        None => debug!(title = %record.title, "Item has no pubDate"),
    }

    writer.write_event(Event::End(BytesEnd::new("item")))?;
    Ok(())
}

/// HTML description with the image in front of the summary.
fn embed_image(record: &ArticleRecord, image: &str) -> String {
    let mut html = format!(
        r#"<img src="{}" alt="{}"/>"#,
        escape(image),
        escape(record.title.as_str())
    );
    if !record.description.is_empty() {
        html.push_str(&format!("<p>{}</p>", escape(record.description.as_str())));
    }
    html
}
