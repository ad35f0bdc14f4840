//! Small helpers shared by the scrapers, the fetcher and the writer.
//!
//! - Link resolution against the site origin
//! - Whitespace cleanup for scraped text
//! - Truncation for log previews
//! - Replace-on-write for the output file

use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};
use url::Url;

/// Resolve a scraped `href` against the site origin.
///
/// Absolute URLs pass through unchanged, relative paths are joined onto
/// `origin`, and anything that is not an http(s) URL afterwards (or does not
/// parse at all) yields `None`.
///
/// # Examples
///
/// ```ignore
/// let origin = Url::parse("https://lancasteronline.com").unwrap();
/// let link = resolve_url(&origin, "/news/123").unwrap();
/// assert_eq!(link.as_str(), "https://lancasteronline.com/news/123");
/// ```
pub fn resolve_url(origin: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match origin.join(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
        Ok(url) => {
            debug!(%url, "Ignoring non-http link");
            None
        }
        Err(e) => {
            debug!(raw, error = %e, "Unparseable link");
            None
        }
    }
}

/// Join text fragments, trimming each and collapsing runs of whitespace.
pub fn clean_text<'a>(fragments: impl IntoIterator<Item = &'a str>) -> String {
    fragments
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary before `max` bytes
/// and get `"…(+N bytes)"` appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Replace the file at `path` with `bytes`.
///
/// The bytes go to a sibling temp file first and are renamed over the target,
/// so readers never observe a half-written feed. Missing parent directories
/// are created.
#[instrument(level = "info", skip_all, fields(path = %path.display(), bytes = bytes.len()))]
pub async fn write_replacing(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "feed.xml".into());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, bytes).await?;
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    info!("Wrote feed file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://lancasteronline.com").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let link = resolve_url(&origin(), "/news/123").unwrap();
        assert_eq!(link.as_str(), "https://lancasteronline.com/news/123");
    }

    #[test]
    fn test_resolve_absolute_link_unchanged() {
        let link = resolve_url(&origin(), "https://example.com/a?b=c").unwrap();
        assert_eq!(link.as_str(), "https://example.com/a?b=c");
    }

    #[test]
    fn test_resolve_rejects_non_http() {
        assert_eq!(resolve_url(&origin(), "javascript:void(0)"), None);
        assert_eq!(resolve_url(&origin(), "mailto:desk@example.com"), None);
        assert_eq!(resolve_url(&origin(), "   "), None);
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(
            clean_text(["  Council ", "\n votes\t on ", "", "budget  "]),
            "Council votes on budget"
        );
        assert_eq!(clean_text(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_char_boundary() {
        let result = truncate_for_log("ééé", 3);
        assert_eq!(result, "é…(+4 bytes)");
    }

    #[tokio::test]
    async fn test_write_replacing_creates_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("feed.xml");

        write_replacing(&path, b"first").await.unwrap();
        write_replacing(&path, b"second").await.unwrap();

        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
        assert!(!dir.path().join("nested").join("feed.xml.tmp").exists());
    }
}
