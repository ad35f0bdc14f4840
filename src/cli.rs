//! Command-line interface definitions.
//!
//! Flags override whatever the configuration file (or the built-in defaults)
//! set. Only options that are commonly changed per run are exposed here;
//! everything else lives in the YAML file.

use crate::config::{Config, RecordOrder, SourceFormat};
use crate::models::ImageMode;
use clap::Parser;
use std::path::PathBuf;

/// Build an RSS feed of one journalist's articles.
///
/// # Examples
///
/// ```sh
/// # Defaults: Tom Lisi via the LancasterOnline search API
/// byline_feed
///
/// # Scrape the author page instead, oldest article first
/// byline_feed --format html-v2 --order oldest-first -o feeds/tom_lisi.xml
///
/// # Everything from a file
/// byline_feed --config byline.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Where to write the RSS file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Which page layout or endpoint to read articles from
    #[arg(short, long, value_enum)]
    pub format: Option<SourceFormat>,

    /// Order of items in the feed
    #[arg(long, value_enum)]
    pub order: Option<RecordOrder>,

    /// Author name sent to the search endpoint
    #[arg(long, env = "BYLINE_AUTHOR")]
    pub author: Option<String>,

    /// Maximum number of search results to request
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// How article images are attached to feed items
    #[arg(long, value_enum)]
    pub image_mode: Option<ImageMode>,
}

impl Cli {
    /// Apply the flags that were given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(format) = self.format {
            config.source.format = format;
        }
        if let Some(order) = self.order {
            config.order = order;
        }
        if let Some(author) = &self.author {
            config.source.author = author.clone();
        }
        if let Some(limit) = self.limit {
            config.source.limit = limit;
        }
        if let Some(image_mode) = self.image_mode {
            config.feed.image_mode = image_mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_flags_keeps_config() {
        let cli = Cli::parse_from(["byline_feed"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.output, PathBuf::from("tom_lisi_feed.xml"));
        assert_eq!(config.source.format, SourceFormat::Json);
        assert_eq!(config.order, RecordOrder::Document);
    }

    #[test]
    fn test_cli_long_flags() {
        let cli = Cli::parse_from([
            "byline_feed",
            "--config",
            "byline.yaml",
            "--output",
            "/tmp/feed.xml",
            "--format",
            "html-v1",
            "--order",
            "newest-first",
            "--author",
            "Jane Doe",
            "--limit",
            "10",
            "--image-mode",
            "embed",
        ]);
        assert_eq!(cli.config.as_deref(), Some("byline.yaml"));

        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.output, PathBuf::from("/tmp/feed.xml"));
        assert_eq!(config.source.format, SourceFormat::HtmlV1);
        assert_eq!(config.order, RecordOrder::NewestFirst);
        assert_eq!(config.source.author, "Jane Doe");
        assert_eq!(config.source.limit, 10);
        assert_eq!(config.feed.image_mode, ImageMode::Embed);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["byline_feed", "-o", "out.xml", "-f", "json", "-l", "5"]);
        assert_eq!(cli.output, Some(PathBuf::from("out.xml")));
        assert_eq!(cli.format, Some(SourceFormat::Json));
        assert_eq!(cli.limit, Some(5));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["byline_feed", "--format", "rss"]).is_err());
    }
}
