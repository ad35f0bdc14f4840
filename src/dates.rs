//! Publication date parsing and normalization.
//!
//! Source dates arrive in whatever shape the site emits: ISO 8601 with or
//! without an offset, RFC 2822, bare dates, epoch seconds, named zones.
//! [`parse_date`] tries the common layouts directly and hands anything else
//! to `dateparser`; [`DateNormalizer`] then pins offset-less values to a local
//! zone and optionally converts everything to UTC.

use chrono::{
    DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Utc,
};
use chrono_tz::Tz;
use tracing::warn;

/// Layouts that carry their own offset.
const OFFSET_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S %z",
    "%a, %e %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Layouts without an offset; the normalizer's zone applies.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%B %d, %Y %I:%M %p",
    "%b %d, %Y %I:%M %p",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%m/%d/%Y",
    "%Y/%m/%d",
];

/// Result of parsing a raw date string, before any zone is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// The source supplied an offset.
    Zoned(DateTime<FixedOffset>),
    /// Wall-clock time with no offset.
    Local(NaiveDateTime),
}

/// Parse a date string in any of the layouts seen on news sites.
///
/// Known layouts are tried first. Anything else goes through `dateparser`,
/// which reads wall-clock values in `zone` and understands zone
/// abbreviations such as `EST`. Date-only input means midnight.
/// Returns `None` when nothing matches.
pub fn parse_date(raw: &str, zone: &Tz) -> Option<ParsedDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ParsedDate::Zoned(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(ParsedDate::Zoned(dt));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(ParsedDate::Zoned(dt));
        }
    }

    if s.len() >= 9 && s.bytes().all(|b| b.is_ascii_digit()) {
        return s
            .parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(|dt| ParsedDate::Zoned(dt.fixed_offset()));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ParsedDate::Local(naive));
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(ParsedDate::Local);
        }
    }

    // Fall back to dateparser for looser formats
    dateparser::parse_with(s, zone, NaiveTime::MIN)
        .ok()
        .map(|dt| ParsedDate::Zoned(dt.with_timezone(zone).fixed_offset()))
}

/// Turns raw date strings into offset-aware timestamps.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    zone: Tz,
    to_utc: bool,
}

impl DateNormalizer {
    /// `zone` is assumed for dates without an offset. With `to_utc` every
    /// result is converted to `+0000`.
    pub fn new(zone: Tz, to_utc: bool) -> Self {
        Self { zone, to_utc }
    }

    /// Normalize `raw`, logging a warning and returning `None` if it cannot
    /// be parsed.
    pub fn normalize(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let parsed = match parse_date(raw, &self.zone) {
            Some(parsed) => parsed,
            None => {
                warn!(raw, "Invalid date format; leaving pubDate empty");
                return None;
            }
        };

        let dt = match parsed {
            ParsedDate::Zoned(dt) => dt,
            ParsedDate::Local(naive) => match self.localize(naive) {
                Some(dt) => dt,
                None => {
                    warn!(raw, zone = %self.zone, "Local time does not exist in zone");
                    return None;
                }
            },
        };

        if self.to_utc {
            Some(dt.with_timezone(&Utc).fixed_offset())
        } else {
            Some(dt)
        }
    }

    /// Pin a wall-clock time to the zone. Ambiguous times (DST fall-back)
    /// resolve to the earlier instant; skipped times (spring-forward) move
    /// forward by an hour.
    fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self.zone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Some(dt.fixed_offset()),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.fixed_offset()),
            LocalResult::None => self
                .zone
                .from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RFC822_FORMAT;
    use chrono_tz::America::New_York;

    fn rfc822(dt: DateTime<FixedOffset>) -> String {
        dt.format(RFC822_FORMAT).to_string()
    }

    #[test]
    fn test_naive_date_defaults_to_eastern_standard() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("2024-03-01T08:00:00").unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 08:00:00 -0500");
    }

    #[test]
    fn test_naive_date_in_daylight_time() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("2024-07-04 12:30:00").unwrap();
        assert_eq!(rfc822(dt), "Thu, 04 Jul 2024 12:30:00 -0400");
    }

    #[test]
    fn test_explicit_offset_is_kept() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("2024-03-01T08:00:00-08:00").unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 08:00:00 -0800");
    }

    #[test]
    fn test_utc_conversion() {
        let normalizer = DateNormalizer::new(New_York, true);
        let dt = normalizer.normalize("2024-03-01T08:00:00").unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 13:00:00 +0000");
    }

    #[test]
    fn test_rfc2822_input() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("Tue, 05 Mar 2024 17:45:00 -0500").unwrap();
        assert_eq!(rfc822(dt), "Tue, 05 Mar 2024 17:45:00 -0500");
    }

    #[test]
    fn test_epoch_seconds() {
        let normalizer = DateNormalizer::new(New_York, true);
        let dt = normalizer.normalize("1709298000").unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 13:00:00 +0000");
    }

    #[test]
    fn test_date_only_is_local_midnight() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("2024-03-01").unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 00:00:00 -0500");
    }

    #[test]
    fn test_spring_forward_gap_moves_ahead() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("2024-03-10T02:30:00").unwrap();
        assert_eq!(rfc822(dt), "Sun, 10 Mar 2024 03:30:00 -0400");
    }

    #[test]
    fn test_fall_back_takes_earlier_instant() {
        let normalizer = DateNormalizer::new(New_York, false);
        let dt = normalizer.normalize("2024-11-03T01:30:00").unwrap();
        assert_eq!(rfc822(dt), "Sun, 03 Nov 2024 01:30:00 -0400");
    }

    #[test]
    fn test_garbage_is_none() {
        let normalizer = DateNormalizer::new(New_York, false);
        assert_eq!(normalizer.normalize("last Tuesday-ish"), None);
        assert_eq!(normalizer.normalize(""), None);
    }

    #[test]
    fn test_parse_date_kinds() {
        assert!(matches!(
            parse_date("2024-03-01T08:00:00Z", &New_York),
            Some(ParsedDate::Zoned(_))
        ));
        assert!(matches!(
            parse_date("March 1, 2024", &New_York),
            Some(ParsedDate::Local(_))
        ));
    }

    #[test]
    fn test_loose_layouts() {
        let normalizer = DateNormalizer::new(New_York, false);
        let cases = [
            ("1 March 2024", "Fri, 01 Mar 2024 00:00:00 -0500"),
            ("03/01/2024 08:00", "Fri, 01 Mar 2024 08:00:00 -0500"),
            ("2024/03/01", "Fri, 01 Mar 2024 00:00:00 -0500"),
        ];
        for (raw, expected) in cases {
            let dt = normalizer.normalize(raw).unwrap();
            assert_eq!(rfc822(dt), expected, "input {raw:?}");
        }
    }

    #[test]
    fn test_named_zone_abbreviation() {
        let dt = DateNormalizer::new(New_York, true)
            .normalize("2024-03-01 08:00:00 EST")
            .unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 13:00:00 +0000");

        let dt = DateNormalizer::new(New_York, false)
            .normalize("2024-03-01 08:00:00 EST")
            .unwrap();
        assert_eq!(rfc822(dt), "Fri, 01 Mar 2024 08:00:00 -0500");
    }
}
