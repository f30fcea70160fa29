//! Date and text formatting for display.
//!
//! The blog is written in Korean, so human-facing dates use the Korean long
//! form in Seoul time. Machine-facing dates (`<time datetime>`, RSS) stay UTC.

use chrono::{DateTime, Datelike, TimeDelta, Utc};

/// Seoul is UTC+9 all year round (no daylight saving).
const SEOUL_OFFSET_HOURS: i64 = 9;

/// Korean long date in Asia/Seoul, e.g. `2025년 1월 15일`.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use techblog_core::format::format_date;
///
/// // 15:00 UTC is already the next day in Seoul.
/// let at = Utc.with_ymd_and_hms(2025, 1, 14, 15, 0, 0).unwrap();
/// assert_eq!(format_date(at), "2025년 1월 15일");
/// ```
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    let local = at.naive_utc() + TimeDelta::hours(SEOUL_OFFSET_HOURS);
    format!("{}년 {}월 {}일", local.year(), local.month(), local.day())
}

/// RFC 3339 timestamp for `<time datetime="...">` attributes.
#[must_use]
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// HTTP-date style timestamp used for RSS `pubDate`,
/// e.g. `Tue, 14 Jan 2025 15:00:00 GMT`.
#[must_use]
pub fn rfc2822_gmt(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Cut `text` to at most `max_chars` characters, appending `...` when cut.
///
/// Counts Unicode scalar values, so Hangul is never split mid-character.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((byte_idx, _)) => {
            let mut cut = text.get(..byte_idx).unwrap_or(text).to_owned();
            cut.push_str("...");
            cut
        }
    }
}
