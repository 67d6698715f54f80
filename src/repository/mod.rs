//! Repository layer for database persistence.
//!
//! All database access uses Diesel with diesel-async's SQLite wrapper.
//! Timestamps are stored as RFC 3339 TEXT; upload dates keep the raw
//! text the extractor produced and are parsed on read.

pub mod analysis;
pub mod channels;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod videos;

// Utilities
pub mod util;

pub use analysis::AnalysisRepository;
pub use channels::ChannelRepository;
pub use pool::{AsyncSqlitePool, DieselError};
pub use videos::VideoRepository;

use chrono::{DateTime, NaiveDate, Utc};

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

/// Parse a channel video upload date into a `NaiveDate`.
///
/// Accepted forms (best-effort, minimal):
/// - `YYYYMMDD` (yt-dlp's standard upload_date)
/// - `YYYY-MM-DD` / `YYYY/MM/DD`
///
/// Returns None when parsing fails.
pub fn parse_upload_date(value: Option<&str>) -> Option<NaiveDate> {
    let s = value?.trim();
    if s.is_empty() {
        return None;
    }

    let bytes = s.as_bytes();
    if s.len() >= 8 && bytes[..8].iter().all(|b| b.is_ascii_digit()) {
        let y: i32 = s[0..4].parse().ok()?;
        let m: u32 = s[4..6].parse().ok()?;
        let d: u32 = s[6..8].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if s.len() >= 10
        && matches!(bytes[4], b'-' | b'/')
        && matches!(bytes[7], b'-' | b'/')
    {
        let y: i32 = s.get(0..4)?.parse().ok()?;
        let m: u32 = s.get(5..7)?.parse().ok()?;
        let d: u32 = s.get(8..10)?.parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_upload_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(parse_upload_date(Some("20240305")), Some(expected));
        assert_eq!(parse_upload_date(Some("2024-03-05")), Some(expected));
        assert_eq!(parse_upload_date(Some("2024/03/05")), Some(expected));
    }

    #[test]
    fn test_parse_upload_date_rejects_garbage() {
        assert_eq!(parse_upload_date(None), None);
        assert_eq!(parse_upload_date(Some("")), None);
        assert_eq!(parse_upload_date(Some("soon")), None);
        // Out-of-range month
        assert_eq!(parse_upload_date(Some("20241305")), None);
    }

    #[test]
    fn test_parse_datetime_roundtrip() {
        let now = Utc::now();
        let parsed = parse_datetime(&now.to_rfc3339());
        assert_eq!(parsed.timestamp(), now.timestamp());
        assert_eq!(parse_datetime("not a date"), DateTime::UNIX_EPOCH);
    }
}
