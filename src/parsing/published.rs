//! Publish-date text parsing.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use super::normalize_text;

/// Lead-in phrases that precede the actual date in either locale.
const LEAD_INS: &[&str] = &[
    "premiered",
    "streamed",
    "hace",
    "emitido",
    "estrenado",
    "transmitido",
    "se emitió",
];

static RELATIVE_EN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(minute|min|hour|day|week|month|year)s?\b").unwrap());
static RELATIVE_ES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(minuto|hora|d[ií]a|dia|semana|mes|a[nñ]o)s?\b").unwrap());

/// Absolute fallback formats, tried in order.
const ABSOLUTE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%d %B %Y"];

/// Parse published text into an estimated UTC instant, resolved against
/// `now`.
///
/// Supports relative formats in EN/ES ("2 days ago", "hace 2 días",
/// "Streamed 3 weeks ago", "yesterday"/"ayer") with fixed unit mappings
/// (month = 30 days, year = 365 days; a simplification, not calendar
/// arithmetic), plus a few absolute formats ("Jan 3, 2024", "2024-01-03").
/// Returns None when nothing matches.
pub fn parse_published(published_text: Option<&str>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = normalize_text(published_text?)?;

    let mut lower = text.to_lowercase();
    for lead_in in LEAD_INS {
        lower = lower.replace(lead_in, " ");
    }
    let lower = normalize_text(&lower).unwrap_or_default();

    if lower.contains("yesterday") || lower.contains("ayer") {
        return Some(now - Duration::days(1));
    }

    let caps = RELATIVE_EN_RE
        .captures(&lower)
        .or_else(|| RELATIVE_ES_RE.captures(&lower));
    if let Some(caps) = caps {
        let qty: i64 = caps.get(1)?.as_str().parse().ok()?;
        let unit = deaccent(caps.get(2)?.as_str());
        let delta = match unit.as_str() {
            "minute" | "min" | "minuto" => Duration::minutes(qty),
            "hour" | "hora" => Duration::hours(qty),
            "day" | "dia" => Duration::days(qty),
            "week" | "semana" => Duration::weeks(qty),
            "month" | "mes" => Duration::days(30 * qty),
            "year" | "ano" => Duration::days(365 * qty),
            _ => return None,
        };
        return Some(now - delta);
    }

    for format in ABSOLUTE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(DateTime::from_naive_utc_and_offset(
                date.and_hms_opt(0, 0, 0)?,
                Utc,
            ));
        }
    }

    None
}

fn deaccent(unit: &str) -> String {
    unit.chars()
        .map(|c| match c {
            'í' => 'i',
            'ñ' => 'n',
            'á' => 'a',
            'é' => 'e',
            'ó' => 'o',
            'ú' => 'u',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_english() {
        assert_eq!(
            parse_published(Some("2 days ago"), now()),
            Some(now() - Duration::days(2))
        );
        assert_eq!(
            parse_published(Some("Streamed 3 weeks ago"), now()),
            Some(now() - Duration::weeks(3))
        );
        // Fixed mappings: month = 30 days, year = 365 days.
        assert_eq!(
            parse_published(Some("3 months ago"), now()),
            Some(now() - Duration::days(90))
        );
        assert_eq!(
            parse_published(Some("1 year ago"), now()),
            Some(now() - Duration::days(365))
        );
    }

    #[test]
    fn test_relative_spanish() {
        assert_eq!(
            parse_published(Some("hace 2 días"), now()),
            Some(now() - Duration::days(2))
        );
        assert_eq!(
            parse_published(Some("hace 5 horas"), now()),
            Some(now() - Duration::hours(5))
        );
        assert_eq!(
            parse_published(Some("hace 1 año"), now()),
            Some(now() - Duration::days(365))
        );
    }

    #[test]
    fn test_yesterday() {
        assert_eq!(
            parse_published(Some("yesterday"), now()),
            Some(now() - Duration::days(1))
        );
        assert_eq!(
            parse_published(Some("ayer"), now()),
            Some(now() - Duration::days(1))
        );
    }

    #[test]
    fn test_absolute_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
        assert_eq!(parse_published(Some("2024-01-03"), now()), Some(expected));
        assert_eq!(parse_published(Some("Jan 3, 2024"), now()), Some(expected));
        assert_eq!(parse_published(Some("3 Jan 2024"), now()), Some(expected));
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_published(None, now()), None);
        assert_eq!(parse_published(Some(""), now()), None);
        assert_eq!(parse_published(Some("sometime"), now()), None);
    }
}
