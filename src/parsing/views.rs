//! View-count text parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize_text;

/// Numeric token with an optional magnitude suffix. Longer suffixes come
/// first so "mil" is never read as the "m" (million) shorthand.
static VIEWS_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<num>(?:\d{1,3}(?:[.,]\d{3})+|\d+)(?:[.,]\d+)?)\s*(?P<suf>millones|millón|millon|billones|billon|mil|bn|[kmb])?",
    )
    .unwrap()
});

/// Words that surround the number in either locale.
const NOISE_TOKENS: &[&str] = &[
    "views",
    "view",
    "vistas",
    "visualizaciones",
    "reproducciones",
    "de",
    "•",
];

/// Explicit zero-view phrases.
const NO_VIEWS_PHRASES: &[&str] = &["no views", "sin vistas"];

/// Parse a views string into a count.
///
/// Handles common formats:
/// - "1,234 views", "1.234 visualizaciones"
/// - "1.2K views", "3,4 mil"
/// - "2.1M", "1B"
///
/// Returns 0 for explicit no-view phrases, None when no numeric token is
/// found. The result is clamped to >= 0.
pub fn parse_views(views_text: Option<&str>) -> Option<i64> {
    let text = normalize_text(views_text?)?;
    let lower = text.to_lowercase();

    if NO_VIEWS_PHRASES.iter().any(|p| lower.contains(p)) {
        return Some(0);
    }

    let mut cleaned = lower;
    for token in NOISE_TOKENS {
        cleaned = cleaned.replace(token, " ");
    }
    let cleaned = normalize_text(&cleaned)?;

    let caps = VIEWS_NUMBER_RE.captures(&cleaned)?;
    let num_raw = caps.name("num")?.as_str();
    let suffix = caps
        .name("suf")
        .map(|m| m.as_str().to_lowercase())
        .unwrap_or_default();

    let num = parse_human_number(num_raw, !suffix.is_empty())?;

    let multiplier: f64 = match suffix.as_str() {
        "k" | "mil" => 1_000.0,
        "m" | "millon" | "millón" | "millones" => 1_000_000.0,
        "b" | "bn" | "billon" | "billones" => 1_000_000_000.0,
        _ => 1.0,
    };

    Some(((num * multiplier) as i64).max(0))
}

/// Parse numbers like "1,234", "1.234", "1,2" into a float.
///
/// Separator policy:
/// - both '.' and ',' present: the rightmost one is the decimal separator,
///   the other marks thousands;
/// - only one present: decimal when a magnitude suffix follows, otherwise
///   thousands when it forms an exact three-digit group, else decimal.
fn parse_human_number(num_raw: &str, has_suffix: bool) -> Option<f64> {
    let s = num_raw.trim();
    if s.is_empty() {
        return None;
    }

    let has_comma = s.contains(',');
    let has_dot = s.contains('.');

    if has_comma && has_dot {
        let last_comma = s.rfind(',').unwrap();
        let last_dot = s.rfind('.').unwrap();
        let (thousands, decimal) = if last_comma > last_dot {
            ('.', ',')
        } else {
            (',', '.')
        };
        let normalized: String = s
            .chars()
            .filter(|&c| c != thousands)
            .map(|c| if c == decimal { '.' } else { c })
            .collect();
        return normalized.parse().ok();
    }

    if has_comma {
        if has_suffix {
            // Likely decimal in many locales: "3,4 mil".
            return s.replace(',', ".").parse().ok();
        }
        // Likely thousands: "1,234".
        return s.replace(',', "").parse().ok();
    }

    if has_dot {
        if has_suffix {
            // "1.2K" is decimal.
            return s.parse().ok();
        }
        // Could be thousands ("1.234" in ES) or decimal; assume thousands
        // only for an exact three-digit group.
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() == 2 && parts[1].len() == 3 {
            return format!("{}{}", parts[0], parts[1]).parse().ok();
        }
        return s.parse().ok();
    }

    s.parse().ok()
}
