//! Duration text parsing.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize_text;

static HOURS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:hours?|hrs?|horas?|h)\b").unwrap());
static MINUTES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:minutes?|minutos?|mins?|m)\b").unwrap());
static SECONDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*(?:seconds?|segundos?|secs?|s)\b").unwrap());

/// Parse a duration string into seconds.
///
/// Supports:
/// - "HH:MM:SS" / "MM:SS"
/// - "1 hour 2 minutes" / "1 h 2 min" / "1 hora 2 minutos"
///
/// Returns None when no hour/minute/second unit is recognized at all.
pub fn parse_duration(duration_text: Option<&str>) -> Option<i32> {
    let text = normalize_text(duration_text?)?;

    // Common colon format.
    if text.contains(':') {
        let parts: Vec<&str> = text.split(':').collect();
        let all_numeric = parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        if all_numeric && (2..=3).contains(&parts.len()) {
            let nums: Vec<i32> = parts.iter().filter_map(|p| p.parse().ok()).collect();
            if nums.len() == parts.len() {
                return Some(match nums.as_slice() {
                    [mm, ss] => mm * 60 + ss,
                    [hh, mm, ss] => hh * 3600 + mm * 60 + ss,
                    _ => unreachable!(),
                });
            }
        }
    }

    // Word format.
    let lower = text.to_lowercase().replace([',', '·'], " ");
    let lower = normalize_text(&lower)?;

    let hours = find_unit(&HOURS_RE, &lower);
    let minutes = find_unit(&MINUTES_RE, &lower);
    let seconds = find_unit(&SECONDS_RE, &lower);

    if hours == 0 && minutes == 0 && seconds == 0 {
        return None;
    }

    Some(hours * 3600 + minutes * 60 + seconds)
}

fn find_unit(re: &Regex, text: &str) -> i32 {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
