//! Channel analysis: answers "does this channel show real recent sustained
//! performance on long-form videos?" deterministically from stats that are
//! already on record. Never touches raw data and never re-runs: the result
//! is persisted once per channel.

pub mod cycle;
pub mod scoring;

use crate::models::{ChannelAnalysis, LongVideo};

/// A video counts as long-form from this duration on (as persisted).
pub const LONG_VIDEO_SECONDS: i32 = 1200;
/// A gap of at least this many days between consecutive uploads closes the
/// current content cycle.
pub const CYCLE_GAP_DAYS: i64 = 150;

pub const MIN_SUBSCRIBERS: i64 = 100;
pub const MIN_LONG_VIDEOS_TOTAL: usize = 2;

pub const MIN_CYCLE_LONG_VIDEOS: usize = 2;
pub const MIN_HIGH_RATIO_VIDEOS: usize = 2;
pub const HIGH_RATIO_THRESHOLD: f64 = 0.3;
pub const MEDIAN_RATIO_THRESHOLD: f64 = 0.25;

/// Analyze one channel from its long-form videos.
///
/// Pure and deterministic: same inputs always produce the same row. The
/// decision chain is terminal at the first matching rule, each producing a
/// distinct disqualification reason for the audit trail.
pub fn analyze_channel(
    channel_url: &str,
    subscriber_count: Option<i64>,
    long_videos: Vec<LongVideo>,
) -> ChannelAnalysis {
    let Some(subscriber_count) = subscriber_count else {
        return ChannelAnalysis::disqualified(channel_url, None, "subscriber_count_missing");
    };

    if subscriber_count < MIN_SUBSCRIBERS {
        return ChannelAnalysis::disqualified(
            channel_url,
            Some(subscriber_count),
            "subscriber_count_below_100",
        );
    }

    if long_videos.len() < MIN_LONG_VIDEOS_TOTAL {
        return ChannelAnalysis::disqualified(
            channel_url,
            Some(subscriber_count),
            "lt_3_long_videos",
        );
    }

    let mut dated: Vec<LongVideo> = long_videos
        .into_iter()
        .filter(|v| v.upload_date.is_some())
        .collect();
    if dated.is_empty() {
        return ChannelAnalysis::disqualified(
            channel_url,
            Some(subscriber_count),
            "upload_date_missing",
        );
    }

    // Deterministic ordering: upload_date DESC, then video_id DESC to break
    // ties when dates are equal.
    dated.sort_by(|a, b| {
        (b.upload_date, b.video_id.as_str()).cmp(&(a.upload_date, a.video_id.as_str()))
    });

    let cycle = cycle::detect_current_cycle(&dated);
    let cycle_count = cycle.videos.len();

    let mut views: Vec<i64> = Vec::with_capacity(cycle_count);
    let mut ratios: Vec<f64> = Vec::with_capacity(cycle_count);
    for video in &cycle.videos {
        let view_count = video.view_count.unwrap_or(0).max(0);
        views.push(view_count);
        ratios.push(if subscriber_count > 0 {
            view_count as f64 / subscriber_count as f64
        } else {
            0.0
        });
    }

    let median_views = median_i64(&views);
    let max_views = views.iter().copied().max();
    let median_views_ratio = median_f64(&ratios);
    let max_views_ratio = ratios.iter().copied().fold(None, |acc: Option<f64>, r| {
        Some(acc.map_or(r, |a| a.max(r)))
    });

    let high_ratio_count = ratios.iter().filter(|&&r| r >= HIGH_RATIO_THRESHOLD).count();

    let (qualified, reason) = decide(cycle_count, high_ratio_count, median_views_ratio);

    ChannelAnalysis {
        channel_url: channel_url.to_string(),
        subscriber_count: Some(subscriber_count),
        cycle_start_date: cycle.start_date,
        cycle_long_videos_count: Some(cycle_count as i32),
        median_views,
        max_views,
        median_views_ratio,
        max_views_ratio,
        qualified,
        analysis_reason: reason.map(str::to_string),
    }
}

/// Apply the qualification rules to cycle-level metrics.
fn decide(
    cycle_count: usize,
    high_ratio_count: usize,
    median_views_ratio: Option<f64>,
) -> (bool, Option<&'static str>) {
    if cycle_count < MIN_CYCLE_LONG_VIDEOS {
        return (false, Some("cycle_long_videos_lt_3"));
    }
    if high_ratio_count < MIN_HIGH_RATIO_VIDEOS {
        return (false, Some("lt_2_videos_with_views_ratio_ge_0_3"));
    }
    match median_views_ratio {
        Some(ratio) if ratio >= MEDIAN_RATIO_THRESHOLD => (true, None),
        _ => (false, Some("median_views_ratio_below_0_25")),
    }
}

/// Median of integer values; an even count averages the middle two and
/// truncates toward zero.
fn median_i64(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some(((sorted[mid - 1] + sorted[mid]) as f64 / 2.0) as i64)
    }
}

/// Median of float values.
fn median_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}
