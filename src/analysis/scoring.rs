//! Channel scoring: maps an analysis row to a normalized, explainable
//! composite score. Reads exclusively from the analysis row and is safe to
//! re-run for every channel at any time.

use tracing::debug;

use crate::models::ChannelScore;
use crate::repository::models::ChannelAnalysisRecord;

// Component weights. Fixed, not runtime-configurable; tuning happens here.
pub const W_PERF: f64 = 0.40;
pub const W_PEAK: f64 = 0.25;
pub const W_CONSISTENCY: f64 = 0.20;
pub const W_SIZE: f64 = 0.15;

/// Normalization ceilings for the ratio-driven components.
const PERF_CEILING: f64 = 1.0;
const PEAK_CEILING: f64 = 2.0;
/// Consistency saturates at this many cycle videos.
const CONSISTENCY_SATURATION: f64 = 10.0;
/// Size penalty saturates at 10^6 subscribers.
const SIZE_LOG10_CEILING: f64 = 6.0;

fn clamp01(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// Why a channel was excluded from scoring. Logged, not persisted: the
/// authoritative reason already lives on the analysis row.
pub fn exclusion_reason(row: &ChannelAnalysisRecord) -> Option<&'static str> {
    match row.qualified {
        Some(false) => return Some("qualified_false"),
        None => return Some("qualified_missing"),
        Some(true) => {}
    }
    if row.subscriber_count.is_none() {
        return Some("subscriber_count_missing");
    }
    if row.cycle_long_videos_count.is_none() {
        return Some("cycle_long_videos_count_missing");
    }
    if row.median_views_ratio.is_none() {
        return Some("median_views_ratio_missing");
    }
    if row.max_views_ratio.is_none() {
        return Some("max_views_ratio_missing");
    }
    None
}

/// Score one analyzed channel.
///
/// Excluded channels (not qualified, or missing any input metric) score 0.0
/// on every component so the ranking stays total.
pub fn score_channel(row: &ChannelAnalysisRecord) -> ChannelScore {
    if let Some(reason) = exclusion_reason(row) {
        debug!(channel_url = %row.channel_url, reason, "scoring skipped, score=0");
        return ChannelScore::zero(&row.channel_url);
    }

    // Guarded above; unwraps here would mean exclusion_reason missed a field.
    let subscriber_count = row.subscriber_count.unwrap_or(0);
    let cycle_count = row.cycle_long_videos_count.unwrap_or(0);
    let median_views_ratio = row.median_views_ratio.unwrap_or(0.0);
    let max_views_ratio = row.max_views_ratio.unwrap_or(0.0);

    let s_perf = clamp01(median_views_ratio / PERF_CEILING);
    let s_peak = clamp01(max_views_ratio / PEAK_CEILING);

    let s_consistency = if cycle_count <= 0 {
        0.0
    } else {
        clamp01((cycle_count as f64).log2() / CONSISTENCY_SATURATION.log2())
    };

    // Small and unknown channels get the full size reward.
    let s_size = if subscriber_count <= 0 {
        1.0
    } else {
        1.0 - clamp01((subscriber_count as f64).log10() / SIZE_LOG10_CEILING)
    };

    let final_score = clamp01(
        W_PERF * s_perf + W_PEAK * s_peak + W_CONSISTENCY * s_consistency + W_SIZE * s_size,
    );

    ChannelScore {
        channel_url: row.channel_url.clone(),
        final_score,
        s_perf,
        s_peak,
        s_consistency,
        s_size,
    }
}
