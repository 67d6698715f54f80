//! Channel-level domain types.

use chrono::NaiveDate;

/// Terminal outcome of the enrichment stage for one channel.
///
/// Absence of a marker means the channel is still retryable; `Failed`
/// records a permanent extractor failure so the channel is never reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessedStatus {
    Success,
    Failed,
}

impl ProcessedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Channel metadata as extracted by the enrichment collaborator.
/// All fields except the URL are nullable; upserts keep existing values
/// when a re-extraction comes back with less data.
#[derive(Debug, Clone)]
pub struct ChannelMetadata {
    pub channel_url: String,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub subscriber_count: Option<i64>,
    pub is_verified: Option<bool>,
}

/// One recent upload of a channel, as extracted. `upload_date` keeps the
/// extractor's raw text (usually `YYYYMMDD`); it is parsed on read.
#[derive(Debug, Clone)]
pub struct ChannelVideo {
    pub video_id: String,
    pub upload_date: Option<String>,
    pub duration_seconds: Option<i32>,
    pub view_count: Option<i64>,
}

/// A long-form video with its upload date already parsed, as consumed by
/// cycle analysis.
#[derive(Debug, Clone)]
pub struct LongVideo {
    pub video_id: String,
    pub upload_date: Option<NaiveDate>,
    pub duration_seconds: Option<i32>,
    pub view_count: Option<i64>,
}

/// Result of analyzing one channel. Persisted exactly once per channel.
#[derive(Debug, Clone)]
pub struct ChannelAnalysis {
    pub channel_url: String,
    pub subscriber_count: Option<i64>,
    pub cycle_start_date: Option<NaiveDate>,
    pub cycle_long_videos_count: Option<i32>,
    pub median_views: Option<i64>,
    pub max_views: Option<i64>,
    pub median_views_ratio: Option<f64>,
    pub max_views_ratio: Option<f64>,
    pub qualified: bool,
    pub analysis_reason: Option<String>,
}

impl ChannelAnalysis {
    /// A disqualified result carrying only the reason; metric fields stay
    /// NULL so the audit trail shows how far analysis got.
    pub fn disqualified(
        channel_url: impl Into<String>,
        subscriber_count: Option<i64>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            channel_url: channel_url.into(),
            subscriber_count,
            cycle_start_date: None,
            cycle_long_videos_count: None,
            median_views: None,
            max_views: None,
            median_views_ratio: None,
            max_views_ratio: None,
            qualified: false,
            analysis_reason: Some(reason.into()),
        }
    }
}

/// Composite score for one channel. Re-derivable at any time from the
/// analysis row; only the latest write is retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelScore {
    pub channel_url: String,
    pub final_score: f64,
    pub s_perf: f64,
    pub s_peak: f64,
    pub s_consistency: f64,
    pub s_size: f64,
}

impl ChannelScore {
    /// The zero score used for excluded channels.
    pub fn zero(channel_url: impl Into<String>) -> Self {
        Self {
            channel_url: channel_url.into(),
            final_score: 0.0,
            s_perf: 0.0,
            s_peak: 0.0,
            s_consistency: 0.0,
            s_size: 0.0,
        }
    }
}
