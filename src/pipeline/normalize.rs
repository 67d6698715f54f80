//! Normalization stage: raw scraped text to typed estimates + validation
//! verdict.
//!
//! No claim table here: a normalized row's existence is the idempotence
//! guard, and insert-if-absent makes concurrent re-runs safe. A row is
//! produced for every raw video (even one where every parse failed) so
//! the reason for exclusion stays auditable.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::parsing::{parse_duration, parse_published, parse_views, validate};
use crate::repository::models::{NewNormalizedVideo, RawVideoRecord};
use crate::repository::{DieselError, VideoRepository};

/// Aggregate counts for one normalization run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NormalizeStats {
    pub fetched: usize,
    pub prepared: usize,
    pub inserted: usize,
    pub ignored: usize,
}

/// Normalize one raw row into its insert payload. Pure: parsing failures
/// degrade to None and validation only sees parsed values.
pub fn normalize_raw_video(raw: &RawVideoRecord, now: DateTime<Utc>) -> NewNormalizedVideo {
    let views_estimated = parse_views(raw.views_text.as_deref());
    let published_at_estimated = parse_published(raw.published_text.as_deref(), now);
    let duration_seconds_estimated = parse_duration(raw.duration_text.as_deref());

    let verdict = validate(views_estimated, duration_seconds_estimated);

    NewNormalizedVideo {
        video_id: raw.video_id.clone(),
        channel_url: raw.channel_url.clone(),
        query: raw.query.clone(),
        views_estimated,
        published_at_estimated: published_at_estimated.map(|dt| dt.to_rfc3339()),
        duration_seconds_estimated,
        validation_passed: verdict.passed,
        validation_reason: verdict.reason.map(str::to_string),
        normalized_at: now.to_rfc3339(),
    }
}

/// Fetch unprocessed raw videos, normalize + validate, persist the results.
pub async fn run_normalization(
    repo: &VideoRepository,
    limit: Option<i64>,
) -> Result<NormalizeStats, DieselError> {
    let raw_rows = repo.fetch_unprocessed_videos_raw(limit).await?;
    let mut stats = NormalizeStats {
        fetched: raw_rows.len(),
        ..Default::default()
    };
    if raw_rows.is_empty() {
        return Ok(stats);
    }

    let now = Utc::now();
    let prepared: Vec<NewNormalizedVideo> = raw_rows
        .iter()
        .map(|raw| normalize_raw_video(raw, now))
        .collect();
    stats.prepared = prepared.len();

    let (inserted, ignored) = repo.insert_videos_normalized(&prepared).await?;
    stats.inserted = inserted;
    stats.ignored = ignored;

    info!(
        fetched = stats.fetched,
        inserted = stats.inserted,
        ignored = stats.ignored,
        "normalization finished"
    );
    Ok(stats)
}
