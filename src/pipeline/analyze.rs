//! Analysis stage: claim enriched channels, run cycle detection and the
//! qualification rules, persist the result exactly once per channel.
//!
//! A processing error still persists a disqualified row carrying the
//! truncated diagnostic, so a poisoned channel is never reclaimed
//! indefinitely and the batch moves on.

use std::sync::Arc;

use tracing::{info, warn};

use crate::analysis::analyze_channel;
use crate::models::ChannelAnalysis;
use crate::repository::{AnalysisRepository, ChannelRepository, DieselError};
use crate::work_queue::{drain_queue, AnalysisQueue, DrainStats, UnitOutcome, WorkQueueError};

/// Tuning for one analysis run.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    pub workers: usize,
    pub batch_size: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            batch_size: 100,
        }
    }
}

/// Run the analysis stage until no claimable channels remain.
pub async fn run_analysis(
    channels: ChannelRepository,
    analysis: AnalysisRepository,
    options: AnalyzeOptions,
) -> Result<DrainStats, WorkQueueError> {
    let queue = Arc::new(AnalysisQueue::new(analysis.clone()));

    let handler = move |channel_url: String| {
        let channels = channels.clone();
        let analysis = analysis.clone();
        async move { analyze_one(&channels, &analysis, &channel_url).await }
    };

    let stats = drain_queue(queue, options.workers, options.batch_size, handler).await?;
    info!(
        claimed = stats.claimed,
        processed = stats.processed,
        failed = stats.failed,
        "analysis finished"
    );
    Ok(stats)
}

/// Analyze a single claimed channel and persist the outcome.
async fn analyze_one(
    channels: &ChannelRepository,
    analysis: &AnalysisRepository,
    channel_url: &str,
) -> UnitOutcome {
    let result = analyze_inner(channels, analysis, channel_url).await;

    match result {
        Ok(row) => match analysis.insert_channel_analysis(&row).await {
            Ok(true) => {
                info!(channel_url, qualified = row.qualified, "channel analyzed");
                UnitOutcome::Processed
            }
            Ok(false) => {
                info!(channel_url, "analysis already recorded, skipping");
                UnitOutcome::Skipped
            }
            Err(e) => {
                warn!(channel_url, error = %e, "analysis insert failed");
                UnitOutcome::Failed
            }
        },
        Err(e) => {
            // Persist a disqualified row with the diagnostic so the channel
            // is not re-claimed forever; failure to record it is just a
            // failed unit.
            let reason = format!("error: {}", truncate(&e.to_string(), 500));
            warn!(channel_url, reason, "analysis failed");
            let fail_row = ChannelAnalysis::disqualified(channel_url, None, reason);
            if let Err(e) = analysis.insert_channel_analysis(&fail_row).await {
                warn!(channel_url, error = %e, "failed to persist analysis failure row");
            }
            UnitOutcome::Failed
        }
    }
}

async fn analyze_inner(
    channels: &ChannelRepository,
    analysis: &AnalysisRepository,
    channel_url: &str,
) -> Result<ChannelAnalysis, DieselError> {
    // Separate, retryable fetch of the claimed channel's row.
    let urls = [channel_url.to_string()];
    let subscriber_count = analysis
        .fetch_channels_raw(&urls)
        .await?
        .into_iter()
        .next()
        .and_then(|r| r.subscriber_count);

    let long_videos = channels.fetch_channel_long_videos(channel_url).await?;
    Ok(analyze_channel(channel_url, subscriber_count, long_videos))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelMetadata, ChannelVideo};
    use crate::repository::{migrations, AsyncSqlitePool};

    async fn setup() -> (AsyncSqlitePool, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let pool = AsyncSqlitePool::from_path(&dir.path().join("test.db"));
        migrations::run(&pool).await.unwrap();
        (pool, dir)
    }

    async fn seed_channel(
        pool: &AsyncSqlitePool,
        url: &str,
        subs: Option<i64>,
        videos: &[(&str, &str, i32, i64)],
    ) {
        let repo = ChannelRepository::new(pool.clone());
        repo.upsert_channel_raw(&ChannelMetadata {
            channel_url: url.to_string(),
            channel_id: None,
            channel_name: None,
            subscriber_count: subs,
            is_verified: None,
        })
        .await
        .unwrap();
        let rows: Vec<ChannelVideo> = videos
            .iter()
            .map(|(id, date, duration, views)| ChannelVideo {
                video_id: id.to_string(),
                upload_date: Some(date.to_string()),
                duration_seconds: Some(*duration),
                view_count: Some(*views),
            })
            .collect();
        repo.upsert_channel_videos(url, &rows).await.unwrap();
    }

    #[tokio::test]
    async fn test_analysis_stage_persists_each_channel_once() {
        let (pool, _dir) = setup().await;
        let channels = ChannelRepository::new(pool.clone());
        let analysis = AnalysisRepository::new(pool.clone());

        let qualified_url = "https://www.youtube.com/@good";
        seed_channel(
            &pool,
            qualified_url,
            Some(1000),
            &[
                ("a", "20240615", 1500, 400),
                ("b", "20240601", 1500, 350),
            ],
        )
        .await;

        let small_url = "https://www.youtube.com/@small";
        seed_channel(&pool, small_url, Some(50), &[("c", "20240615", 1500, 400)]).await;

        let stats = run_analysis(
            channels,
            analysis.clone(),
            AnalyzeOptions {
                workers: 2,
                batch_size: 10,
            },
        )
        .await
        .unwrap();
        assert_eq!(stats.claimed, 2);
        assert_eq!(stats.processed, 2);

        let rows = analysis.fetch_channels_for_scoring(None).await.unwrap();
        assert_eq!(rows.len(), 2);
        let small = rows
            .iter()
            .find(|r| r.channel_url == small_url)
            .unwrap();
        assert_eq!(small.qualified, Some(false));
        assert_eq!(
            small.analysis_reason.as_deref(),
            Some("subscriber_count_below_100")
        );
        let good = rows
            .iter()
            .find(|r| r.channel_url == qualified_url)
            .unwrap();
        assert_eq!(good.qualified, Some(true));
        assert_eq!(good.cycle_long_videos_count, Some(2));

        // A second run finds nothing to claim: analysis never re-runs.
        let stats = run_analysis(
            ChannelRepository::new(pool.clone()),
            analysis,
            AnalyzeOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(stats.claimed, 0);
    }
}
