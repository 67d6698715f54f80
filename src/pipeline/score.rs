//! Scoring stage: a pure projection of channels_analysis into
//! channels_score.
//!
//! No claim mechanism here and none allowed: scoring is idempotent and
//! safe to re-run for every channel at any time, so the stage simply walks
//! all analysis rows and upserts.

use tracing::{info, warn};

use crate::analysis::scoring::{exclusion_reason, score_channel};
use crate::repository::{AnalysisRepository, DieselError};

/// Aggregate counts for one scoring run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreStats {
    pub fetched: usize,
    pub scored: usize,
    pub excluded: usize,
    pub failed: usize,
}

/// Score analysis rows (oldest first) and upsert the results.
pub async fn run_scoring(
    repo: &AnalysisRepository,
    limit: Option<i64>,
) -> Result<ScoreStats, DieselError> {
    let rows = repo.fetch_channels_for_scoring(limit).await?;
    let mut stats = ScoreStats {
        fetched: rows.len(),
        ..Default::default()
    };

    for row in &rows {
        let excluded = exclusion_reason(row).is_some();
        let score = score_channel(row);

        match repo.upsert_channel_score(&score).await {
            Ok(()) => {
                if excluded {
                    stats.excluded += 1;
                } else {
                    stats.scored += 1;
                }
            }
            Err(e) => {
                warn!(channel_url = %row.channel_url, error = %e, "score upsert failed");
                stats.failed += 1;
            }
        }
    }

    info!(
        fetched = stats.fetched,
        scored = stats.scored,
        excluded = stats.excluded,
        failed = stats.failed,
        "scoring finished"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChannelAnalysis;
    use crate::repository::{migrations, AsyncSqlitePool};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_scoring_is_rerunnable_and_total() {
        let dir = tempfile::tempdir().unwrap();
        let pool = AsyncSqlitePool::from_path(&dir.path().join("test.db"));
        migrations::run(&pool).await.unwrap();
        let repo = AnalysisRepository::new(pool);

        repo.insert_channel_analysis(&ChannelAnalysis {
            channel_url: "https://www.youtube.com/@good".to_string(),
            subscriber_count: Some(1000),
            cycle_start_date: NaiveDate::from_ymd_opt(2024, 6, 1),
            cycle_long_videos_count: Some(4),
            median_views: Some(400),
            max_views: Some(500),
            median_views_ratio: Some(0.4),
            max_views_ratio: Some(0.5),
            qualified: true,
            analysis_reason: None,
        })
        .await
        .unwrap();
        repo.insert_channel_analysis(&ChannelAnalysis::disqualified(
            "https://www.youtube.com/@bad",
            Some(50),
            "subscriber_count_below_100",
        ))
        .await
        .unwrap();

        let stats = run_scoring(&repo, None).await.unwrap();
        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.scored, 1);
        assert_eq!(stats.excluded, 1);

        // Re-running replaces rows rather than stacking them.
        let stats = run_scoring(&repo, None).await.unwrap();
        assert_eq!(stats.fetched, 2);
        assert_eq!(repo.count_scored().await.unwrap(), 2);

        let top = repo.fetch_top_scores(10).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].channel_url, "https://www.youtube.com/@good");
        assert!(top[0].final_score > 0.0);
        assert_eq!(top[1].final_score, 0.0);
    }
}
