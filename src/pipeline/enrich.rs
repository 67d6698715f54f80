//! Enrichment stage: claim candidate channels, fetch real metadata through
//! the extraction collaborator, persist raw channel data, and record the
//! terminal outcome.
//!
//! One unit of work = one channel. The worker pool bounds concurrent
//! extractor invocations; the transient/permanent failure partition feeds
//! the claim/terminal-marker state machine: permanent failures get a
//! 'failed' marker and are never reclaimed, transient failures stay
//! unmarked and retryable.

use std::sync::Arc;

use tracing::{info, warn};

use crate::repository::ChannelRepository;
use crate::services::{parse_channel_metadata, parse_channel_videos, ChannelMetadataExtractor};
use crate::work_queue::{drain_queue, DrainStats, EnrichmentQueue, UnitOutcome, WorkQueueError};

/// Tuning for one enrichment run.
#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    /// Concurrent workers (each runs one extractor subprocess at a time).
    pub workers: usize,
    /// Channels claimed per batch.
    pub batch_size: usize,
    /// Recent videos to keep per channel.
    pub max_videos: usize,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            // Conservative: each worker spawns subprocesses against a
            // remote service that rate-limits aggressively.
            workers: 6,
            batch_size: 10,
            max_videos: 25,
        }
    }
}

/// Run the enrichment stage until no claimable channels remain.
pub async fn run_enrichment(
    repo: ChannelRepository,
    extractor: Arc<dyn ChannelMetadataExtractor>,
    options: EnrichOptions,
) -> Result<DrainStats, WorkQueueError> {
    let queue = Arc::new(EnrichmentQueue::new(repo.clone()));
    let max_videos = options.max_videos;

    let handler = move |channel_url: String| {
        let repo = repo.clone();
        let extractor = Arc::clone(&extractor);
        async move { enrich_one(&repo, extractor.as_ref(), &channel_url, max_videos).await }
    };

    let stats = drain_queue(queue, options.workers, options.batch_size, handler).await?;
    info!(
        claimed = stats.claimed,
        processed = stats.processed,
        skipped = stats.skipped,
        failed = stats.failed,
        "enrichment finished"
    );
    Ok(stats)
}

/// Process a single claimed channel.
async fn enrich_one(
    repo: &ChannelRepository,
    extractor: &dyn ChannelMetadataExtractor,
    channel_url: &str,
    max_videos: usize,
) -> UnitOutcome {
    // Idempotency re-check: another run may have finished this channel
    // between candidate selection and now.
    match repo.is_channel_processed(channel_url).await {
        Ok(true) => {
            info!(channel_url, "already processed, skipping");
            return UnitOutcome::Skipped;
        }
        Ok(false) => {}
        Err(e) => {
            warn!(channel_url, error = %e, "processed-marker lookup failed");
            return UnitOutcome::Failed;
        }
    }

    let dump = match extractor.fetch_channel(channel_url).await {
        Ok(dump) => dump,
        Err(e) if e.is_permanent() => {
            warn!(channel_url, error = %e, "permanent extraction failure, marking failed");
            if let Err(e) = repo
                .mark_channel_processed(channel_url, crate::models::ProcessedStatus::Failed)
                .await
            {
                warn!(channel_url, error = %e, "failed to record terminal marker");
            }
            return UnitOutcome::Failed;
        }
        Err(e) => {
            // Transient: leave no marker so the channel stays retryable.
            warn!(channel_url, error = %e, "transient extraction failure, will retry later");
            return UnitOutcome::Failed;
        }
    };

    let metadata = parse_channel_metadata(channel_url, &dump);
    let videos = parse_channel_videos(&dump, max_videos);

    let persisted = async {
        repo.upsert_channel_raw(&metadata).await?;
        repo.upsert_channel_videos(channel_url, &videos).await?;
        // Terminal marker only after fetch + persistence both succeeded.
        repo.mark_channel_processed(channel_url, crate::models::ProcessedStatus::Success)
            .await
    }
    .await;

    match persisted {
        Ok(()) => {
            info!(channel_url, videos = videos.len(), "channel enriched");
            UnitOutcome::Processed
        }
        Err(e) => {
            warn!(channel_url, error = %e, "enrichment persistence failed");
            UnitOutcome::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::models::NewNormalizedVideo;
    use crate::repository::videos::VideoRepository;
    use crate::repository::{migrations, AsyncSqlitePool};
    use crate::services::{ChannelDump, ExtractError};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    /// Canned extractor: a dump, a permanent failure, or a transient one
    /// per channel URL.
    struct FakeExtractor {
        responses: HashMap<String, Result<ChannelDump, &'static str>>,
    }

    #[async_trait]
    impl ChannelMetadataExtractor for FakeExtractor {
        async fn fetch_channel(&self, channel_url: &str) -> Result<ChannelDump, ExtractError> {
            match self.responses.get(channel_url) {
                Some(Ok(dump)) => Ok(dump.clone()),
                Some(Err("permanent")) => {
                    Err(ExtractError::Permanent("HTTP Error 404".to_string()))
                }
                _ => Err(ExtractError::Transient("connection reset".to_string())),
            }
        }
    }

    async fn seed_candidate(pool: &AsyncSqlitePool, video_id: &str, channel_url: &str) {
        let videos = VideoRepository::new(pool.clone());
        let run_id = videos.create_search_run("q", "exploration").await.unwrap();
        let raw: crate::models::ScrapedVideo = serde_json::from_value(serde_json::json!({
            "video_id": video_id,
            "channels": [{"name": "c", "url": channel_url}]
        }))
        .unwrap();
        videos.insert_videos_raw(&run_id, &[raw]).await.unwrap();
        videos
            .insert_videos_normalized(&[NewNormalizedVideo {
                video_id: video_id.to_string(),
                channel_url: Some(channel_url.to_string()),
                query: None,
                views_estimated: Some(5000),
                published_at_estimated: None,
                duration_seconds_estimated: Some(1500),
                validation_passed: true,
                validation_reason: None,
                normalized_at: Utc::now().to_rfc3339(),
            }])
            .await
            .unwrap();
    }

    fn dump(subs: i64) -> ChannelDump {
        serde_json::from_value(serde_json::json!({
            "channel_id": "UC1",
            "channel": "Creator",
            "subscriber_count": subs,
            "entries": [
                {"id": "v1", "upload_date": "20240601", "duration": 1500, "view_count": 700},
                {"id": "v2", "upload_date": "20240520", "duration": 1500, "view_count": 600}
            ]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_enrichment_state_machine() {
        let dir = tempfile::tempdir().unwrap();
        let pool = AsyncSqlitePool::from_path(&dir.path().join("test.db"));
        migrations::run(&pool).await.unwrap();
        let repo = ChannelRepository::new(pool.clone());

        let ok_url = "https://www.youtube.com/@ok";
        let gone_url = "https://www.youtube.com/@gone";
        let flaky_url = "https://www.youtube.com/@flaky";
        seed_candidate(&pool, "v-ok", ok_url).await;
        seed_candidate(&pool, "v-gone", gone_url).await;
        seed_candidate(&pool, "v-flaky", flaky_url).await;

        let mut responses = HashMap::new();
        responses.insert(ok_url.to_string(), Ok(dump(2000)));
        responses.insert(gone_url.to_string(), Err("permanent"));
        responses.insert(flaky_url.to_string(), Err("transient"));
        let extractor = Arc::new(FakeExtractor { responses });

        let stats = run_enrichment(
            repo.clone(),
            extractor,
            EnrichOptions {
                workers: 2,
                batch_size: 2,
                max_videos: 25,
            },
        )
        .await
        .unwrap();

        assert_eq!(stats.claimed, 3);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.failed, 2);

        // Success and permanent failure both got terminal markers.
        assert!(repo.is_channel_processed(ok_url).await.unwrap());
        assert!(repo.is_channel_processed(gone_url).await.unwrap());
        // Transient failure left no marker: retryable once its stale claim
        // is cleared by an operator.
        assert!(!repo.is_channel_processed(flaky_url).await.unwrap());
        assert_eq!(repo.count_stale_claims().await.unwrap(), 1);

        // The enriched channel's videos landed.
        let long = repo.fetch_channel_long_videos(ok_url).await.unwrap();
        assert_eq!(long.len(), 2);
    }
}
