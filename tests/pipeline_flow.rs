//! End-to-end pipeline test: ingest -> normalize -> enrich (mock
//! extractor) -> analyze -> score against a real SQLite database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::tempdir;

use ytscout::models::{ProcessedStatus, ScrapedVideo};
use ytscout::pipeline::{
    run_analysis, run_enrichment, run_ingest, run_normalization, run_scoring, AnalyzeOptions,
    EnrichOptions,
};
use ytscout::repository::{
    migrations, AnalysisRepository, AsyncSqlitePool, ChannelRepository, VideoRepository,
};
use ytscout::services::{ChannelDump, ChannelMetadataExtractor, ExtractError};

const ALPHA: &str = "https://www.youtube.com/@alpha";
const BETA: &str = "https://www.youtube.com/@beta";
const GAMMA: &str = "https://www.youtube.com/@gamma";
const DELTA: &str = "https://www.youtube.com/@delta";

struct FakeExtractor {
    dumps: HashMap<String, ChannelDump>,
}

#[async_trait]
impl ChannelMetadataExtractor for FakeExtractor {
    async fn fetch_channel(&self, channel_url: &str) -> Result<ChannelDump, ExtractError> {
        match self.dumps.get(channel_url) {
            Some(dump) => Ok(dump.clone()),
            None => Err(ExtractError::Permanent(format!(
                "yt-dlp failed for {channel_url}: HTTP Error 404: Not Found"
            ))),
        }
    }
}

fn scraped(video_id: &str, channel_url: &str, views_text: &str) -> ScrapedVideo {
    serde_json::from_value(serde_json::json!({
        "video_id": video_id,
        "query": "indie game devlog",
        "duration": "21:00",
        "views_text": views_text,
        "published_text": "2 days ago",
        "channels": [{"name": "creator", "url": channel_url}]
    }))
    .unwrap()
}

fn dump(subs: i64, videos: &[(&str, &str, i64)]) -> ChannelDump {
    let entries: Vec<serde_json::Value> = videos
        .iter()
        .map(|(id, date, views)| {
            serde_json::json!({
                "id": id,
                "upload_date": date,
                "duration": 1500,
                "view_count": views
            })
        })
        .collect();
    serde_json::from_value(serde_json::json!({
        "channel_id": "UCx",
        "channel": "Creator",
        "subscriber_count": subs,
        "entries": [{"title": "Creator - Videos", "entries": entries}]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_full_pipeline_produces_ranked_scores() {
    let dir = tempdir().unwrap();
    let pool = AsyncSqlitePool::from_path(&dir.path().join("pipeline.db"));
    migrations::run(&pool).await.unwrap();

    let videos = VideoRepository::new(pool.clone());
    let channels = ChannelRepository::new(pool.clone());
    let analysis = AnalysisRepository::new(pool.clone());

    // Stage 1: ingest one scraper batch. Delta's video fails validation
    // later, so delta never becomes an enrichment candidate.
    let batch = vec![
        scraped("vid-a1", ALPHA, "5,000 views"),
        scraped("vid-b1", BETA, "12K views"),
        scraped("vid-c1", GAMMA, "8.000 visualizaciones"),
        scraped("vid-d1", DELTA, "500 views"),
    ];
    let report = run_ingest(&videos, "indie game devlog", "exploration", &batch)
        .await
        .unwrap();
    assert_eq!(report.inserted, 4);

    // Re-ingesting the same batch is a counted no-op.
    let report = run_ingest(&videos, "indie game devlog", "exploration", &batch)
        .await
        .unwrap();
    assert_eq!(report.inserted, 0);
    assert_eq!(report.ignored, 4);
    assert_eq!(
        videos.fetch_executed_queries().await.unwrap(),
        vec!["indie game devlog".to_string()]
    );

    // Stage 2: normalize. Every raw row produces a normalized row, pass or
    // fail.
    let stats = run_normalization(&videos, None).await.unwrap();
    assert_eq!(stats.fetched, 4);
    assert_eq!(stats.inserted, 4);
    let stats = run_normalization(&videos, None).await.unwrap();
    assert_eq!(stats.fetched, 0);

    // Stage 3: enrich through the mock extractor. Gamma 404s permanently.
    let mut dumps = HashMap::new();
    dumps.insert(
        ALPHA.to_string(),
        dump(
            1000,
            &[
                ("a1", "20240615", 400),
                ("a2", "20240601", 350),
                ("a3", "20240520", 320),
            ],
        ),
    );
    dumps.insert(BETA.to_string(), dump(50, &[("b1", "20240610", 900)]));
    let extractor = Arc::new(FakeExtractor { dumps });

    let stats = run_enrichment(
        channels.clone(),
        extractor.clone(),
        EnrichOptions {
            workers: 3,
            batch_size: 2,
            max_videos: 25,
        },
    )
    .await
    .unwrap();
    assert_eq!(stats.claimed, 3);
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.failed, 1);

    assert!(channels.is_channel_processed(GAMMA).await.unwrap());
    assert_eq!(
        channels.count_processed(ProcessedStatus::Failed).await.unwrap(),
        1
    );

    // A second enrichment run has nothing left to claim.
    let stats = run_enrichment(channels.clone(), extractor, EnrichOptions::default())
        .await
        .unwrap();
    assert_eq!(stats.claimed, 0);

    // Stage 4: analyze. Alpha qualifies; beta is under the subscriber floor.
    let stats = run_analysis(
        channels.clone(),
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
    let alpha = rows.iter().find(|r| r.channel_url == ALPHA).unwrap();
    assert_eq!(alpha.qualified, Some(true));
    assert_eq!(alpha.cycle_long_videos_count, Some(3));
    assert_eq!(alpha.median_views, Some(350));
    assert_eq!(alpha.max_views, Some(400));
    assert_eq!(alpha.median_views_ratio, Some(0.35));
    assert_eq!(alpha.cycle_start_date.as_deref(), Some("2024-05-20"));
    let beta = rows.iter().find(|r| r.channel_url == BETA).unwrap();
    assert_eq!(beta.qualified, Some(false));
    assert_eq!(
        beta.analysis_reason.as_deref(),
        Some("subscriber_count_below_100")
    );

    // Stage 5: score. Deterministic, re-runnable, and total over analysis
    // rows.
    let stats = run_scoring(&analysis, None).await.unwrap();
    assert_eq!(stats.fetched, 2);
    assert_eq!(stats.scored, 1);
    assert_eq!(stats.excluded, 1);

    let top = analysis.fetch_top_scores(10).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].channel_url, ALPHA);
    let first_run_score = top[0].final_score;

    // perf 0.35, peak 0.2, consistency log2(3)/log2(10), size 0.5
    let expected = 0.40 * 0.35
        + 0.25 * 0.2
        + 0.20 * (3.0f64.log2() / 10.0f64.log2())
        + 0.15 * 0.5;
    assert!((first_run_score - expected).abs() < 1e-12);
    assert_eq!(top[1].channel_url, BETA);
    assert_eq!(top[1].final_score, 0.0);

    // Re-scoring yields bit-identical results and no extra rows.
    let stats = run_scoring(&analysis, None).await.unwrap();
    assert_eq!(stats.fetched, 2);
    let top = analysis.fetch_top_scores(10).await.unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0].final_score.to_bits(), first_run_score.to_bits());
}
