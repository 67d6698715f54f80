//! Idempotent schema creation.
//!
//! Safe to call from every worker at startup: `CREATE TABLE IF NOT EXISTS`
//! plus the indexes the candidate-selection queries rely on. There is no
//! versioned migration chain; the schema is additive and owned here.

use diesel_async::SimpleAsyncConnection;

use super::pool::{AsyncSqlitePool, DieselError};

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS search_runs (
    id TEXT PRIMARY KEY,
    query TEXT NOT NULL,
    mode TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT
);

CREATE TABLE IF NOT EXISTS videos_raw (
    video_id TEXT PRIMARY KEY,
    search_run_id TEXT NOT NULL REFERENCES search_runs(id),
    query TEXT,
    video_url TEXT NOT NULL,
    channel_url TEXT,
    duration_text TEXT,
    views_text TEXT,
    published_text TEXT,
    thumbnail_url TEXT NOT NULL,
    video_type TEXT,
    is_multi_creator INTEGER,
    discovered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS videos_normalized (
    video_id TEXT PRIMARY KEY REFERENCES videos_raw(video_id),
    channel_url TEXT,
    query TEXT,
    views_estimated BIGINT,
    published_at_estimated TEXT,
    duration_seconds_estimated INTEGER,
    validation_passed INTEGER NOT NULL,
    validation_reason TEXT,
    normalized_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channels_raw (
    channel_url TEXT PRIMARY KEY,
    channel_id TEXT,
    channel_name TEXT,
    subscriber_count BIGINT,
    is_verified INTEGER,
    extracted_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channel_videos_raw (
    channel_url TEXT NOT NULL,
    video_id TEXT NOT NULL,
    upload_date TEXT,
    duration_seconds INTEGER,
    view_count BIGINT,
    PRIMARY KEY (channel_url, video_id)
);

CREATE TABLE IF NOT EXISTS channels_processed (
    channel_url TEXT PRIMARY KEY,
    processed_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'success'
);

CREATE TABLE IF NOT EXISTS channels_discovery_claims (
    channel_url TEXT PRIMARY KEY,
    claimed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channels_analysis (
    channel_url TEXT PRIMARY KEY,
    subscriber_count BIGINT,
    cycle_start_date TEXT,
    cycle_long_videos_count INTEGER,
    median_views BIGINT,
    max_views BIGINT,
    median_views_ratio DOUBLE,
    max_views_ratio DOUBLE,
    qualified INTEGER,
    analysis_reason TEXT,
    analyzed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channels_analysis_claims (
    channel_url TEXT PRIMARY KEY,
    claimed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS channels_score (
    channel_url TEXT PRIMARY KEY,
    final_score DOUBLE NOT NULL,
    s_perf DOUBLE NOT NULL,
    s_peak DOUBLE NOT NULL,
    s_consistency DOUBLE NOT NULL,
    s_size DOUBLE NOT NULL,
    scored_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_raw_channel_url
    ON videos_raw (channel_url);
CREATE INDEX IF NOT EXISTS idx_videos_raw_discovered_at
    ON videos_raw (discovered_at);
CREATE INDEX IF NOT EXISTS idx_videos_raw_search_run_id
    ON videos_raw (search_run_id);
CREATE INDEX IF NOT EXISTS idx_videos_normalized_validation_passed
    ON videos_normalized (validation_passed);
CREATE INDEX IF NOT EXISTS idx_videos_normalized_normalized_at
    ON videos_normalized (normalized_at);
CREATE INDEX IF NOT EXISTS idx_channels_raw_extracted_at
    ON channels_raw (extracted_at);
CREATE INDEX IF NOT EXISTS idx_channel_videos_raw_channel_url
    ON channel_videos_raw (channel_url);
CREATE INDEX IF NOT EXISTS idx_channel_videos_raw_upload_date
    ON channel_videos_raw (upload_date);
CREATE INDEX IF NOT EXISTS idx_channels_processed_processed_at
    ON channels_processed (processed_at);
CREATE INDEX IF NOT EXISTS idx_channels_analysis_analyzed_at
    ON channels_analysis (analyzed_at);
CREATE INDEX IF NOT EXISTS idx_channels_score_scored_at
    ON channels_score (scored_at);
CREATE INDEX IF NOT EXISTS idx_channels_score_final_score
    ON channels_score (final_score);
"#;

/// Create all tables and indexes if they do not exist.
pub async fn run(pool: &AsyncSqlitePool) -> Result<(), DieselError> {
    let mut conn = pool.get().await?;
    conn.batch_execute(SCHEMA_SQL).await?;
    Ok(())
}
