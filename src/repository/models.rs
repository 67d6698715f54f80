//! Diesel ORM records for database tables.
//!
//! These provide compile-time type checking for database operations.
//! Insert structs own their data; they are assembled from parsed or
//! extracted values rather than borrowed from a longer-lived row.

use diesel::prelude::*;

use crate::schema;

/// Raw video row as scraped (immutable once inserted).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::videos_raw)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RawVideoRecord {
    pub video_id: String,
    pub search_run_id: String,
    pub query: Option<String>,
    pub video_url: String,
    pub channel_url: Option<String>,
    pub duration_text: Option<String>,
    pub views_text: Option<String>,
    pub published_text: Option<String>,
    pub thumbnail_url: String,
    pub video_type: Option<String>,
    pub is_multi_creator: Option<bool>,
    pub discovered_at: String,
}

/// New raw video for insertion.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::videos_raw)]
pub struct NewRawVideo {
    pub video_id: String,
    pub search_run_id: String,
    pub query: Option<String>,
    pub video_url: String,
    pub channel_url: Option<String>,
    pub duration_text: Option<String>,
    pub views_text: Option<String>,
    pub published_text: Option<String>,
    pub thumbnail_url: String,
    pub video_type: Option<String>,
    pub is_multi_creator: Option<bool>,
    pub discovered_at: String,
}

/// Normalized video row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::videos_normalized)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NormalizedVideoRecord {
    pub video_id: String,
    pub channel_url: Option<String>,
    pub query: Option<String>,
    pub views_estimated: Option<i64>,
    pub published_at_estimated: Option<String>,
    pub duration_seconds_estimated: Option<i32>,
    pub validation_passed: bool,
    pub validation_reason: Option<String>,
    pub normalized_at: String,
}

/// New normalized video for insertion.
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::videos_normalized)]
pub struct NewNormalizedVideo {
    pub video_id: String,
    pub channel_url: Option<String>,
    pub query: Option<String>,
    pub views_estimated: Option<i64>,
    pub published_at_estimated: Option<String>,
    pub duration_seconds_estimated: Option<i32>,
    pub validation_passed: bool,
    pub validation_reason: Option<String>,
    pub normalized_at: String,
}

/// Raw channel metadata row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::channels_raw)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelRawRecord {
    pub channel_url: String,
    pub channel_id: Option<String>,
    pub channel_name: Option<String>,
    pub subscriber_count: Option<i64>,
    pub is_verified: Option<bool>,
    pub extracted_at: String,
}

/// Per-channel video row (bounded recent slice of a channel's uploads).
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::channel_videos_raw)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelVideoRecord {
    pub channel_url: String,
    pub video_id: String,
    pub upload_date: Option<String>,
    pub duration_seconds: Option<i32>,
    pub view_count: Option<i64>,
}

/// Channel analysis row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::channels_analysis)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelAnalysisRecord {
    pub channel_url: String,
    pub subscriber_count: Option<i64>,
    pub cycle_start_date: Option<String>,
    pub cycle_long_videos_count: Option<i32>,
    pub median_views: Option<i64>,
    pub max_views: Option<i64>,
    pub median_views_ratio: Option<f64>,
    pub max_views_ratio: Option<f64>,
    pub qualified: Option<bool>,
    pub analysis_reason: Option<String>,
    pub analyzed_at: String,
}

/// New channel analysis for insertion (insert-if-absent).
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = schema::channels_analysis)]
pub struct NewChannelAnalysis {
    pub channel_url: String,
    pub subscriber_count: Option<i64>,
    pub cycle_start_date: Option<String>,
    pub cycle_long_videos_count: Option<i32>,
    pub median_views: Option<i64>,
    pub max_views: Option<i64>,
    pub median_views_ratio: Option<f64>,
    pub max_views_ratio: Option<f64>,
    pub qualified: Option<bool>,
    pub analysis_reason: Option<String>,
    pub analyzed_at: String,
}

/// Channel score row.
#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = schema::channels_score)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ChannelScoreRecord {
    pub channel_url: String,
    pub final_score: f64,
    pub s_perf: f64,
    pub s_peak: f64,
    pub s_consistency: f64,
    pub s_size: f64,
    pub scored_at: String,
}
