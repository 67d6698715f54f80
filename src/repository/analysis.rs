//! Analysis- and scoring-stage persistence.
//!
//! Analysis rows are written exactly once per channel (insert-if-absent);
//! score rows are replaced wholesale on every scoring run.

use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::channels::{ClaimedChannel, CountRow};
use super::models::{ChannelAnalysisRecord, ChannelRawRecord, ChannelScoreRecord, NewChannelAnalysis};
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{ChannelAnalysis, ChannelScore};
use crate::schema::{channels_analysis, channels_raw, channels_score};

/// Repository for channel analysis and scoring rows.
#[derive(Clone)]
pub struct AnalysisRepository {
    pool: AsyncSqlitePool,
}

impl AnalysisRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Atomically claim channels for analysis.
    ///
    /// The claim insert is a single atomic statement returning only the
    /// keys this worker actually won; fetching the full candidate rows is a
    /// separate, retryable read (`fetch_channels_raw`).
    pub async fn claim_channels_for_analysis(
        &self,
        limit: i64,
    ) -> Result<Vec<String>, DieselError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let claimed: Vec<ClaimedChannel> = diesel::sql_query(
            r#"WITH candidates AS (
                   SELECT r.channel_url AS channel_url
                   FROM channels_raw r
                   LEFT JOIN channels_analysis a
                       ON a.channel_url = r.channel_url
                   LEFT JOIN channels_analysis_claims c
                       ON c.channel_url = r.channel_url
                   WHERE a.channel_url IS NULL
                     AND c.channel_url IS NULL
                   ORDER BY r.extracted_at ASC
                   LIMIT $1
               )
               INSERT INTO channels_analysis_claims (channel_url, claimed_at)
               SELECT channel_url, $2 FROM candidates WHERE channel_url IS NOT NULL
               ON CONFLICT (channel_url) DO NOTHING
               RETURNING channel_url"#,
        )
        .bind::<diesel::sql_types::BigInt, _>(limit)
        .bind::<diesel::sql_types::Text, _>(Utc::now().to_rfc3339())
        .load(&mut conn)
        .await?;

        Ok(claimed.into_iter().map(|c| c.channel_url).collect())
    }

    /// Fetch full channels_raw rows for a set of claimed keys.
    pub async fn fetch_channels_raw(
        &self,
        urls: &[String],
    ) -> Result<Vec<ChannelRawRecord>, DieselError> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        channels_raw::table
            .filter(channels_raw::channel_url.eq_any(urls))
            .select(ChannelRawRecord::as_select())
            .load(&mut conn)
            .await
    }

    /// Count channels still claimable for analysis.
    pub async fn count_analysis_candidates(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let row: CountRow = diesel::sql_query(
            r#"SELECT COUNT(*) AS count
               FROM channels_raw r
               LEFT JOIN channels_analysis a
                   ON a.channel_url = r.channel_url
               LEFT JOIN channels_analysis_claims c
                   ON c.channel_url = r.channel_url
               WHERE a.channel_url IS NULL
                 AND c.channel_url IS NULL"#,
        )
        .get_result(&mut conn)
        .await?;
        Ok(row.count as u64)
    }

    /// Insert one analysis row. Returns false when the channel already has
    /// one; analysis is never re-run, so "already exists" is a normal
    /// outcome, not an error.
    pub async fn insert_channel_analysis(
        &self,
        analysis: &ChannelAnalysis,
    ) -> Result<bool, DieselError> {
        if analysis.channel_url.is_empty() {
            return Err(super::util::to_diesel_error("channel_url is required"));
        }

        let row = NewChannelAnalysis {
            channel_url: analysis.channel_url.clone(),
            subscriber_count: analysis.subscriber_count,
            cycle_start_date: analysis
                .cycle_start_date
                .map(|d| d.format("%Y-%m-%d").to_string()),
            cycle_long_videos_count: analysis.cycle_long_videos_count,
            median_views: analysis.median_views,
            max_views: analysis.max_views,
            median_views_ratio: analysis.median_views_ratio,
            max_views_ratio: analysis.max_views_ratio,
            qualified: Some(analysis.qualified),
            analysis_reason: analysis.analysis_reason.clone(),
            analyzed_at: Utc::now().to_rfc3339(),
        };

        let mut conn = self.pool.get().await?;
        let inserted = diesel::insert_or_ignore_into(channels_analysis::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        Ok(inserted > 0)
    }

    /// Fetch analysis rows for scoring, oldest first. Does NOT exclude
    /// already-scored channels; scoring can always be re-run.
    pub async fn fetch_channels_for_scoring(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<ChannelAnalysisRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = channels_analysis::table
            .select(ChannelAnalysisRecord::as_select())
            .order(channels_analysis::analyzed_at.asc())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query.load(&mut conn).await
    }

    /// Upsert one score row; re-running replaces every component.
    pub async fn upsert_channel_score(&self, score: &ChannelScore) -> Result<(), DieselError> {
        if score.channel_url.is_empty() {
            return Err(super::util::to_diesel_error("channel_url is required"));
        }

        let mut conn = self.pool.get().await?;
        diesel::replace_into(channels_score::table)
            .values((
                channels_score::channel_url.eq(&score.channel_url),
                channels_score::final_score.eq(score.final_score),
                channels_score::s_perf.eq(score.s_perf),
                channels_score::s_peak.eq(score.s_peak),
                channels_score::s_consistency.eq(score.s_consistency),
                channels_score::s_size.eq(score.s_size),
                channels_score::scored_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Top-ranked channels for operator inspection.
    pub async fn fetch_top_scores(&self, limit: i64) -> Result<Vec<ChannelScoreRecord>, DieselError> {
        let mut conn = self.pool.get().await?;
        channels_score::table
            .select(ChannelScoreRecord::as_select())
            .order(channels_score::final_score.desc())
            .limit(limit)
            .load(&mut conn)
            .await
    }

    /// Total analysis rows.
    pub async fn count_analyzed(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = channels_analysis::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Qualified channels.
    pub async fn count_qualified(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = channels_analysis::table
            .filter(channels_analysis::qualified.eq(true))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Total score rows.
    pub async fn count_scored(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = channels_score::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }
}
