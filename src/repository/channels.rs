//! Channel enrichment persistence: raw channel metadata, per-channel video
//! slices, terminal processed markers, and the discovery-stage claim queue.
//!
//! Upserts use a null-preserving merge: a re-extraction that comes back with
//! less data never erases values already on record.

use std::collections::HashSet;

use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::ChannelVideoRecord;
use super::parse_upload_date;
use super::pool::{AsyncSqlitePool, DieselError};
use crate::analysis::LONG_VIDEO_SECONDS;
use crate::models::{ChannelMetadata, ChannelVideo, LongVideo, ProcessedStatus};
use crate::schema::{channel_videos_raw, channels_discovery_claims, channels_processed};

/// Row returned by claim statements (`RETURNING channel_url`).
#[derive(diesel::QueryableByName)]
pub(crate) struct ClaimedChannel {
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub channel_url: String,
}

#[derive(diesel::QueryableByName)]
pub(crate) struct CountRow {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

/// Repository for the channel enrichment stage.
#[derive(Clone)]
pub struct ChannelRepository {
    pool: AsyncSqlitePool,
}

impl ChannelRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Upsert one raw channel row with a null-preserving merge.
    pub async fn upsert_channel_raw(&self, channel: &ChannelMetadata) -> Result<(), DieselError> {
        if channel.channel_url.is_empty() {
            return Err(super::util::to_diesel_error("channel_url is required"));
        }

        let mut conn = self.pool.get().await?;
        diesel::sql_query(
            r#"INSERT INTO channels_raw
               (channel_url, channel_id, channel_name, subscriber_count, is_verified, extracted_at)
               VALUES ($1, $2, $3, $4, $5, $6)
               ON CONFLICT (channel_url) DO UPDATE SET
                   channel_id = COALESCE(excluded.channel_id, channels_raw.channel_id),
                   channel_name = COALESCE(excluded.channel_name, channels_raw.channel_name),
                   subscriber_count = COALESCE(excluded.subscriber_count, channels_raw.subscriber_count),
                   is_verified = COALESCE(excluded.is_verified, channels_raw.is_verified),
                   extracted_at = excluded.extracted_at"#,
        )
        .bind::<diesel::sql_types::Text, _>(&channel.channel_url)
        .bind::<diesel::sql_types::Nullable<diesel::sql_types::Text>, _>(&channel.channel_id)
        .bind::<diesel::sql_types::Nullable<diesel::sql_types::Text>, _>(&channel.channel_name)
        .bind::<diesel::sql_types::Nullable<diesel::sql_types::BigInt>, _>(
            channel.subscriber_count,
        )
        .bind::<diesel::sql_types::Nullable<diesel::sql_types::Bool>, _>(channel.is_verified)
        .bind::<diesel::sql_types::Text, _>(Utc::now().to_rfc3339())
        .execute(&mut conn)
        .await?;

        Ok(())
    }

    /// Batch upsert a channel's recent videos with the null-preserving merge.
    ///
    /// Returns `(upserted, ignored)`; ignored counts in-batch duplicates.
    pub async fn upsert_channel_videos(
        &self,
        channel_url: &str,
        videos: &[ChannelVideo],
    ) -> Result<(usize, usize), DieselError> {
        if channel_url.is_empty() || videos.is_empty() {
            return Ok((0, 0));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let deduped: Vec<&ChannelVideo> = videos
            .iter()
            .filter(|v| !v.video_id.is_empty() && seen.insert(v.video_id.as_str()))
            .collect();

        let attempted = videos.len();
        let mut conn = self.pool.get().await?;
        let mut upserted = 0usize;
        for video in &deduped {
            upserted += diesel::sql_query(
                r#"INSERT INTO channel_videos_raw
                   (channel_url, video_id, upload_date, duration_seconds, view_count)
                   VALUES ($1, $2, $3, $4, $5)
                   ON CONFLICT (channel_url, video_id) DO UPDATE SET
                       upload_date = COALESCE(excluded.upload_date, channel_videos_raw.upload_date),
                       duration_seconds = COALESCE(excluded.duration_seconds, channel_videos_raw.duration_seconds),
                       view_count = COALESCE(excluded.view_count, channel_videos_raw.view_count)"#,
            )
            .bind::<diesel::sql_types::Text, _>(channel_url)
            .bind::<diesel::sql_types::Text, _>(&video.video_id)
            .bind::<diesel::sql_types::Nullable<diesel::sql_types::Text>, _>(&video.upload_date)
            .bind::<diesel::sql_types::Nullable<diesel::sql_types::Integer>, _>(
                video.duration_seconds,
            )
            .bind::<diesel::sql_types::Nullable<diesel::sql_types::BigInt>, _>(video.view_count)
            .execute(&mut conn)
            .await?;
        }

        Ok((upserted, attempted.saturating_sub(upserted)))
    }

    /// Record the enrichment stage's terminal outcome for a channel.
    pub async fn mark_channel_processed(
        &self,
        channel_url: &str,
        status: ProcessedStatus,
    ) -> Result<(), DieselError> {
        if channel_url.is_empty() {
            return Err(super::util::to_diesel_error("channel_url is required"));
        }

        let mut conn = self.pool.get().await?;
        diesel::replace_into(channels_processed::table)
            .values((
                channels_processed::channel_url.eq(channel_url),
                channels_processed::processed_at.eq(Utc::now().to_rfc3339()),
                channels_processed::status.eq(status.as_str()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Check whether a channel already has a terminal enrichment marker.
    pub async fn is_channel_processed(&self, channel_url: &str) -> Result<bool, DieselError> {
        if channel_url.is_empty() {
            return Ok(false);
        }

        let mut conn = self.pool.get().await?;
        let count: i64 = channels_processed::table
            .filter(channels_processed::channel_url.eq(channel_url))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count > 0)
    }

    /// Atomically claim candidate channels for enrichment.
    ///
    /// Candidates are channels with at least one validated normalized video
    /// that have neither a terminal marker nor an existing claim, oldest
    /// first. The insert races cleanly with concurrent workers: rows lost to
    /// `ON CONFLICT DO NOTHING` are excluded from the returned set.
    pub async fn claim_channels_for_enrichment(
        &self,
        limit: i64,
    ) -> Result<Vec<String>, DieselError> {
        if limit <= 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let claimed: Vec<ClaimedChannel> = diesel::sql_query(
            r#"WITH candidates AS (
                   SELECT n.channel_url AS channel_url,
                          MIN(n.normalized_at) AS first_seen
                   FROM videos_normalized n
                   LEFT JOIN channels_processed p
                       ON p.channel_url = n.channel_url
                   LEFT JOIN channels_discovery_claims c
                       ON c.channel_url = n.channel_url
                   WHERE n.validation_passed = 1
                     AND n.channel_url IS NOT NULL
                     AND n.channel_url <> ''
                     AND p.channel_url IS NULL
                     AND c.channel_url IS NULL
                   GROUP BY n.channel_url
                   ORDER BY first_seen ASC
                   LIMIT $1
               )
               INSERT INTO channels_discovery_claims (channel_url, claimed_at)
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

    /// Count channels still claimable for enrichment.
    pub async fn count_enrichment_candidates(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let row: CountRow = diesel::sql_query(
            r#"SELECT COUNT(*) AS count FROM (
                   SELECT n.channel_url
                   FROM videos_normalized n
                   LEFT JOIN channels_processed p
                       ON p.channel_url = n.channel_url
                   LEFT JOIN channels_discovery_claims c
                       ON c.channel_url = n.channel_url
                   WHERE n.validation_passed = 1
                     AND n.channel_url IS NOT NULL
                     AND n.channel_url <> ''
                     AND p.channel_url IS NULL
                     AND c.channel_url IS NULL
                   GROUP BY n.channel_url
               )"#,
        )
        .get_result(&mut conn)
        .await?;
        Ok(row.count as u64)
    }

    /// Fetch a channel's long-form videos (duration >= the long-video
    /// threshold) with upload dates parsed best-effort.
    pub async fn fetch_channel_long_videos(
        &self,
        channel_url: &str,
    ) -> Result<Vec<LongVideo>, DieselError> {
        if channel_url.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.get().await?;
        let rows: Vec<ChannelVideoRecord> = channel_videos_raw::table
            .filter(channel_videos_raw::channel_url.eq(channel_url))
            .filter(channel_videos_raw::duration_seconds.is_not_null())
            .filter(channel_videos_raw::duration_seconds.ge(LONG_VIDEO_SECONDS))
            .select(ChannelVideoRecord::as_select())
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| LongVideo {
                upload_date: parse_upload_date(r.upload_date.as_deref()),
                video_id: r.video_id,
                duration_seconds: r.duration_seconds,
                view_count: r.view_count,
            })
            .collect())
    }

    /// Total enriched channels on record.
    pub async fn count_channels_raw(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = crate::schema::channels_raw::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Terminal markers by status, for stage reporting.
    pub async fn count_processed(&self, status: ProcessedStatus) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = channels_processed::table
            .filter(channels_processed::status.eq(status.as_str()))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Stale claims: claimed but with neither a terminal marker nor a
    /// retry in flight. Surfaced for operators; claims are never cleared
    /// automatically.
    pub async fn count_stale_claims(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = channels_discovery_claims::table
            .filter(diesel::dsl::not(diesel::dsl::exists(
                channels_processed::table.filter(
                    channels_processed::channel_url.eq(channels_discovery_claims::channel_url),
                ),
            )))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }
}
