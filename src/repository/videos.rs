//! Search-run and video persistence (discovery + normalization stages).

use std::collections::HashSet;

use chrono::Utc;
use diesel::dsl::{count_star, exists, not};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::models::{NewNormalizedVideo, NewRawVideo, RawVideoRecord};
use super::pool::{AsyncSqlitePool, DieselError};
use crate::models::{thumbnail_url, video_url, ScrapedVideo};
use crate::schema::{search_runs, videos_normalized, videos_raw};

/// Repository for search runs, raw videos, and normalized videos.
#[derive(Clone)]
pub struct VideoRepository {
    pool: AsyncSqlitePool,
}

impl VideoRepository {
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Create a search run row and return its id.
    pub async fn create_search_run(&self, query: &str, mode: &str) -> Result<Uuid, DieselError> {
        let mut conn = self.pool.get().await?;
        let id = Uuid::new_v4();

        diesel::insert_into(search_runs::table)
            .values((
                search_runs::id.eq(id.to_string()),
                search_runs::query.eq(query),
                search_runs::mode.eq(mode),
                search_runs::started_at.eq(Utc::now().to_rfc3339()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(id)
    }

    /// Mark a search run as finished.
    pub async fn finish_search_run(&self, id: &Uuid) -> Result<(), DieselError> {
        let mut conn = self.pool.get().await?;

        diesel::update(search_runs::table.find(id.to_string()))
            .set(search_runs::finished_at.eq(Some(Utc::now().to_rfc3339())))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Distinct queries from finished search runs. The external scraper
    /// driver uses this to skip queries that already ran.
    pub async fn fetch_executed_queries(&self) -> Result<Vec<String>, DieselError> {
        let mut conn = self.pool.get().await?;
        search_runs::table
            .filter(search_runs::finished_at.is_not_null())
            .select(search_runs::query)
            .distinct()
            .load(&mut conn)
            .await
    }

    /// Batch insert raw video rows scraped in one search run.
    ///
    /// First writer wins: rows whose video_id already exists are silently
    /// ignored and counted. Returns `(inserted, ignored)`.
    pub async fn insert_videos_raw(
        &self,
        search_run_id: &Uuid,
        videos: &[ScrapedVideo],
    ) -> Result<(usize, usize), DieselError> {
        let now = Utc::now().to_rfc3339();
        let run_id = search_run_id.to_string();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut rows: Vec<NewRawVideo> = Vec::new();
        for raw in videos {
            let Some(video_id) = raw.video_id.as_deref().filter(|id| !id.is_empty()) else {
                // Cannot persist without the primary key.
                continue;
            };
            if !seen.insert(video_id) {
                continue;
            }

            rows.push(NewRawVideo {
                video_id: video_id.to_string(),
                search_run_id: run_id.clone(),
                query: raw.query.clone(),
                video_url: video_url(video_id),
                channel_url: raw.owning_channel_url().map(str::to_string),
                duration_text: raw.duration.clone(),
                views_text: raw.views_text.clone(),
                published_text: raw.published_text.clone(),
                thumbnail_url: thumbnail_url(video_id),
                video_type: raw.video_type.clone(),
                is_multi_creator: raw.is_multi_creator,
                discovered_at: now.clone(),
            });
        }

        if rows.is_empty() {
            return Ok((0, 0));
        }

        let attempted = rows.len();
        let mut conn = self.pool.get().await?;
        let mut inserted = 0usize;
        for row in &rows {
            inserted += diesel::insert_or_ignore_into(videos_raw::table)
                .values(row)
                .execute(&mut conn)
                .await?;
        }

        Ok((inserted, attempted - inserted))
    }

    /// Fetch raw videos that have not yet been normalized, oldest first.
    pub async fn fetch_unprocessed_videos_raw(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<RawVideoRecord>, DieselError> {
        let mut conn = self.pool.get().await?;

        let mut query = videos_raw::table
            .filter(not(exists(
                videos_normalized::table
                    .filter(videos_normalized::video_id.eq(videos_raw::video_id)),
            )))
            .select(RawVideoRecord::as_select())
            .order(videos_raw::discovered_at.asc())
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        query.load(&mut conn).await
    }

    /// Batch insert normalized videos, safe for re-runs.
    ///
    /// Returns `(inserted, ignored)`.
    pub async fn insert_videos_normalized(
        &self,
        rows: &[NewNormalizedVideo],
    ) -> Result<(usize, usize), DieselError> {
        if rows.is_empty() {
            return Ok((0, 0));
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let deduped: Vec<&NewNormalizedVideo> = rows
            .iter()
            .filter(|r| !r.video_id.is_empty() && seen.insert(r.video_id.as_str()))
            .collect();

        let attempted = deduped.len();
        let mut conn = self.pool.get().await?;
        let mut inserted = 0usize;
        for row in deduped {
            inserted += diesel::insert_or_ignore_into(videos_normalized::table)
                .values(row)
                .execute(&mut conn)
                .await?;
        }

        Ok((inserted, attempted - inserted))
    }

    /// Count raw rows awaiting normalization.
    pub async fn count_unprocessed_raw(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = videos_raw::table
            .filter(not(exists(
                videos_normalized::table
                    .filter(videos_normalized::video_id.eq(videos_raw::video_id)),
            )))
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Total raw rows.
    pub async fn count_raw(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = videos_raw::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }

    /// Total normalized rows.
    pub async fn count_normalized(&self) -> Result<u64, DieselError> {
        let mut conn = self.pool.get().await?;
        let count: i64 = videos_normalized::table
            .select(count_star())
            .first(&mut conn)
            .await?;
        Ok(count as u64)
    }
}
