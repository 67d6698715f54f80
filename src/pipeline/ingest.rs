//! Discovery ingest: persist one scraper batch under a new search run.
//!
//! The browser-automation scraper itself is an external producer; this
//! stage consumes its JSON output at the boundary and owns nothing but
//! persistence.

use tracing::{info, warn};
use uuid::Uuid;

use crate::models::ScrapedVideo;
use crate::repository::{DieselError, VideoRepository};

/// Outcome of ingesting one scraper batch.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub search_run_id: Uuid,
    pub received: usize,
    pub inserted: usize,
    pub ignored: usize,
}

/// Create a search run, insert the batch insert-if-absent, and close the
/// run. Re-ingesting an overlapping batch is safe: duplicates are counted,
/// not errors.
pub async fn run_ingest(
    repo: &VideoRepository,
    query: &str,
    mode: &str,
    records: &[ScrapedVideo],
) -> Result<IngestReport, DieselError> {
    if repo
        .fetch_executed_queries()
        .await?
        .iter()
        .any(|q| q == query)
    {
        warn!(query, "query already ingested by an earlier run; duplicate rows will be ignored");
    }

    let search_run_id = repo.create_search_run(query, mode).await?;
    let (inserted, ignored) = repo.insert_videos_raw(&search_run_id, records).await?;
    repo.finish_search_run(&search_run_id).await?;

    info!(
        %search_run_id,
        received = records.len(),
        inserted,
        ignored,
        "ingest finished"
    );

    Ok(IngestReport {
        search_run_id,
        received: records.len(),
        inserted,
        ignored,
    })
}
