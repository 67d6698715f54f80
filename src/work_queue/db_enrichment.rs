//! Database-backed claim queue for the enrichment stage.
//!
//! Wraps existing `ChannelRepository` methods, no new queries. Candidates
//! are channels with at least one validated video and neither a terminal
//! marker nor an existing claim.

use async_trait::async_trait;

use crate::repository::ChannelRepository;

use super::{ClaimQueue, WorkQueueError};

pub struct EnrichmentQueue {
    repo: ChannelRepository,
}

impl EnrichmentQueue {
    pub fn new(repo: ChannelRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ClaimQueue for EnrichmentQueue {
    fn stage_name(&self) -> &'static str {
        "enrich"
    }

    async fn count(&self) -> Result<u64, WorkQueueError> {
        Ok(self.repo.count_enrichment_candidates().await?)
    }

    async fn claim(&self, batch_size: usize) -> Result<Vec<String>, WorkQueueError> {
        Ok(self
            .repo
            .claim_channels_for_enrichment(batch_size as i64)
            .await?)
    }
}
