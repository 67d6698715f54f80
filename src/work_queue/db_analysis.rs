//! Database-backed claim queue for the analysis stage.
//!
//! Wraps existing `AnalysisRepository` methods, no new queries. Candidates
//! are enriched channels without an analysis row or claim.

use async_trait::async_trait;

use crate::repository::AnalysisRepository;

use super::{ClaimQueue, WorkQueueError};

pub struct AnalysisQueue {
    repo: AnalysisRepository,
}

impl AnalysisQueue {
    pub fn new(repo: AnalysisRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl ClaimQueue for AnalysisQueue {
    fn stage_name(&self) -> &'static str {
        "analyze"
    }

    async fn count(&self) -> Result<u64, WorkQueueError> {
        Ok(self.repo.count_analysis_candidates().await?)
    }

    async fn claim(&self, batch_size: usize) -> Result<Vec<String>, WorkQueueError> {
        Ok(self
            .repo
            .claim_channels_for_analysis(batch_size as i64)
            .await?)
    }
}
