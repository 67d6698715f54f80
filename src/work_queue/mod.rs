//! Work-queue claim manager for the claim/process lifecycle.
//!
//! Both the enrichment and analysis stages follow the same pattern: workers
//! atomically reserve a bounded batch of candidate keys from an anti-join
//! over the store, process each one, and stop when a claim comes back
//! empty. This module provides the shared trait plus the DB-backed queues
//! so stage drivers stay backend-agnostic.
//!
//! Claim rows are set-once and never cleared: a downstream row's existence
//! supersedes the claim on success, and abandoned claims are an operator
//! concern (delete the stale row to re-offer the work).

mod error;
mod runner;

pub mod db_analysis;
pub mod db_enrichment;

pub use db_analysis::AnalysisQueue;
pub use db_enrichment::EnrichmentQueue;
pub use error::WorkQueueError;
pub use runner::{drain_queue, DrainStats, UnitOutcome};

use async_trait::async_trait;

/// A queue that atomically hands disjoint batches of candidate keys to
/// concurrent workers.
///
/// Result storage is NOT part of this trait; stage drivers persist their
/// own outputs. The queue only manages the claim step.
#[async_trait]
pub trait ClaimQueue: Send + Sync {
    /// Stage name for logging and progress output.
    fn stage_name(&self) -> &'static str;

    /// Count candidates still claimable.
    async fn count(&self) -> Result<u64, WorkQueueError>;

    /// Atomically claim up to `batch_size` candidate keys.
    ///
    /// Keys lost to a concurrent claim race are silently excluded: never
    /// double-returned, never auto-requeued. Returns fewer rows when fewer
    /// candidates exist; an empty return is the worker's termination
    /// signal.
    async fn claim(&self, batch_size: usize) -> Result<Vec<String>, WorkQueueError>;
}
