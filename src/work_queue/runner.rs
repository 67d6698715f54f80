//! Worker-pool drain: N workers loop claim -> process until the queue is
//! empty. Coordination happens entirely through the store's atomic claim;
//! workers share nothing in-process except their summed stats.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{ClaimQueue, WorkQueueError};

/// Outcome of processing one claimed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    Processed,
    Skipped,
    Failed,
}

/// Aggregate counts for one stage run.
#[derive(Debug, Default, Clone, Copy)]
pub struct DrainStats {
    pub claimed: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DrainStats {
    fn absorb(&mut self, outcome: UnitOutcome) {
        match outcome {
            UnitOutcome::Processed => self.processed += 1,
            UnitOutcome::Skipped => self.skipped += 1,
            UnitOutcome::Failed => self.failed += 1,
        }
    }

    fn merge(&mut self, other: DrainStats) {
        self.claimed += other.claimed;
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Transient claim failures are retried this many times before giving up.
const CLAIM_ATTEMPTS: u32 = 3;

/// Run `workers` concurrent claim loops against `queue`, invoking `handler`
/// for each claimed key. Returns when every worker has seen an empty claim.
///
/// The handler owns per-unit error handling; it reports an outcome rather
/// than an error so one bad unit never halts the batch.
pub async fn drain_queue<F, Fut>(
    queue: Arc<dyn ClaimQueue>,
    workers: usize,
    batch_size: usize,
    handler: F,
) -> Result<DrainStats, WorkQueueError>
where
    F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = UnitOutcome> + Send + 'static,
{
    let workers = workers.max(1);
    let batch_size = batch_size.max(1);

    let mut set = JoinSet::new();
    for worker_id in 0..workers {
        let queue = Arc::clone(&queue);
        let handler = handler.clone();
        set.spawn(async move { worker_loop(worker_id, queue, batch_size, handler).await });
    }

    let mut stats = DrainStats::default();
    let mut first_err: Option<WorkQueueError> = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(worker_stats)) => stats.merge(worker_stats),
            Ok(Err(e)) => {
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
            Err(e) => {
                if first_err.is_none() {
                    first_err = Some(WorkQueueError::Other(format!("worker panicked: {e}")));
                }
            }
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}

async fn worker_loop<F, Fut>(
    worker_id: usize,
    queue: Arc<dyn ClaimQueue>,
    batch_size: usize,
    handler: F,
) -> Result<DrainStats, WorkQueueError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = UnitOutcome>,
{
    let stage = queue.stage_name();
    let mut stats = DrainStats::default();

    loop {
        let keys = claim_with_retry(queue.as_ref(), batch_size).await?;
        if keys.is_empty() {
            debug!(stage, worker_id, "no more claimable work, worker exiting");
            break;
        }
        debug!(stage, worker_id, claimed = keys.len(), "claimed batch");
        stats.claimed += keys.len();

        for key in keys {
            stats.absorb(handler(key).await);
        }
    }

    Ok(stats)
}

/// Retry the whole claim call on transient storage errors. The claim insert
/// is all-or-nothing, so a retry never observes partial claim state.
async fn claim_with_retry(
    queue: &dyn ClaimQueue,
    batch_size: usize,
) -> Result<Vec<String>, WorkQueueError> {
    let mut last_err = None;
    for attempt in 1..=CLAIM_ATTEMPTS {
        match queue.claim(batch_size).await {
            Ok(keys) => return Ok(keys),
            Err(e) => {
                warn!(
                    stage = queue.stage_name(),
                    attempt,
                    error = %e,
                    "claim failed, retrying"
                );
                last_err = Some(e);
                tokio::time::sleep(Duration::from_millis(100 * u64::from(attempt))).await;
            }
        }
    }
    Err(last_err.expect("at least one claim attempt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory queue handing out disjoint batches from a fixed key set.
    struct FixedQueue {
        pending: Mutex<Vec<String>>,
    }

    impl FixedQueue {
        fn new(keys: &[&str]) -> Self {
            Self {
                pending: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl ClaimQueue for FixedQueue {
        fn stage_name(&self) -> &'static str {
            "test"
        }

        async fn count(&self) -> Result<u64, WorkQueueError> {
            Ok(self.pending.lock().unwrap().len() as u64)
        }

        async fn claim(&self, batch_size: usize) -> Result<Vec<String>, WorkQueueError> {
            let mut pending = self.pending.lock().unwrap();
            let take = batch_size.min(pending.len());
            Ok(pending.drain(..take).collect())
        }
    }

    #[tokio::test]
    async fn test_drain_processes_every_key_exactly_once() {
        let keys: Vec<String> = (0..25).map(|i| format!("key-{i}")).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let queue = Arc::new(FixedQueue::new(&key_refs));

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_by_handler = Arc::clone(&seen);
        let stats = drain_queue(queue, 4, 3, move |key| {
            let seen = Arc::clone(&seen_by_handler);
            async move {
                seen.lock().unwrap().push(key);
                UnitOutcome::Processed
            }
        })
        .await
        .unwrap();

        assert_eq!(stats.claimed, 25);
        assert_eq!(stats.processed, 25);
        assert_eq!(stats.failed, 0);

        let seen = seen.lock().unwrap();
        let unique: HashSet<&String> = seen.iter().collect();
        assert_eq!(unique.len(), 25);
    }

    #[tokio::test]
    async fn test_failed_units_do_not_halt_the_drain() {
        let queue = Arc::new(FixedQueue::new(&["a", "b", "c"]));
        let stats = drain_queue(queue, 1, 10, |key| async move {
            if key == "b" {
                UnitOutcome::Failed
            } else {
                UnitOutcome::Processed
            }
        })
        .await
        .unwrap();

        assert_eq!(stats.processed, 2);
        assert_eq!(stats.failed, 1);
    }

    #[tokio::test]
    async fn test_empty_queue_terminates_immediately() {
        let queue = Arc::new(FixedQueue::new(&[]));
        let stats = drain_queue(queue, 3, 5, |_key| async { UnitOutcome::Processed })
            .await
            .unwrap();
        assert_eq!(stats.claimed, 0);
    }
}
