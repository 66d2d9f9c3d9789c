//! Sequential batch commits with per-batch retry and best-effort continuation.

use std::time::Duration;
use tokio::time::sleep;

use crate::progress::BatchReport;
use crate::retry::RetryPolicy;
use crate::store::DocumentStore;
use crate::types::{RecordId, WriteOp};

pub const DEFAULT_INTER_BATCH_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub retry: RetryPolicy,
    /// Pause after every batch but the last, to stay under the store's write rate.
    pub inter_batch_pause: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(), inter_batch_pause: DEFAULT_INTER_BATCH_PAUSE }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub batch_number: usize,
    pub total_batches: usize,
    pub ids: Vec<RecordId>,
    pub attempts: u32,
    /// Formatted audit line when every attempt failed.
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn report(&self) -> BatchReport {
        let items = self.ids.len();
        let (success_count, failure_count) = if self.succeeded() { (items, 0) } else { (0, items) };
        BatchReport {
            batch_number: self.batch_number,
            total_batches: self.total_batches,
            items_in_batch: items,
            success_count,
            failure_count,
            errors: self.error.iter().cloned().collect(),
        }
    }
}

/// Commits `batches` strictly in order, one at a time. An exhausted batch is recorded
/// as failed and the loop moves on. `on_batch` sees every outcome as it happens.
pub async fn execute_batches<S, F>(
    store: &S,
    collection: &str,
    batches: &[Vec<WriteOp>],
    cfg: &ExecutorConfig,
    mut on_batch: F,
) -> Vec<BatchOutcome>
where
    S: DocumentStore,
    F: FnMut(&BatchOutcome),
{
    let total = batches.len();
    let max = cfg.retry.attempts();
    let mut outcomes = Vec::with_capacity(total);
    for (i, ops) in batches.iter().enumerate() {
        let n = i + 1;
        let mut attempts = 0;
        let result = cfg
            .retry
            .with_retry(|attempt| {
                attempts = attempt;
                log::debug!("committing batch {n}/{total} ({} ops), attempt {attempt}", ops.len());
                store.commit_batch(collection, ops)
            })
            .await;
        let error = match result {
            Ok(()) => None,
            Err(e) => {
                let line = format!("Batch {n}/{total} (Attempt {}/{max}): {}", e.attempts, e.error);
                log::error!("{line}");
                Some(line)
            }
        };
        let outcome = BatchOutcome {
            batch_number: n,
            total_batches: total,
            ids: ops.iter().map(|op| op.id().clone()).collect(),
            attempts,
            error,
        };
        on_batch(&outcome);
        outcomes.push(outcome);
        if n < total && !cfg.inter_batch_pause.is_zero() {
            sleep(cfg.inter_batch_pause).await;
        }
    }
    outcomes
}
