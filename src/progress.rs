//! Progress events, ETA, and the static cost estimate for bulk deletes.

use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

use crate::planner::batch_count;

const BATCH_OVERHEAD_MS: u64 = 100;
const PER_ITEM_MS: u64 = 50;
const NETWORK_PER_BATCH_MS: u64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressInfo {
    pub current: usize,
    pub total: usize,
    pub percentage: f64,
    pub current_batch: usize,
    pub total_batches: usize,
    pub estimated_time_remaining: Duration,
}

/// Outcome of one batch, delivered once per batch in plan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub batch_number: usize,
    pub total_batches: usize,
    pub items_in_batch: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BulkEvent {
    Progress(ProgressInfo),
    BatchComplete(BatchReport),
}

pub type EventSender = UnboundedSender<BulkEvent>;

/// Advisory cost model: per-batch overhead, per-item cost, and per-batch network time.
/// Never used for scheduling.
#[must_use]
pub fn estimate_delete_time(item_count: usize, batch_size: usize) -> Duration {
    let batches = batch_count(item_count, batch_size) as u64;
    let items = item_count as u64;
    let ms = batches
        .saturating_mul(BATCH_OVERHEAD_MS)
        .saturating_add(items.saturating_mul(PER_ITEM_MS))
        .saturating_add(batches.saturating_mul(NETWORK_PER_BATCH_MS));
    Duration::from_millis(ms)
}

pub struct ProgressTracker {
    total: usize,
    batch_size: usize,
    total_batches: usize,
    started: Instant,
}

impl ProgressTracker {
    pub fn new(total: usize, batch_size: usize) -> Self {
        Self {
            total,
            batch_size,
            total_batches: batch_count(total, batch_size),
            started: Instant::now(),
        }
    }

    pub fn total_batches(&self) -> usize {
        self.total_batches
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(&self, done: usize) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        done as f64 / self.total as f64 * 100.0
    }

    /// Extrapolates from elapsed time once anything is done; before that, falls back
    /// to [`estimate_delete_time`] for the remaining items.
    pub fn eta(&self, done: usize) -> Duration {
        let pct = self.percentage(done);
        if pct > 0.0 {
            let secs = self.started.elapsed().as_secs_f64() / pct * (100.0 - pct);
            return Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX);
        }
        estimate_delete_time(self.total.saturating_sub(done), self.batch_size)
    }

    pub fn snapshot(&self, done: usize, current_batch: usize) -> ProgressInfo {
        ProgressInfo {
            current: done,
            total: self.total,
            percentage: self.percentage(done),
            current_batch,
            total_batches: self.total_batches,
            estimated_time_remaining: self.eta(done),
        }
    }
}
