//! The bulk delete orchestrator.
//!
//! `BulkEngine` owns one store handle, one state machine and one undo slot. A single
//! operation is in flight at a time; a second caller gets [`BulkError::Busy`].

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

use crate::audit;
use crate::condition::{self, Condition, Operator};
use crate::config::BulkConfig;
use crate::errors::BulkError;
use crate::executor::{BatchOutcome, DEFAULT_INTER_BATCH_PAUSE, ExecutorConfig, execute_batches};
use crate::planner::plan;
use crate::progress::{self, BulkEvent, EventSender, ProgressTracker};
use crate::query::build_query;
use crate::retry::RetryPolicy;
use crate::store::DocumentStore;
use crate::types::{MatchedRecord, WriteOp};
use crate::undo::{UndoManager, UndoSnapshot, UndoSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    Idle,
    Previewing,
    Deleting,
    Restoring,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Previewing => "previewing",
            Self::Deleting => "deleting",
            Self::Restoring => "restoring",
        })
    }
}

#[derive(Debug, Clone)]
pub struct BulkDeleteOptions {
    pub batch_size: usize,
    pub dry_run: bool,
    pub enable_undo: bool,
    /// Total attempts per batch.
    pub max_retries: u32,
    /// Backoff base; doubles after each failed attempt.
    pub retry_delay: Duration,
    pub inter_batch_pause: Duration,
    /// Receives progress and per-batch events; a closed receiver is ignored.
    pub events: Option<EventSender>,
}

impl Default for BulkDeleteOptions {
    fn default() -> Self {
        Self {
            batch_size: 500,
            dry_run: false,
            enable_undo: false,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            inter_batch_pause: DEFAULT_INTER_BATCH_PAUSE,
            events: None,
        }
    }
}

impl BulkDeleteOptions {
    pub fn from_config(cfg: &BulkConfig) -> Self {
        let exec = cfg.executor();
        Self {
            batch_size: cfg.batch_size,
            dry_run: cfg.dry_run,
            enable_undo: cfg.enable_undo,
            max_retries: exec.retry.max_attempts,
            retry_delay: exec.retry.base_delay,
            inter_batch_pause: exec.inter_batch_pause,
            events: None,
        }
    }

    /// # Errors
    /// Returns [`BulkError::Config`] when `batch_size` is zero.
    pub fn validate(&self) -> Result<(), BulkError> {
        if self.batch_size == 0 {
            return Err(BulkError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            retry: RetryPolicy::new(self.max_retries, self.retry_delay),
            inter_batch_pause: self.inter_batch_pause,
        }
    }

    fn send(&self, event: BulkEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }
}

/// Result of one delete call. Partial failure is reported here, not as `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteStats {
    pub found: usize,
    pub deleted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
    pub duration: Duration,
    pub batches_processed: usize,
}

impl DeleteStats {
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && self.errors.is_empty()
    }
}

struct StateGuard<'a> {
    state: &'a Mutex<EngineState>,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = EngineState::Idle;
    }
}

pub struct BulkEngine<S> {
    store: S,
    state: Mutex<EngineState>,
    undo: UndoManager,
    restore_cfg: ExecutorConfig,
}

impl<S: DocumentStore> BulkEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: Mutex::new(EngineState::Idle),
            undo: UndoManager::new(),
            restore_cfg: ExecutorConfig::default(),
        }
    }

    /// Restore batches use the retry and pause settings from `cfg`.
    pub fn with_config(store: S, cfg: &BulkConfig) -> Self {
        Self { restore_cfg: cfg.executor(), ..Self::new(store) }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    pub fn is_deleting(&self) -> bool {
        self.state() == EngineState::Deleting
    }

    pub fn can_undo(&self) -> bool {
        self.undo.can_undo()
    }

    pub fn undo_snapshot_summary(&self) -> Option<UndoSummary> {
        self.undo.summary()
    }

    fn enter(&self, next: EngineState) -> Result<StateGuard<'_>, BulkError> {
        let mut state = self.state.lock();
        if *state != EngineState::Idle {
            let current = *state;
            drop(state);
            log::warn!("rejecting {next} request: engine is {current}");
            audit::log_rejected(&next.to_string(), &current.to_string());
            return Err(BulkError::Busy(current));
        }
        *state = next;
        Ok(StateGuard { state: &self.state })
    }

    /// # Errors
    /// Returns [`BulkError::Validation`] for malformed conditions.
    pub fn validate_conditions(&self, conditions: &[Condition]) -> Result<(), BulkError> {
        condition::validate_conditions(conditions)
    }

    pub fn estimate_delete_time(&self, item_count: usize, batch_size: usize) -> Duration {
        progress::estimate_delete_time(item_count, batch_size)
    }

    /// Read-only: runs the query and returns the matched snapshots.
    ///
    /// # Errors
    /// Validation errors, [`BulkError::Busy`], or [`BulkError::Store`] if the query fails.
    pub async fn preview_delete(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<Vec<MatchedRecord>, BulkError> {
        let query = build_query(collection, conditions)?;
        let _guard = self.enter(EngineState::Previewing)?;
        let records = self.store.query(&query).await?;
        log::debug!("preview on '{collection}' matched {} records", records.len());
        Ok(records)
    }

    /// # Errors
    /// Same as [`Self::preview_delete`].
    pub async fn count_matches(
        &self,
        collection: &str,
        conditions: &[Condition],
    ) -> Result<usize, BulkError> {
        Ok(self.preview_delete(collection, conditions).await?.len())
    }

    /// Matches, then deletes in sequential batches. Batch failures land in the stats;
    /// only validation, configuration, and busy rejections come back as `Err`.
    ///
    /// # Errors
    /// [`BulkError::Validation`], [`BulkError::Config`], or [`BulkError::Busy`].
    pub async fn execute_delete(
        &self,
        collection: &str,
        conditions: &[Condition],
        opts: BulkDeleteOptions,
    ) -> Result<DeleteStats, BulkError> {
        opts.validate()?;
        let query = build_query(collection, conditions)?;
        let _guard = self.enter(EngineState::Deleting)?;
        let started = Instant::now();

        let matched = match self.store.query(&query).await {
            Ok(records) => records,
            Err(e) => {
                log::error!("bulk delete on '{collection}' aborted: query failed: {e}");
                return Ok(DeleteStats {
                    errors: vec![format!("Query failed: {e}")],
                    duration: started.elapsed(),
                    ..DeleteStats::default()
                });
            }
        };
        let found = matched.len();
        if found == 0 {
            log::info!("bulk delete on '{collection}': nothing matched");
            return Ok(DeleteStats { duration: started.elapsed(), ..DeleteStats::default() });
        }
        if opts.dry_run {
            log::info!("dry run on '{collection}': {found} records would be deleted");
            return Ok(DeleteStats { found, duration: started.elapsed(), ..DeleteStats::default() });
        }
        if opts.enable_undo {
            self.undo.discard();
        }

        let ops: Vec<WriteOp> =
            matched.iter().map(|r| WriteOp::Delete { id: r.id.clone() }).collect();
        let batches = plan(&ops, opts.batch_size)?;
        let tracker = ProgressTracker::new(found, opts.batch_size);
        log::info!(
            "bulk delete on '{collection}': {found} records in {} batches of up to {}",
            batches.len(),
            opts.batch_size
        );

        let mut done = 0usize;
        let outcomes = execute_batches(
            &self.store,
            collection,
            &batches,
            &opts.executor_config(),
            |outcome: &BatchOutcome| {
                opts.send(BulkEvent::BatchComplete(outcome.report()));
                if outcome.succeeded() {
                    done += outcome.ids.len();
                    opts.send(BulkEvent::Progress(tracker.snapshot(done, outcome.batch_number)));
                }
            },
        )
        .await;

        let mut stats = DeleteStats { found, batches_processed: outcomes.len(), ..DeleteStats::default() };
        for outcome in &outcomes {
            match &outcome.error {
                None => stats.deleted += outcome.ids.len(),
                Some(line) => {
                    stats.failed += outcome.ids.len();
                    stats.errors.push(line.clone());
                }
            }
        }

        let captured = opts.enable_undo && stats.deleted > 0;
        if captured {
            // Batches are contiguous chunks of `matched`, in the same order.
            let records = matched
                .chunks(opts.batch_size)
                .zip(&outcomes)
                .filter(|(_, o)| o.succeeded())
                .flat_map(|(chunk, _)| chunk.iter().cloned())
                .collect();
            self.undo.capture(UndoSnapshot::new(collection, conditions, records));
        }

        stats.duration = started.elapsed();
        log::info!(
            "bulk delete on '{collection}' finished: found={} deleted={} failed={} in {}ms",
            stats.found,
            stats.deleted,
            stats.failed,
            stats.duration.as_millis()
        );
        audit::log_delete(collection, conditions, stats.found, stats.deleted, stats.failed, captured);
        Ok(stats)
    }

    /// Single-condition delete with default options. `value` is coerced like form input.
    ///
    /// # Errors
    /// Same as [`Self::execute_delete`].
    pub async fn quick_delete(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        operator: Operator,
    ) -> Result<DeleteStats, BulkError> {
        self.quick_delete_with(collection, field, value, operator, BulkDeleteOptions::default()).await
    }

    /// [`Self::quick_delete`] with caller-supplied options, e.g. from [`BulkDeleteOptions::from_config`].
    ///
    /// # Errors
    /// Same as [`Self::execute_delete`].
    pub async fn quick_delete_with(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        operator: Operator,
        opts: BulkDeleteOptions,
    ) -> Result<DeleteStats, BulkError> {
        let conditions = [Condition::from_raw(field, operator, value)];
        self.execute_delete(collection, &conditions, opts).await
    }

    /// Re-writes the last captured snapshot in batches. `Ok(false)` means there was
    /// nothing to restore, or some batch failed and the snapshot was kept for another try.
    ///
    /// # Errors
    /// [`BulkError::Busy`] while another operation is running.
    pub async fn undo_last_delete(&self) -> Result<bool, BulkError> {
        let _guard = self.enter(EngineState::Restoring)?;
        let Some(snapshot) = self.undo.take() else {
            log::info!("undo requested but no snapshot is held");
            return Ok(false);
        };
        let ops = snapshot.restore_ops();
        let batches = plan(&ops, self.store.max_batch_ops().max(1))?;
        let outcomes =
            execute_batches(&self.store, &snapshot.collection, &batches, &self.restore_cfg, |_| {})
                .await;

        let (ok, bad): (Vec<&BatchOutcome>, Vec<&BatchOutcome>) =
            outcomes.iter().partition(|o| o.succeeded());
        let restored: usize = ok.iter().map(|o| o.ids.len()).sum();
        let failed: usize = bad.iter().map(|o| o.ids.len()).sum();
        audit::log_restore(&snapshot.collection, restored, failed);
        if failed > 0 {
            log::error!(
                "restore into '{}' incomplete: {restored} restored, {failed} failed; snapshot kept",
                snapshot.collection
            );
            self.undo.put_back(snapshot);
            return Ok(false);
        }
        log::info!("restored {restored} records into '{}'", snapshot.collection);
        Ok(true)
    }

    /// Writes the held snapshot as JSON. Returns `false` when there is none.
    ///
    /// # Errors
    /// I/O or serialization failures.
    pub fn export_undo_snapshot(&self, path: &Path) -> Result<bool, BulkError> {
        let Some(snapshot) = self.undo.snapshot() else {
            return Ok(false);
        };
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(true)
    }

    /// Loads a snapshot written by [`Self::export_undo_snapshot`], replacing any held one.
    ///
    /// # Errors
    /// I/O or parse failures.
    pub fn import_undo_snapshot(&self, path: &Path) -> Result<UndoSummary, BulkError> {
        let snapshot: UndoSnapshot = serde_json::from_slice(&std::fs::read(path)?)?;
        let summary = snapshot.summary();
        self.undo.capture(snapshot);
        Ok(summary)
    }
}
