//! Single-level undo: one pre-deletion snapshot, replaced by the next enabled delete.
//!
//! Snapshots live in process memory only. Callers wanting undo across restarts
//! serialize the snapshot themselves.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::types::{Record, WriteOp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoSnapshot {
    pub collection: String,
    pub conditions: Vec<Condition>,
    pub captured_at: DateTime<Utc>,
    pub records: Vec<Record>,
}

impl UndoSnapshot {
    pub fn new(collection: &str, conditions: &[Condition], records: Vec<Record>) -> Self {
        Self {
            collection: collection.to_string(),
            conditions: conditions.to_vec(),
            captured_at: Utc::now(),
            records,
        }
    }

    /// Inverse operations: one `Set` per captured record, field values as matched.
    pub fn restore_ops(&self) -> Vec<WriteOp> {
        self.records
            .iter()
            .map(|r| WriteOp::Set { id: r.id.clone(), fields: r.fields.clone() })
            .collect()
    }

    pub fn summary(&self) -> UndoSummary {
        UndoSummary {
            collection: self.collection.clone(),
            records: self.records.len(),
            captured_at: self.captured_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UndoSummary {
    pub collection: String,
    pub records: usize,
    pub captured_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct UndoManager {
    slot: Mutex<Option<UndoSnapshot>>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `snapshot`, dropping whatever was there.
    pub fn capture(&self, snapshot: UndoSnapshot) {
        let mut slot = self.slot.lock();
        if let Some(old) = slot.replace(snapshot) {
            log::info!(
                "discarding undo snapshot of {} records from '{}'",
                old.records.len(),
                old.collection
            );
        }
    }

    pub fn discard(&self) {
        self.slot.lock().take();
    }

    pub fn take(&self) -> Option<UndoSnapshot> {
        self.slot.lock().take()
    }

    /// Puts a snapshot back after a failed restore unless a newer one arrived meanwhile.
    pub fn put_back(&self, snapshot: UndoSnapshot) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(snapshot);
        }
    }

    pub fn can_undo(&self) -> bool {
        self.slot.lock().is_some()
    }

    pub fn snapshot(&self) -> Option<UndoSnapshot> {
        self.slot.lock().clone()
    }

    pub fn summary(&self) -> Option<UndoSummary> {
        self.slot.lock().as_ref().map(UndoSnapshot::summary)
    }
}
