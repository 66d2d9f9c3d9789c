//! Structured audit trail for destructive operations.
//!
//! Each event is one JSON object logged on the `nexus_bulk::audit` target, which the
//! logger routes to `audit.log`. Tests can attach an in-memory sink to inspect lines.

use chrono::{SecondsFormat, Utc};
use parking_lot::{Mutex, RwLock};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::condition::Condition;

pub const AUDIT_TARGET: &str = "nexus_bulk::audit";

pub type AuditSink = Arc<Mutex<Vec<String>>>;

static SINK: RwLock<Option<AuditSink>> = RwLock::new(None);

/// Routes a copy of every audit line to `sink` (or stops when `None`).
pub fn set_sink_for_tests(sink: Option<AuditSink>) {
    *SINK.write() = sink;
}

fn now_ts() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn condition_summary(conditions: &[Condition]) -> String {
    conditions.iter().map(ToString::to_string).collect::<Vec<_>>().join(" AND ")
}

fn emit(mut event: Value) {
    if let Some(obj) = event.as_object_mut() {
        obj.insert("ts".into(), Value::String(now_ts()));
    }
    let line = event.to_string();
    log::info!(target: AUDIT_TARGET, "{line}");
    let sink = SINK.read().clone();
    if let Some(sink) = sink {
        sink.lock().push(line);
    }
}

pub fn log_delete(
    collection: &str,
    conditions: &[Condition],
    found: usize,
    deleted: usize,
    failed: usize,
    undo_captured: bool,
) {
    emit(json!({
        "op": "delete",
        "collection": collection,
        "conditions": condition_summary(conditions),
        "found": found,
        "deleted": deleted,
        "failed": failed,
        "undo": undo_captured,
    }));
}

pub fn log_restore(collection: &str, restored: usize, failed: usize) {
    emit(json!({
        "op": "restore",
        "collection": collection,
        "restored": restored,
        "failed": failed,
    }));
}

pub fn log_rejected(op: &str, state: &str) {
    emit(json!({ "op": op, "rejected": true, "state": state }));
}
