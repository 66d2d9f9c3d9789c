use nexus_bulk::audit::{self, AuditSink};
use nexus_bulk::condition::Condition;
use nexus_bulk::engine::{BulkDeleteOptions, BulkEngine};
use parking_lot::Mutex;
use std::sync::Arc;

use super::common::employees;

#[tokio::test(start_paused = true)]
async fn executed_delete_and_restore_are_audited() {
    let store = employees(0, 0);
    for i in 0..3 {
        store.insert(
            "audited_col",
            nexus_bulk::Record::new(format!("a{i}"), bson::doc! {"kind": "temp"}),
        );
    }
    let engine = BulkEngine::new(store);
    let sink: AuditSink = Arc::new(Mutex::new(Vec::new()));
    audit::set_sink_for_tests(Some(sink.clone()));

    let conds = [Condition::equals("kind", "temp")];
    let dry = BulkDeleteOptions { dry_run: true, ..BulkDeleteOptions::default() };
    engine.execute_delete("audited_col", &conds, dry).await.unwrap();
    let opts = BulkDeleteOptions { enable_undo: true, ..BulkDeleteOptions::default() };
    engine.execute_delete("audited_col", &conds, opts).await.unwrap();
    engine.undo_last_delete().await.unwrap();
    audit::set_sink_for_tests(None);

    let lines: Vec<serde_json::Value> = sink
        .lock()
        .iter()
        .filter(|l| l.contains("audited_col"))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    // dry runs are not audited
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["op"], "delete");
    assert_eq!(lines[0]["deleted"], 3);
    assert_eq!(lines[0]["undo"], true);
    assert_eq!(lines[0]["conditions"], "kind == temp");
    assert_eq!(lines[1]["op"], "restore");
    assert_eq!(lines[1]["restored"], 3);
}
