use nexus_bulk::condition::{Condition, Operator};
use nexus_bulk::engine::{BulkDeleteOptions, BulkEngine, EngineState};
use nexus_bulk::store::MemoryStore;
use nexus_bulk::types::Record;

use super::common::{EMPLOYEES, employees};

fn with_undo() -> BulkDeleteOptions {
    BulkDeleteOptions { enable_undo: true, ..BulkDeleteOptions::default() }
}

fn snapshot_of(store: &MemoryStore, company: &str) -> Vec<Record> {
    store
        .records(EMPLOYEES)
        .into_iter()
        .filter(|r| r.fields.get_str("company").is_ok_and(|c| c == company))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn undo_restores_exactly_what_was_deleted() {
    let engine = BulkEngine::new(employees(1100, 20));
    let before = snapshot_of(engine.store(), "AAA");
    let stats = engine
        .execute_delete(EMPLOYEES, &[Condition::equals("company", "AAA")], with_undo())
        .await
        .unwrap();
    assert_eq!(stats.deleted, 1100);
    assert_eq!(engine.store().len(EMPLOYEES), 20);
    let summary = engine.undo_snapshot_summary().unwrap();
    assert_eq!((summary.collection.as_str(), summary.records), (EMPLOYEES, 1100));

    assert!(engine.undo_last_delete().await.unwrap());
    assert_eq!(snapshot_of(engine.store(), "AAA"), before);
    assert_eq!(engine.store().len(EMPLOYEES), 1120);
    assert!(!engine.can_undo());
    assert!(!engine.undo_last_delete().await.unwrap());
    assert_eq!(engine.state(), EngineState::Idle);
}

#[tokio::test(start_paused = true)]
async fn undo_disabled_captures_nothing() {
    let engine = BulkEngine::new(employees(10, 0));
    engine.quick_delete(EMPLOYEES, "company", "AAA", Operator::Eq).await.unwrap();
    assert!(!engine.can_undo());
    assert!(!engine.undo_last_delete().await.unwrap());
    assert!(engine.store().is_empty(EMPLOYEES));
}

#[tokio::test(start_paused = true)]
async fn next_enabled_delete_supersedes_snapshot() {
    let engine = BulkEngine::new(employees(6, 4));
    engine
        .execute_delete(EMPLOYEES, &[Condition::equals("company", "AAA")], with_undo())
        .await
        .unwrap();
    engine
        .execute_delete(EMPLOYEES, &[Condition::equals("company", "BBB")], with_undo())
        .await
        .unwrap();
    assert!(engine.undo_last_delete().await.unwrap());
    // only the second delete comes back
    assert_eq!(engine.store().len(EMPLOYEES), 4);
    assert!(snapshot_of(engine.store(), "AAA").is_empty());
}

#[tokio::test(start_paused = true)]
async fn empty_match_and_dry_run_keep_snapshot() {
    let engine = BulkEngine::new(employees(6, 4));
    engine
        .execute_delete(EMPLOYEES, &[Condition::equals("company", "AAA")], with_undo())
        .await
        .unwrap();
    let stats = engine
        .execute_delete(EMPLOYEES, &[Condition::equals("company", "ZZZ")], with_undo())
        .await
        .unwrap();
    assert_eq!(stats.found, 0);
    let dry = BulkDeleteOptions { dry_run: true, ..with_undo() };
    let stats = engine
        .execute_delete(EMPLOYEES, &[Condition::equals("company", "BBB")], dry)
        .await
        .unwrap();
    assert_eq!(stats.found, 4);
    assert_eq!(engine.undo_snapshot_summary().unwrap().records, 6);
}
