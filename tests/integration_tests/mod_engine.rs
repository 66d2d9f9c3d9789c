use bson::doc;
use nexus_bulk::condition::{Condition, Operator};
use nexus_bulk::engine::{BulkDeleteOptions, BulkEngine};
use nexus_bulk::errors::{BulkError, StoreError};
use nexus_bulk::store::{FaultyStore, MemoryStore};
use nexus_bulk::types::Record;
use std::collections::BTreeSet;

use super::common::{EMPLOYEES, employees};

fn company_aaa() -> Vec<Condition> {
    vec![Condition::equals("company", "AAA")]
}

#[tokio::test(start_paused = true)]
async fn twelve_hundred_records_three_batches() {
    let engine = BulkEngine::new(employees(1200, 30));
    let stats = engine
        .execute_delete(EMPLOYEES, &company_aaa(), BulkDeleteOptions::default())
        .await
        .unwrap();
    assert_eq!(stats.found, 1200);
    assert_eq!(stats.deleted, 1200);
    assert_eq!(stats.batches_processed, 3);
    assert!(stats.is_complete());
    assert_eq!(engine.store().len(EMPLOYEES), 30);
}

#[tokio::test(start_paused = true)]
async fn failing_middle_batch_is_skipped_not_fatal() {
    let store = FaultyStore::new(employees(1200, 30)).fail_commits_when(|call| {
        call.ops
            .first()
            .is_some_and(|op| op.id().as_str() == "emp-0500")
            .then(|| StoreError::Contention("quota exceeded".into()))
    });
    let engine = BulkEngine::new(store);
    let stats = engine
        .execute_delete(EMPLOYEES, &company_aaa(), BulkDeleteOptions::default())
        .await
        .unwrap();
    assert_eq!(stats.found, 1200);
    assert_eq!(stats.deleted, 700);
    assert_eq!(stats.failed, 500);
    assert_eq!(stats.batches_processed, 3);
    assert_eq!(stats.errors.len(), 1);
    assert!(stats.errors[0].starts_with("Batch 2/3 (Attempt 3/3): "));
    assert!(stats.deleted + stats.failed <= stats.found);

    // 1 + 3 attempts + 1
    assert_eq!(engine.store().commit_calls(), 5);
    let left: BTreeSet<String> = engine
        .store()
        .inner()
        .records(EMPLOYEES)
        .into_iter()
        .filter(|r| r.fields.get_str("company").is_ok_and(|c| c == "AAA"))
        .map(|r| r.id.0)
        .collect();
    assert_eq!(left.len(), 500);
    assert!(left.contains("emp-0500") && left.contains("emp-0999"));
}

#[tokio::test(start_paused = true)]
async fn dry_run_never_mutates() {
    let engine = BulkEngine::new(employees(1200, 30));
    let opts = BulkDeleteOptions { dry_run: true, enable_undo: true, ..BulkDeleteOptions::default() };
    let stats = engine.execute_delete(EMPLOYEES, &company_aaa(), opts).await.unwrap();
    assert_eq!(stats.found, 1200);
    assert_eq!((stats.deleted, stats.failed, stats.batches_processed), (0, 0, 0));
    assert_eq!(engine.store().len(EMPLOYEES), 1230);
    assert_eq!(engine.store().commit_count(), 0);
    assert!(!engine.can_undo());
}

#[tokio::test]
async fn preview_is_idempotent_and_read_only() {
    let engine = BulkEngine::new(employees(50, 10));
    let conds = vec![
        Condition::equals("company", "AAA"),
        Condition::from_raw("age", Operator::Gte, "40"),
    ];
    let first = engine.preview_delete(EMPLOYEES, &conds).await.unwrap();
    let second = engine.preview_delete(EMPLOYEES, &conds).await.unwrap();
    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.fields.get_i64("age").unwrap() >= 40));
    assert_eq!(engine.count_matches(EMPLOYEES, &conds).await.unwrap(), first.len());
    assert_eq!(engine.store().len(EMPLOYEES), 60);
    assert_eq!(engine.store().commit_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn quick_delete_matches_single_condition_delete() {
    let a = BulkEngine::new(employees(90, 12));
    let b = BulkEngine::new(employees(90, 12));
    let quick = a.quick_delete(EMPLOYEES, "status", "inactive", Operator::Eq).await.unwrap();
    let full = b
        .execute_delete(
            EMPLOYEES,
            &[Condition::equals("status", "inactive")],
            BulkDeleteOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(
        (quick.found, quick.deleted, quick.failed, quick.batches_processed),
        (full.found, full.deleted, full.failed, full.batches_processed)
    );
    assert_eq!(quick.found, 30 + 12);
    assert_eq!(a.store().records(EMPLOYEES), b.store().records(EMPLOYEES));
}

#[tokio::test]
async fn coercion_does_not_cross_types() {
    let engine = BulkEngine::new(employees(10, 0));
    // `active` is stored as a boolean; "1" coerces to a number
    let stats = engine.quick_delete(EMPLOYEES, "active", "1", Operator::Eq).await.unwrap();
    assert_eq!(stats.found, 0);
    let stats = engine.quick_delete(EMPLOYEES, "active", "TRUE", Operator::Eq).await.unwrap();
    assert_eq!(stats.found, 5);
}

#[tokio::test(start_paused = true)]
async fn oversized_batches_fail_at_the_store() {
    let engine = BulkEngine::new(employees(1200, 0));
    let opts = BulkDeleteOptions { batch_size: 600, ..BulkDeleteOptions::default() };
    let stats = engine.execute_delete(EMPLOYEES, &company_aaa(), opts).await.unwrap();
    assert_eq!((stats.found, stats.deleted, stats.failed), (1200, 0, 1200));
    assert_eq!(stats.errors.len(), 2);
    assert!(stats.errors[0].contains("store limit is 500"));
    assert_eq!(engine.store().len(EMPLOYEES), 1200);
}

#[tokio::test]
async fn unknown_collection_is_a_terminal_error() {
    let engine = BulkEngine::new(MemoryStore::new());
    let stats = engine
        .execute_delete("nope", &company_aaa(), BulkDeleteOptions::default())
        .await
        .unwrap();
    assert_eq!(stats.found, 0);
    assert_eq!(stats.errors, vec!["Query failed: Collection not found: nope".to_string()]);
}

#[tokio::test]
async fn invalid_conditions_rejected_without_io() {
    let engine = BulkEngine::new(employees(5, 0));
    assert!(engine.validate_conditions(&company_aaa()).is_ok());
    for bad in [
        vec![],
        vec![Condition::equals("", "AAA")],
        vec![Condition::from_raw("company", Operator::Eq, "")],
    ] {
        assert!(matches!(engine.validate_conditions(&bad), Err(BulkError::Validation(_))));
        assert!(matches!(
            engine.execute_delete(EMPLOYEES, &bad, BulkDeleteOptions::default()).await,
            Err(BulkError::Validation(_))
        ));
    }
    // list operators accept an empty value
    let empty_in = [Condition::from_raw("company", Operator::In, "")];
    assert!(engine.validate_conditions(&empty_in).is_ok());
    assert_eq!(engine.count_matches(EMPLOYEES, &empty_in).await.unwrap(), 0);
    assert_eq!(engine.store().len(EMPLOYEES), 5);
}

#[tokio::test(start_paused = true)]
async fn over_long_not_in_list_is_rejected_not_truncated() {
    let store = MemoryStore::new();
    store.insert_many(
        "depts",
        (0..=1000).map(|i| Record::new(format!("d-{i:04}"), doc! {"dept": format!("d{i}")})),
    );
    let engine = BulkEngine::new(store);
    let every_dept = (0..=1000).map(|i| format!("d{i}")).collect::<Vec<_>>().join(",");
    let conds = [Condition::from_raw("dept", Operator::NotIn, &every_dept)];
    assert!(matches!(
        engine.execute_delete("depts", &conds, BulkDeleteOptions::default()).await,
        Err(BulkError::Validation(_))
    ));
    assert_eq!(engine.store().len("depts"), 1001);

    // at the limit the whole list is honoured: only the one unlisted dept goes
    let all_but_last = (0..1000).map(|i| format!("d{i}")).collect::<Vec<_>>().join(",");
    let conds = [Condition::from_raw("dept", Operator::NotIn, &all_but_last)];
    let stats = engine.execute_delete("depts", &conds, BulkDeleteOptions::default()).await.unwrap();
    assert_eq!((stats.found, stats.deleted), (1, 1));
    assert_eq!(engine.store().len("depts"), 1000);
}
