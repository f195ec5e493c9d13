use super::fakes::{Harness, condition};

fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_owned()).collect()
}

#[tokio::test]
async fn test_ingest_stores_new_candidates_unprocessed() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    harness.source.publish(condition("1002", "ACTIVE"));

    let inserted = harness.engine().ingest(&ids(&["1001", "1002"])).await;

    assert_eq!(inserted.len(), 2);
    assert_eq!(harness.storage.condition_count().unwrap(), 2);
    assert_eq!(harness.storage.is_processed("1001").unwrap(), Some(false));
    assert_eq!(harness.storage.is_processed("1002").unwrap(), Some(false));
}

#[tokio::test]
async fn test_ingest_is_idempotent_and_skips_fetch_for_known_ids() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    let engine = harness.engine();

    assert_eq!(engine.ingest(&ids(&["1001"])).await.len(), 1);
    let fetches = harness.source.fetch_count();

    assert!(engine.ingest(&ids(&["1001"])).await.is_empty());
    assert_eq!(harness.source.fetch_count(), fetches);
    assert_eq!(harness.storage.condition_count().unwrap(), 1);
}

#[tokio::test]
async fn test_ingest_collapses_duplicate_candidates() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));

    let inserted = harness.engine().ingest(&ids(&["1001", "1001", "1001"])).await;

    assert_eq!(inserted.len(), 1);
    assert_eq!(harness.source.fetch_count(), 1);
}

#[tokio::test]
async fn test_ingest_isolates_failing_ids() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    harness.source.publish(condition("1002", "ACTIVE"));
    harness.source.break_record("1001");

    let batch = harness.engine().ingest_batch(&ids(&["1001", "1002", "404"])).await;

    assert_eq!(batch.failed, 2);
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].id, "1002");
    assert!(!harness.storage.condition_exists("1001").unwrap());
}

#[tokio::test]
async fn test_ingest_accepts_records_with_empty_optional_fields() {
    let harness = Harness::new();
    let mut record = condition("1001", "ACTIVE");
    record.risk_description = String::new();
    record.weather_description = String::new();
    harness.source.publish(record);

    let inserted = harness.engine().ingest(&ids(&["1001"])).await;

    assert_eq!(inserted.len(), 1);
    let stored = harness.storage.get_condition("1001").unwrap().unwrap();
    assert_eq!(stored.risk_description, "");
}

#[tokio::test]
async fn test_detect_changes_updates_status_and_emits_once() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    let engine = harness.engine();
    engine.ingest(&ids(&["1001"])).await;

    harness.source.set_status("1001", "RESOLVED");
    let stored = engine.stored().unwrap();
    let changes = engine.detect_changes(&stored).await;

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].id, "1001");
    assert_eq!(changes[0].old_status, "ACTIVE");
    assert_eq!(changes[0].new_status, "RESOLVED");
    assert_eq!(changes[0].title, "Trail 1001 closed");
    assert_eq!(harness.storage.get_condition("1001").unwrap().unwrap().status, "RESOLVED");

    let again = engine.detect_changes(&engine.stored().unwrap()).await;
    assert!(again.is_empty());
}

#[tokio::test]
async fn test_detect_changes_ignores_unchanged_and_stale_input() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    let engine = harness.engine();
    engine.ingest(&ids(&["1001"])).await;
    let snapshot = engine.stored().unwrap();

    assert!(engine.detect_changes(&snapshot).await.is_empty());

    harness.source.set_status("1001", "RESOLVED");
    assert_eq!(engine.detect_changes(&snapshot).await.len(), 1);
    // Same stale snapshot: the store already holds the new status.
    assert!(engine.detect_changes(&snapshot).await.is_empty());
}

#[tokio::test]
async fn test_detect_changes_continues_after_fetch_failure() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    harness.source.publish(condition("1002", "ACTIVE"));
    let engine = harness.engine();
    engine.ingest(&ids(&["1001", "1002"])).await;

    harness.source.break_record("1001");
    harness.source.set_status("1002", "RESOLVED");
    let batch = engine.detect_batch(&engine.stored().unwrap()).await;

    assert_eq!(batch.failed, 1);
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].id, "1002");
    assert_eq!(harness.storage.get_condition("1001").unwrap().unwrap().status, "ACTIVE");
}

#[tokio::test]
async fn test_pending_changes_report_undispatched_transitions() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    let engine = harness.engine();
    engine.ingest(&ids(&["1001"])).await;
    assert!(engine.pending_changes().unwrap().is_empty());

    harness.source.set_status("1001", "RESOLVED");
    engine.detect_changes(&engine.stored().unwrap()).await;

    let pending = engine.pending_changes().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].old_status, "ACTIVE");
    assert_eq!(pending[0].new_status, "RESOLVED");
}

#[tokio::test]
async fn test_fetch_and_store_keeps_existing_row() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    let engine = harness.engine();
    engine.ingest(&ids(&["1001"])).await;
    harness.storage.mark_processed("1001", chrono::NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()).unwrap();

    let stored = engine.fetch_and_store("1001").await.unwrap();

    assert!(stored.processed);
    assert_eq!(harness.storage.condition_count().unwrap(), 1);
}

#[tokio::test]
async fn test_detect_changes_does_not_depend_on_regions() {
    let harness = Harness::new();
    harness.source.publish(condition("1001", "ACTIVE"));
    let engine = harness.engine();
    engine.ingest(&ids(&["1001"])).await;

    harness.source.break_regions("1001");
    harness.source.set_status("1001", "RESOLVED");
    let batch = engine.detect_batch(&engine.stored().unwrap()).await;

    assert_eq!(batch.failed, 0);
    assert_eq!(batch.items.len(), 1);
    assert_eq!(batch.items[0].new_status, "RESOLVED");
    let stored = harness.storage.get_condition("1001").unwrap().unwrap();
    assert_eq!(stored.status, "RESOLVED");
    assert_eq!(stored.geometry_description, "district->Sibiu / ");
}
