//! Record store tests against the in-memory backend
//!
//! Covers refresh ordering, optimistic update with rollback, confirmed
//! delete and reset.

mod helpers;

use helpers::{record, FakeBackend};
use serde_json::{json, Map, Value};
use skills_common::{RecordId, SkillRecord};
use skills_dash::backend::SkillsBackend;
use skills_dash::error::{PersistError, ResetError};
use skills_dash::store::RecordStore;
use std::sync::Arc;
use std::time::Duration;

fn sample() -> Vec<SkillRecord> {
    vec![
        record(1, "Sales", "Band 2A", "Technical", 3),
        record(2, "Ops", "Band 1A", "Behavioral", 4),
        record(3, "Sales", "Band 3", "Functional", 2),
    ]
}

fn setup(records: Vec<SkillRecord>) -> (Arc<FakeBackend>, RecordStore) {
    let backend = Arc::new(FakeBackend::with_records(records));
    let store = RecordStore::new(backend.clone() as Arc<dyn SkillsBackend>);
    (backend, store)
}

fn patch(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

// ========================================
// Refresh
// ========================================

#[tokio::test]
async fn test_refresh_installs_backend_records() {
    let (_backend, store) = setup(sample());
    assert!(store.is_empty().await);
    assert!(store.last_refreshed().await.is_none());

    let records = store.refresh().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(store.len().await, 3);
    assert!(store.last_refreshed().await.is_some());
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_records() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();

    backend.set_records(vec![record(9, "Legal", "Band 4", "Technical", 1)]);
    backend.fail_next_fetch();
    assert!(store.refresh().await.is_err());

    let ids: Vec<_> = store.snapshot().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![RecordId::Int(1), RecordId::Int(2), RecordId::Int(3)]);
}

#[tokio::test]
async fn test_newest_refresh_wins() {
    let (backend, store) = setup(sample());
    let store = Arc::new(store);

    // First request sees the old data but answers last
    backend.push_fetch_delay(Duration::from_millis(200));
    let slow = {
        let store = store.clone();
        tokio::spawn(async move { store.refresh().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    backend.set_records(vec![record(7, "Legal", "Band 4", "Technical", 5)]);
    let fast = store.refresh().await.unwrap();
    assert_eq!(fast.len(), 1);

    let stale = slow.await.unwrap().unwrap();
    assert_eq!(stale.len(), 1, "stale result must not be installed");

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, RecordId::Int(7));
}

#[tokio::test]
async fn test_find_id_matches_rendered_form() {
    let mut text_record = record(0, "Ops", "Band 3", "Technical", 2);
    text_record.id = RecordId::Text("emp-42".to_string());
    let (_backend, store) = setup(vec![record(7, "Sales", "Band 3", "Technical", 2), text_record]);
    store.refresh().await.unwrap();

    assert_eq!(store.find_id("7").await, Some(RecordId::Int(7)));
    assert_eq!(
        store.find_id("emp-42").await,
        Some(RecordId::Text("emp-42".to_string()))
    );
    assert_eq!(store.find_id("8").await, None);
}

// ========================================
// Update
// ========================================

#[tokio::test]
async fn test_update_applies_backend_echo() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();

    let saved = store
        .update(&RecordId::Int(1), &patch(json!({"Proficiency_Level": 5})))
        .await
        .unwrap();

    assert_eq!(saved.proficiency_level(), Some(5));
    assert_eq!(
        store.get(&RecordId::Int(1)).await.unwrap().proficiency_level(),
        Some(5)
    );
    assert_eq!(backend.records()[0].proficiency_level(), Some(5));
}

#[tokio::test]
async fn test_failed_update_restores_exact_record() {
    let mut original = record(1, "Sales", "Band 2A", "Technical", 3);
    original.extra.insert("L1_UJR".to_string(), json!("Key Accounts"));
    let (backend, store) = setup(vec![original.clone()]);
    store.refresh().await.unwrap();

    backend.fail_writes("Database unavailable");
    let err = store
        .update(
            &RecordId::Int(1),
            &patch(json!({"Proficiency_Level": 5, "Skill_Name": "Renamed"})),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, PersistError::Backend(_)));
    assert_eq!(store.get(&RecordId::Int(1)).await, Some(original));
}

#[tokio::test]
async fn test_failed_update_keeps_record_from_later_refresh() {
    let (backend, store) = setup(sample());
    let store = Arc::new(store);
    store.refresh().await.unwrap();

    backend.set_update_delay(Duration::from_millis(200));
    backend.fail_writes("Database unavailable");
    let pending = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update(&RecordId::Int(1), &patch(json!({"Proficiency_Level": 5})))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(
        store.get(&RecordId::Int(1)).await.unwrap().proficiency_level(),
        Some(5),
        "optimistic value should be visible while the write is pending"
    );

    let mut fresher = sample();
    fresher[0].set_proficiency_level(Some(1));
    backend.set_records(fresher.clone());
    store.refresh().await.unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, PersistError::Backend(_)));
    assert_eq!(store.get(&RecordId::Int(1)).await, Some(fresher[0].clone()));
}

#[tokio::test]
async fn test_update_cannot_rekey_record() {
    let (_backend, store) = setup(sample());
    store.refresh().await.unwrap();

    let saved = store
        .update(&RecordId::Int(2), &patch(json!({"id": 99, "Band": "Band 3"})))
        .await
        .unwrap();

    assert_eq!(saved.id, RecordId::Int(2));
    assert!(store.get(&RecordId::Int(99)).await.is_none());
    assert_eq!(store.get(&RecordId::Int(2)).await.unwrap().band, "Band 3");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (_backend, store) = setup(sample());
    store.refresh().await.unwrap();

    let err = store
        .update(&RecordId::Int(404), &patch(json!({"Band": "Band 3"})))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::NotFound(RecordId::Int(404))));
}

#[tokio::test]
async fn test_update_of_record_missing_remotely_rolls_back() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();
    backend.remove_remote(&RecordId::Int(3));

    let err = store
        .update(&RecordId::Int(3), &patch(json!({"Proficiency_Level": 1})))
        .await
        .unwrap_err();

    assert!(matches!(err, PersistError::NotFound(_)));
    assert_eq!(
        store.get(&RecordId::Int(3)).await.unwrap().proficiency_level(),
        Some(2)
    );
}

#[tokio::test]
async fn test_synthetic_ids_are_never_sent() {
    let unsaved: SkillRecord = serde_json::from_value(json!({"Skill_Name": "Draft"})).unwrap();
    let id = unsaved.id.clone();
    let (backend, store) = setup(vec![unsaved]);
    store.refresh().await.unwrap();

    let err = store
        .update(&id, &patch(json!({"Band": "Band 3"})))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::NoServerIdentity(_)));

    let err = store.remove(&id).await.unwrap_err();
    assert!(matches!(err, PersistError::NoServerIdentity(_)));
    assert_eq!(backend.delete_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_edit_of_same_record_is_rejected() {
    let (backend, store) = setup(sample());
    let store = Arc::new(store);
    store.refresh().await.unwrap();
    backend.set_update_delay(Duration::from_millis(200));

    let first = {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .update(&RecordId::Int(1), &patch(json!({"Proficiency_Level": 5})))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    let err = store
        .update(&RecordId::Int(1), &patch(json!({"Proficiency_Level": 1})))
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::EditInProgress(_)));
    let err = store.remove(&RecordId::Int(1)).await.unwrap_err();
    assert!(matches!(err, PersistError::EditInProgress(_)));

    // A different record is not blocked
    backend.set_update_delay(Duration::ZERO);
    store
        .update(&RecordId::Int(2), &patch(json!({"Proficiency_Level": 1})))
        .await
        .unwrap();

    first.await.unwrap().unwrap();
    assert_eq!(
        store.get(&RecordId::Int(1)).await.unwrap().proficiency_level(),
        Some(5)
    );
}

// ========================================
// Remove
// ========================================

#[tokio::test]
async fn test_remove_waits_for_confirmation() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();

    backend.fail_writes("Locked");
    assert!(store.remove(&RecordId::Int(2)).await.is_err());
    assert!(store.get(&RecordId::Int(2)).await.is_some());

    backend.allow_writes();
    store.remove(&RecordId::Int(2)).await.unwrap();
    assert!(store.get(&RecordId::Int(2)).await.is_none());
    assert_eq!(store.len().await, 2);
    assert_eq!(backend.delete_calls(), 2);
}

#[tokio::test]
async fn test_remove_missing_remotely_is_not_found() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();
    backend.remove_remote(&RecordId::Int(1));

    let err = store.remove(&RecordId::Int(1)).await.unwrap_err();
    assert!(matches!(err, PersistError::NotFound(_)));
}

#[tokio::test]
async fn test_remove_unknown_id_skips_backend() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();

    let err = store.remove(&RecordId::Int(50)).await.unwrap_err();
    assert!(matches!(err, PersistError::NotFound(_)));
    assert_eq!(backend.delete_calls(), 0);
}

// ========================================
// Reset
// ========================================

#[tokio::test]
async fn test_reset_reloads_defaults() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();
    store.remove(&RecordId::Int(1)).await.unwrap();
    assert_eq!(store.len().await, 2);

    let records = store.reset_to_default().await.unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(store.len().await, 3);
    assert_eq!(backend.records().len(), 3);
}

#[tokio::test]
async fn test_failed_reset_keeps_data() {
    let (backend, store) = setup(sample());
    store.refresh().await.unwrap();
    backend.set_defaults(Vec::new());
    backend.fail_writes("Reset disabled");

    let err = store.reset_to_default().await.unwrap_err();
    assert!(matches!(err, ResetError::Persist(_)));
    assert_eq!(store.len().await, 3);
}
