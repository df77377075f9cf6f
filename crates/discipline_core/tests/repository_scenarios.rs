mod common;

use common::TestStore;
use discipline_core::{
    aggregate, CaseId, CasePriority, CaseRecord, CaseRepository, CaseSource, CaseStatus, NewComplaint, PortError,
    RecordStore, StoreKey,
};
use serde_json::json;
use std::sync::Arc;

fn teacher_record(id: i64, title: &str) -> CaseRecord {
    CaseRecord::new(CaseId::Number(id), title, CaseSource::Teacher)
}

#[tokio::test]
async fn snapshot_short_circuits_stale_local_data_after_bootstrap() {
    let store = TestStore::shared();
    store.put(
        StoreKey::StudentComplaints,
        r#"[{"id":99,"title":"Previous student's case","status":"pending"}]"#,
    );
    store.put(StoreKey::Activities, r#"[{"action":"login"}]"#);
    store.put(StoreKey::Theme, "dark");

    let snapshot = vec![
        json!({"case_type": "Late Arrival", "date": "2024-03-01", "description": "Bus"}),
        json!({"category": "Uniform Violation", "date": "2024-03-02", "status": "resolved", "priority": "high"}),
    ];
    let mut repo = CaseRepository::with_snapshot(store.clone(), snapshot);
    repo.clear_all().await.unwrap();
    let records = repo.load_records().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, CaseId::Text("server-0".into()));
    assert_eq!(records[0].title, "Late Arrival");
    assert_eq!(records[1].status, CaseStatus::Resolved);
    assert_eq!(records[1].priority, CasePriority::High);
    assert!(records.iter().all(|r| r.source == CaseSource::Server));

    assert_eq!(store.peek(StoreKey::StudentComplaints), None);
    assert_eq!(store.peek(StoreKey::Activities), None);
    assert_eq!(store.peek(StoreKey::Theme).as_deref(), Some("dark"));
}

#[tokio::test]
async fn snapshot_wins_even_without_a_clear() {
    let store = TestStore::shared();
    store.put(StoreKey::StudentComplaints, r#"[{"id":1,"title":"local"}]"#);

    let mut repo = CaseRepository::with_snapshot(store, vec![json!({"category": "Other"})]);
    let records = repo.load_records().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Other");
}

#[tokio::test]
async fn malformed_local_store_reads_as_empty() {
    let store = TestStore::shared();
    store.put(StoreKey::StudentComplaints, "{{ definitely not json");

    let mut repo = CaseRepository::new(store);
    assert!(repo.load_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn seeded_repository_aggregates_to_expected_counts() {
    let store = TestStore::shared();
    store.put(
        StoreKey::StudentComplaints,
        r#"[{"id":1,"status":"pending","priority":"low"},{"id":2,"status":"resolved","priority":"medium"}]"#,
    );
    let mut repo = CaseRepository::new(store);
    let stats = aggregate(&repo.load_records().await.unwrap());

    let status = serde_json::to_value(&stats.by_status).unwrap();
    let priority = serde_json::to_value(&stats.by_priority).unwrap();
    assert_eq!(status, json!({"pending": 1, "in-progress": 0, "resolved": 1, "rejected": 0}));
    assert_eq!(priority, json!({"low": 1, "medium": 1, "high": 0, "urgent": 0}));
}

#[tokio::test]
async fn upsert_of_known_id_leaves_the_list_unchanged() {
    let store = TestStore::shared();
    let mut repo = CaseRepository::new(store.clone());
    repo.save_records(vec![teacher_record(1, "a"), teacher_record(2, "b")]).await.unwrap();
    let before = repo.records().to_vec();
    let writes = store.writes();

    let added = repo.upsert_from_external(vec![teacher_record(2, "b again")]).await.unwrap();

    assert!(added.is_empty());
    assert_eq!(repo.records(), before.as_slice());
    assert_eq!(store.writes(), writes);
}

#[tokio::test]
async fn upsert_appends_unknown_ids_once_and_persists() {
    let store = TestStore::shared();
    let mut repo = CaseRepository::new(store.clone());
    repo.save_records(vec![teacher_record(1, "a")]).await.unwrap();

    let added = repo
        .upsert_from_external(vec![teacher_record(3, "c"), teacher_record(3, "c dup"), teacher_record(1, "a")])
        .await
        .unwrap();

    assert_eq!(added.len(), 1);
    assert_eq!(added[0].title, "c");
    assert_eq!(repo.records().len(), 2);

    let persisted: serde_json::Value = serde_json::from_str(&store.peek(StoreKey::StudentComplaints).unwrap()).unwrap();
    assert_eq!(persisted[1]["id"], 3);
    assert_eq!(persisted[1]["source"], "teacher");
}

#[tokio::test]
async fn save_replaces_prior_content() {
    let store = TestStore::shared();
    let mut repo = CaseRepository::new(store.clone());
    repo.save_records(vec![teacher_record(1, "a"), teacher_record(2, "b")]).await.unwrap();
    repo.save_records(vec![teacher_record(5, "e")]).await.unwrap();

    let mut fresh = CaseRepository::new(store);
    let records = fresh.load_records().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, CaseId::Number(5));
    assert_eq!(records[0].source, CaseSource::Teacher);
}

#[tokio::test]
async fn students_may_only_edit_their_own_cases() {
    let store = TestStore::shared();
    let mut repo = CaseRepository::new(store);
    repo.save_records(vec![teacher_record(1, "from teacher")]).await.unwrap();

    let own = repo
        .submit(NewComplaint {
            title: "Broken locker".into(),
            description: "Row B".into(),
            priority: Some(CasePriority::High),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(own.id, CaseId::Number(2));
    assert_eq!(own.category, "General");
    assert_eq!(own.source, CaseSource::Student);

    let resolved = repo.resolve(&own.id).await.unwrap();
    assert_eq!(resolved.status, CaseStatus::Resolved);

    let denied = repo.resolve(&CaseId::Number(1)).await;
    assert!(matches!(denied, Err(PortError::PermissionDenied(_))));
    let denied = repo.delete(&CaseId::Number(1)).await;
    assert!(matches!(denied, Err(PortError::PermissionDenied(_))));

    repo.delete(&own.id).await.unwrap();
    assert_eq!(repo.records().len(), 1);
    assert!(matches!(repo.delete(&own.id).await, Err(PortError::NotFound(_))));
}

#[tokio::test]
async fn submissions_need_a_title() {
    let mut repo = CaseRepository::new(TestStore::shared());
    let result = repo.submit(NewComplaint { title: "   ".into(), ..Default::default() }).await;
    assert!(matches!(result, Err(PortError::InvalidInput(_))));
}

#[tokio::test]
async fn submitting_after_the_largest_id_is_an_error() {
    let store = TestStore::shared();
    store.put(StoreKey::StudentComplaints, &format!(r#"[{{"id":{},"title":"x"}}]"#, i64::MAX));
    let mut repo = CaseRepository::new(store.clone());
    repo.load_records().await.unwrap();

    assert!(matches!(repo.next_numeric_id(), Err(PortError::InvalidInput(_))));
    let result = repo.submit(NewComplaint { title: "Late".into(), ..Default::default() }).await;
    assert!(matches!(result, Err(PortError::InvalidInput(_))));
    assert_eq!(repo.records().len(), 1);
}

#[tokio::test]
async fn reload_keeps_records_when_key_is_absent() {
    let store = TestStore::shared();
    let mut repo = CaseRepository::with_snapshot(store.clone(), vec![json!({"category": "Other"})]);
    repo.load_records().await.unwrap();

    assert!(!repo.reload_local().await.unwrap());
    assert_eq!(repo.records().len(), 1);

    store.set(StoreKey::StudentComplaints, r#"[{"id":1},{"id":2}]"#.into()).await.unwrap();
    assert!(repo.reload_local().await.unwrap());
    assert_eq!(repo.records().len(), 2);
}

#[tokio::test]
async fn path_ids_resolve_to_typed_ids() {
    let store: Arc<TestStore> = TestStore::shared();
    let mut repo = CaseRepository::new(store);
    repo.save_records(vec![teacher_record(7, "x"), CaseRecord::new("abc".into(), "y", CaseSource::Student)])
        .await
        .unwrap();

    assert_eq!(repo.find_id("7"), Some(CaseId::Number(7)));
    assert_eq!(repo.find_id("abc"), Some(CaseId::Text("abc".into())));
    assert_eq!(repo.find_id("8"), None);
}
