// aegi-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Integration tests for SqliteStore against a temp-file-backed database.
// ============================================================================

use aegi_core::EvidenceStore;
use aegi_core::GraphStore;
use aegi_core::ids::CaseUid;
use aegi_core::ids::ChunkUid;
use aegi_core::ids::EntityIdentityActionUid;
use aegi_core::ids::EntityUid;
use aegi_core::ids::EvidenceUid;
use aegi_core::ids::RelationFactUid;
use aegi_core::model::Entity;
use aegi_core::model::Evidence;
use aegi_core::model::EvidenceKind;
use aegi_core::model::RelationFact;
use aegi_core::model::RetentionMetadata;
use aegi_store_sqlite::SqliteStore;
use aegi_store_sqlite::SqliteStoreConfig;

fn now() -> aegi_core::Timestamp {
    aegi_core::Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid unix time"))
}

fn open_temp_store(dir: &tempfile::TempDir) -> SqliteStore {
    let config = SqliteStoreConfig::new(dir.path().join("aegi_test.sqlite3"));
    SqliteStore::open(&config).expect("open store")
}

#[tokio::test]
async fn put_then_get_evidence_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_temp_store(&dir);

    let evidence = Evidence {
        uid: EvidenceUid::new("evid_1"),
        case_uid: CaseUid::new("case_1"),
        chunk_uid: ChunkUid::new("chunk_1"),
        kind: EvidenceKind::Document,
        retention: RetentionMetadata {
            expires_at: None,
            pinned: false,
        },
        created_at: now(),
    };
    store.put_evidence(&evidence).await.expect("put");
    let loaded = store
        .get_evidence(&evidence.uid)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(loaded, evidence);
}

#[tokio::test]
async fn list_evidence_by_case_filters_other_cases() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_temp_store(&dir);
    let case_a = CaseUid::new("case_a");
    let case_b = CaseUid::new("case_b");
    for (uid, case) in [("evid_a", &case_a), ("evid_b", &case_b)] {
        let evidence = Evidence {
            uid: EvidenceUid::new(uid),
            case_uid: case.clone(),
            chunk_uid: ChunkUid::new("chunk_1"),
            kind: EvidenceKind::Manual,
            retention: RetentionMetadata {
                expires_at: None,
                pinned: false,
            },
            created_at: now(),
        };
        store.put_evidence(&evidence).await.expect("put");
    }
    let in_a = store.list_evidence_by_case(&case_a).await.expect("list");
    assert_eq!(in_a.len(), 1);
    assert_eq!(in_a[0].uid, EvidenceUid::new("evid_a"));
}

#[tokio::test]
async fn put_is_idempotent_on_same_uid() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_temp_store(&dir);
    let mut evidence = Evidence {
        uid: EvidenceUid::new("evid_1"),
        case_uid: CaseUid::new("case_1"),
        chunk_uid: ChunkUid::new("chunk_1"),
        kind: EvidenceKind::Document,
        retention: RetentionMetadata {
            expires_at: None,
            pinned: false,
        },
        created_at: now(),
    };
    store.put_evidence(&evidence).await.expect("put");
    evidence.retention.pinned = true;
    store.put_evidence(&evidence).await.expect("put again");

    let loaded = store
        .get_evidence(&evidence.uid)
        .await
        .expect("get")
        .expect("present");
    assert!(loaded.retention.pinned);
    assert_eq!(store.list_evidence_by_case(&evidence.case_uid).await.expect("list").len(), 1);
}

#[tokio::test]
async fn graph_store_round_trips_entities_and_relations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_temp_store(&dir);
    let case_uid = CaseUid::new("case_1");

    let subject = Entity {
        uid: EntityUid::new("entity_subject"),
        case_uid: case_uid.clone(),
        entity_type: "person".to_string(),
        canonical_name: "Jane Doe".to_string(),
        aliases: vec!["J. Doe".to_string()],
        created_at: now(),
        updated_at: now(),
    };
    let object = Entity {
        uid: EntityUid::new("entity_object"),
        case_uid: case_uid.clone(),
        entity_type: "organization".to_string(),
        canonical_name: "Acme Corp".to_string(),
        aliases: vec![],
        created_at: now(),
        updated_at: now(),
    };
    store.put_entity(&subject).await.expect("put subject");
    store.put_entity(&object).await.expect("put object");

    let relation = RelationFact {
        uid: RelationFactUid::new("relation_1"),
        case_uid: case_uid.clone(),
        relation_type: "affiliated_with".to_string(),
        subject_entity_uid: subject.uid.clone(),
        object_entity_uid: object.uid.clone(),
        assertion_uids: vec![],
        created_at: now(),
    };
    store.put_relation_fact(&relation).await.expect("put relation");

    let entities = store.list_entities_by_case(&case_uid).await.expect("list entities");
    assert_eq!(entities.len(), 2);

    let relations_for_subject = store
        .list_relations_by_entity(&subject.uid)
        .await
        .expect("list relations by subject");
    assert_eq!(relations_for_subject.len(), 1);

    let relations_for_object = store
        .list_relations_by_entity(&object.uid)
        .await
        .expect("list relations by object");
    assert_eq!(relations_for_object.len(), 1);
}

#[tokio::test]
async fn identity_actions_list_only_pending() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = open_temp_store(&dir);
    let case_uid = CaseUid::new("case_1");

    let pending = aegi_core::model::EntityIdentityAction {
        uid: EntityIdentityActionUid::new("action_pending"),
        case_uid: case_uid.clone(),
        action_type: aegi_core::model::EntityIdentityActionType::Merge,
        entity_uids: vec![EntityUid::new("entity_a"), EntityUid::new("entity_b")],
        confidence: 0.9,
        status: aegi_core::model::EntityIdentityActionStatus::Pending,
        created_at: now(),
    };
    let mut resolved = pending.clone();
    resolved.uid = EntityIdentityActionUid::new("action_resolved");
    resolved.status = aegi_core::model::EntityIdentityActionStatus::Approved;

    store.put_identity_action(&pending).await.expect("put pending");
    store.put_identity_action(&resolved).await.expect("put resolved");

    let pending_only = store
        .list_pending_identity_actions(&case_uid)
        .await
        .expect("list pending");
    assert_eq!(pending_only.len(), 1);
    assert_eq!(pending_only[0].uid, pending.uid);

    let loaded_resolved = store
        .get_identity_action(&resolved.uid)
        .await
        .expect("get resolved")
        .expect("present");
    assert_eq!(loaded_resolved.status, aegi_core::model::EntityIdentityActionStatus::Approved);
}

#[tokio::test]
async fn reopening_an_existing_database_does_not_reset_data() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = SqliteStoreConfig::new(dir.path().join("aegi_test.sqlite3"));
    let evidence = Evidence {
        uid: EvidenceUid::new("evid_1"),
        case_uid: CaseUid::new("case_1"),
        chunk_uid: ChunkUid::new("chunk_1"),
        kind: EvidenceKind::Document,
        retention: RetentionMetadata {
            expires_at: None,
            pinned: false,
        },
        created_at: now(),
    };
    {
        let store = SqliteStore::open(&config).expect("open store");
        store.put_evidence(&evidence).await.expect("put");
    }
    let reopened = SqliteStore::open(&config).expect("reopen store");
    let loaded = reopened
        .get_evidence(&evidence.uid)
        .await
        .expect("get")
        .expect("present");
    assert_eq!(loaded, evidence);
}
