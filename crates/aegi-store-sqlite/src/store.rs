// aegi-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Store
// Description: Durable EvidenceStore and GraphStore backed by SQLite, with
//              each row holding its model's canonical JSON alongside the
//              indexed columns the trait's list/filter methods need.
// Purpose: Give the analysis pipeline and orchestrator a durable backend
//          without threading rusqlite through their call sites.
// Dependencies: aegi-core, rusqlite
// ============================================================================

//! ## Overview
//! One [`SqliteStore`] implements both [`EvidenceStore`] and [`GraphStore`]
//! against a single `SQLite` file, the way the teacher's run-state store
//! implements more than one core trait against one connection. The
//! connection is guarded by a single [`Mutex`] rather than a writer-thread
//! gateway: the core's scheduling model runs one pipeline stage at a time on
//! a single-threaded cooperative loop (§5), so a dedicated writer queue and
//! read-connection pool would add concurrency this store never sees.

use std::sync::Arc;
use std::sync::Mutex;

use aegi_core::GraphStore;
use aegi_core::StoreError;
use aegi_core::ids::AssertionUid;
use aegi_core::ids::CaseUid;
use aegi_core::ids::ChunkUid;
use aegi_core::ids::EntityIdentityActionUid;
use aegi_core::ids::EntityUid;
use aegi_core::ids::EvidenceUid;
use aegi_core::model::Assertion;
use aegi_core::model::Chunk;
use aegi_core::model::Entity;
use aegi_core::model::EntityIdentityAction;
use aegi_core::model::EntityIdentityActionStatus;
use aegi_core::model::Evidence;
use aegi_core::model::Hypothesis;
use aegi_core::model::RelationFact;
use aegi_core::model::SourceClaim;
use async_trait::async_trait;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;

use crate::config::SqliteStoreConfig;
use crate::connection::open_connection;
use crate::error::SqliteStoreError;

/// Durable store implementing [`EvidenceStore`](aegi_core::EvidenceStore)
/// and [`GraphStore`] against a single `SQLite` file.
pub struct SqliteStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (creating if needed) the `SQLite` store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the connection cannot be opened or
    /// the schema cannot be initialized or validated.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let connection = open_connection(config)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Io("sqlite connection mutex poisoned".to_string()))
    }
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|err| StoreError::Invalid(err.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(json: &str) -> Result<T, StoreError> {
    serde_json::from_str(json).map_err(|err| StoreError::Invalid(format!("corrupt row: {err}")))
}

#[async_trait]
impl aegi_core::EvidenceStore for SqliteStore {
    async fn put_chunk(&self, chunk: &Chunk) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chunks (uid, case_uid, data_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET case_uid = excluded.case_uid, data_json = excluded.data_json",
            params![chunk.uid.as_str(), chunk.case_uid.as_str(), encode(chunk)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn get_chunk(&self, uid: &ChunkUid) -> Result<Option<Chunk>, StoreError> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row("SELECT data_json FROM chunks WHERE uid = ?1", params![uid.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|json| decode(&json)).transpose()
    }

    async fn put_source_claim(&self, claim: &SourceClaim) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO source_claims (uid, case_uid, chunk_uid, data_json) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uid) DO UPDATE SET data_json = excluded.data_json",
            params![
                claim.uid.as_str(),
                claim.case_uid.as_str(),
                claim.chunk_uid.as_str(),
                encode(claim)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn list_source_claims_by_chunk(
        &self,
        chunk_uid: &ChunkUid,
    ) -> Result<Vec<SourceClaim>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT data_json FROM source_claims WHERE chunk_uid = ?1 ORDER BY rowid")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![chunk_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn put_evidence(&self, evidence: &Evidence) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO evidence (uid, case_uid, data_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET data_json = excluded.data_json",
            params![evidence.uid.as_str(), evidence.case_uid.as_str(), encode(evidence)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn get_evidence(&self, uid: &EvidenceUid) -> Result<Option<Evidence>, StoreError> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row("SELECT data_json FROM evidence WHERE uid = ?1", params![uid.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|json| decode(&json)).transpose()
    }

    async fn list_evidence_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Evidence>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT data_json FROM evidence WHERE case_uid = ?1 ORDER BY rowid")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![case_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn put_assertion(&self, assertion: &Assertion) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO assertions (uid, case_uid, data_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET data_json = excluded.data_json",
            params![assertion.uid.as_str(), assertion.case_uid.as_str(), encode(assertion)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn get_assertion(&self, uid: &AssertionUid) -> Result<Option<Assertion>, StoreError> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row(
                "SELECT data_json FROM assertions WHERE uid = ?1",
                params![uid.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|json| decode(&json)).transpose()
    }

    async fn list_assertions_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Assertion>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT data_json FROM assertions WHERE case_uid = ?1 ORDER BY rowid")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![case_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn put_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO hypotheses (uid, case_uid, data_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET data_json = excluded.data_json",
            params![hypothesis.uid.as_str(), hypothesis.case_uid.as_str(), encode(hypothesis)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn list_hypotheses_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Hypothesis>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT data_json FROM hypotheses WHERE case_uid = ?1 ORDER BY rowid")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![case_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn readiness(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.query_row("SELECT 1", params![], |_| Ok(()))
            .map_err(|err| StoreError::Io(err.to_string()))
    }
}

#[async_trait]
impl GraphStore for SqliteStore {
    async fn put_entity(&self, entity: &Entity) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO entities (uid, case_uid, data_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(uid) DO UPDATE SET data_json = excluded.data_json",
            params![entity.uid.as_str(), entity.case_uid.as_str(), encode(entity)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn get_entity(&self, uid: &EntityUid) -> Result<Option<Entity>, StoreError> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row("SELECT data_json FROM entities WHERE uid = ?1", params![uid.as_str()], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|json| decode(&json)).transpose()
    }

    async fn list_entities_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Entity>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT data_json FROM entities WHERE case_uid = ?1 ORDER BY rowid")
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![case_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn put_relation_fact(&self, relation: &RelationFact) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO relation_facts (uid, subject_entity_uid, object_entity_uid, data_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uid) DO UPDATE SET data_json = excluded.data_json",
            params![
                relation.uid.as_str(),
                relation.subject_entity_uid.as_str(),
                relation.object_entity_uid.as_str(),
                encode(relation)?
            ],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn list_relations_by_entity(&self, entity_uid: &EntityUid) -> Result<Vec<RelationFact>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT data_json FROM relation_facts
                 WHERE subject_entity_uid = ?1 OR object_entity_uid = ?1
                 ORDER BY rowid",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![entity_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn put_identity_action(&self, action: &EntityIdentityAction) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let status = match action.status {
            EntityIdentityActionStatus::Pending => "pending",
            EntityIdentityActionStatus::Approved => "approved",
            EntityIdentityActionStatus::Rejected => "rejected",
        };
        conn.execute(
            "INSERT INTO identity_actions (uid, case_uid, status, data_json) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(uid) DO UPDATE SET status = excluded.status, data_json = excluded.data_json",
            params![action.uid.as_str(), action.case_uid.as_str(), status, encode(action)?],
        )
        .map_err(|err| StoreError::Io(err.to_string()))?;
        Ok(())
    }

    async fn list_pending_identity_actions(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<EntityIdentityAction>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT data_json FROM identity_actions WHERE case_uid = ?1 AND status = 'pending'
                 ORDER BY rowid",
            )
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let rows = stmt
            .query_map(params![case_uid.as_str()], |row| row.get::<_, String>(0))
            .map_err(|err| StoreError::Io(err.to_string()))?;
        let mut out = Vec::new();
        for row in rows {
            let json = row.map_err(|err| StoreError::Io(err.to_string()))?;
            out.push(decode(&json)?);
        }
        Ok(out)
    }

    async fn get_identity_action(
        &self,
        uid: &EntityIdentityActionUid,
    ) -> Result<Option<EntityIdentityAction>, StoreError> {
        let conn = self.lock()?;
        let row: Option<String> = conn
            .query_row(
                "SELECT data_json FROM identity_actions WHERE uid = ?1",
                params![uid.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| StoreError::Io(err.to_string()))?;
        row.map(|json| decode(&json)).transpose()
    }
}
