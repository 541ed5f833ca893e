// aegi-core/src/runtime/memory_store.rs
// ============================================================================
// Module: In-Memory Evidence Store
// Description: Simple in-memory evidence store for tests and the CLI demo.
// Purpose: Provide a deterministic EvidenceStore implementation without
//          external dependencies.
// Dependencies: crate::{ids, interfaces, model}
// ============================================================================

//! ## Overview
//! Not intended for production use: a durable backend lives in its own
//! crate and implements the same [`EvidenceStore`] trait.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ids::AssertionUid;
use crate::ids::CaseUid;
use crate::ids::ChunkUid;
use crate::ids::EvidenceUid;
use crate::ids::HypothesisUid;
use crate::interfaces::EvidenceStore;
use crate::interfaces::StoreError;
use crate::model::Assertion;
use crate::model::Chunk;
use crate::model::Evidence;
use crate::model::Hypothesis;
use crate::model::SourceClaim;

#[derive(Debug, Default)]
struct Tables {
    chunks: BTreeMap<String, Chunk>,
    source_claims_by_chunk: BTreeMap<String, Vec<SourceClaim>>,
    evidence: BTreeMap<String, Evidence>,
    assertions: BTreeMap<String, Assertion>,
    hypotheses: BTreeMap<String, Hypothesis>,
}

/// In-memory [`EvidenceStore`] for tests and local demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEvidenceStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryEvidenceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Io("evidence store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl EvidenceStore for InMemoryEvidenceStore {
    async fn put_chunk(&self, chunk: &Chunk) -> Result<(), StoreError> {
        self.lock()?
            .chunks
            .insert(chunk.uid.as_str().to_string(), chunk.clone());
        Ok(())
    }

    async fn get_chunk(&self, uid: &ChunkUid) -> Result<Option<Chunk>, StoreError> {
        Ok(self.lock()?.chunks.get(uid.as_str()).cloned())
    }

    async fn put_source_claim(&self, claim: &SourceClaim) -> Result<(), StoreError> {
        self.lock()?
            .source_claims_by_chunk
            .entry(claim.chunk_uid.as_str().to_string())
            .or_default()
            .push(claim.clone());
        Ok(())
    }

    async fn list_source_claims_by_chunk(
        &self,
        chunk_uid: &ChunkUid,
    ) -> Result<Vec<SourceClaim>, StoreError> {
        Ok(self
            .lock()?
            .source_claims_by_chunk
            .get(chunk_uid.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn put_evidence(&self, evidence: &Evidence) -> Result<(), StoreError> {
        self.lock()?
            .evidence
            .insert(evidence.uid.as_str().to_string(), evidence.clone());
        Ok(())
    }

    async fn get_evidence(&self, uid: &EvidenceUid) -> Result<Option<Evidence>, StoreError> {
        Ok(self.lock()?.evidence.get(uid.as_str()).cloned())
    }

    async fn list_evidence_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Evidence>, StoreError> {
        Ok(self
            .lock()?
            .evidence
            .values()
            .filter(|row| &row.case_uid == case_uid)
            .cloned()
            .collect())
    }

    async fn put_assertion(&self, assertion: &Assertion) -> Result<(), StoreError> {
        self.lock()?
            .assertions
            .insert(assertion.uid.as_str().to_string(), assertion.clone());
        Ok(())
    }

    async fn get_assertion(&self, uid: &AssertionUid) -> Result<Option<Assertion>, StoreError> {
        Ok(self.lock()?.assertions.get(uid.as_str()).cloned())
    }

    async fn list_assertions_by_case(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<Assertion>, StoreError> {
        Ok(self
            .lock()?
            .assertions
            .values()
            .filter(|row| &row.case_uid == case_uid)
            .cloned()
            .collect())
    }

    async fn put_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), StoreError> {
        self.lock()?
            .hypotheses
            .insert(hypothesis.uid.as_str().to_string(), hypothesis.clone());
        Ok(())
    }

    async fn list_hypotheses_by_case(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<Hypothesis>, StoreError> {
        Ok(self
            .lock()?
            .hypotheses
            .values()
            .filter(|row| &row.case_uid == case_uid)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::CaseUid;
    use crate::time::Timestamp;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid unix time"))
    }

    #[tokio::test]
    async fn put_then_get_evidence_round_trips() {
        let store = InMemoryEvidenceStore::new();
        let evidence = Evidence {
            uid: EvidenceUid::new("evid_1"),
            case_uid: CaseUid::new("case_1"),
            chunk_uid: ChunkUid::new("chunk_1"),
            kind: crate::model::EvidenceKind::Document,
            retention: crate::model::RetentionMetadata {
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
        let store = InMemoryEvidenceStore::new();
        let case_a = CaseUid::new("case_a");
        let case_b = CaseUid::new("case_b");
        for (uid, case) in [("evid_a", &case_a), ("evid_b", &case_b)] {
            let evidence = Evidence {
                uid: EvidenceUid::new(uid),
                case_uid: case.clone(),
                chunk_uid: ChunkUid::new("chunk_1"),
                kind: crate::model::EvidenceKind::Manual,
                retention: crate::model::RetentionMetadata {
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
}
