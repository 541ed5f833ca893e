// aegi-orchestrator/src/retention.rs
// ============================================================================
// Module: Retention Sweep
// Description: Periodic expiry and hard-delete bookkeeping for evidence rows
//              no longer referenced by a report or claim (§4.15).
// Purpose: Keep a long-lived case's storage bounded without an analyst ever
//          having to manually prune it, while never touching evidence an
//          analyst has pinned or something still cites.
// Dependencies: aegi-core, aegi-bus
// ============================================================================

//! ## Overview
//! [`RetentionSweep::run`] lists a case's evidence, marks rows past their
//! time-to-live as expired (setting `retention.expires_at` if unset), and
//! separates out rows that expired more than `grace_period` ago and are not
//! in the caller-supplied `referenced` set. Every mutating write is audited
//! (§10.2, matching every other stage in this crate); physical deletion of
//! the returned candidates is left to the store backend, since
//! [`aegi_core::EvidenceStore`] exposes no delete operation — this sweep
//! only ever decides *what* is eligible.

use std::collections::BTreeSet;
use std::sync::Arc;

use aegi_core::ids::ActionUid;
use aegi_core::ids::CaseUid;
use aegi_core::ids::EvidenceUid;
use aegi_core::interfaces::AuditSink;
use aegi_core::interfaces::EvidenceStore;
use aegi_core::model::Action;
use aegi_core::model::AegiEvent;
use aegi_core::model::EventSeverity;
use aegi_core::model::RetentionMetadata;
use aegi_core::time::Timestamp;
use aegi_bus::EventBus;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tunables for one retention sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionConfig {
    /// Age at which an unpinned, un-expired evidence row becomes eligible
    /// for expiry.
    pub time_to_live_hours: f64,
    /// Time after expiry before an evidence row becomes a hard-delete
    /// candidate. Defaults to 7 days.
    pub grace_period_hours: f64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { time_to_live_hours: 24.0 * 90.0, grace_period_hours: 24.0 * 7.0 }
    }
}

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionSweepResult {
    /// Evidence rows newly marked expired this sweep.
    pub marked_expired: Vec<EvidenceUid>,
    /// Evidence rows past their grace period and unreferenced, ready for
    /// the store backend to hard-delete.
    pub hard_delete_candidates: Vec<EvidenceUid>,
}

// ============================================================================
// SECTION: Sweep
// ============================================================================

/// Runs the periodic expiry and hard-delete-candidate scan over one case's
/// evidence.
pub struct RetentionSweep {
    evidence_store: Arc<dyn EvidenceStore>,
    audit: Arc<dyn AuditSink>,
    bus: Arc<EventBus>,
    config: RetentionConfig,
}

impl RetentionSweep {
    /// Creates a sweep over `evidence_store`, auditing writes through
    /// `audit` and announcing its result on `bus`.
    #[must_use]
    pub fn new(
        evidence_store: Arc<dyn EvidenceStore>,
        audit: Arc<dyn AuditSink>,
        bus: Arc<EventBus>,
        config: RetentionConfig,
    ) -> Self {
        Self { evidence_store, audit, bus, config }
    }

    /// Runs one sweep over `case_uid`'s evidence. `referenced` is the set of
    /// evidence UIDs still cited by a live report, assertion, or claim;
    /// anything in it is exempt from both expiry and hard deletion
    /// regardless of age.
    ///
    /// # Errors
    ///
    /// Returns [`aegi_core::StoreError`] when the evidence store cannot be
    /// read or written.
    pub async fn run(
        &self,
        case_uid: &CaseUid,
        referenced: &BTreeSet<EvidenceUid>,
        now: Timestamp,
    ) -> Result<RetentionSweepResult, aegi_core::StoreError> {
        let evidence = self.evidence_store.list_evidence_by_case(case_uid).await?;
        let mut marked_expired = Vec::new();
        let mut hard_delete_candidates = Vec::new();

        for row in evidence {
            if row.retention.pinned || referenced.contains(&row.uid) {
                continue;
            }

            if let Some(expires_at) = row.retention.expires_at {
                let age_since_expiry = now.hours_since(expires_at);
                if age_since_expiry >= self.config.grace_period_hours {
                    hard_delete_candidates.push(row.uid.clone());
                }
                continue;
            }

            let age = now.hours_since(row.created_at);
            if age < self.config.time_to_live_hours {
                continue;
            }

            let mut updated = row;
            updated.retention = RetentionMetadata { expires_at: Some(now), pinned: false };
            let uid = updated.uid.clone();
            self.evidence_store.put_evidence(&updated).await?;
            self.record_action(case_uid, &uid, "retention.expired", now);
            marked_expired.push(uid);
        }

        self.emit(case_uid, marked_expired.len(), hard_delete_candidates.len(), now);
        Ok(RetentionSweepResult { marked_expired, hard_delete_candidates })
    }

    fn record_action(&self, case_uid: &CaseUid, evidence_uid: &EvidenceUid, operation: &str, now: Timestamp) {
        self.audit.record_action(&Action {
            uid: ActionUid::mint(),
            case_uid: Some(case_uid.clone()),
            operation: operation.to_string(),
            actor: "retention_sweep".to_string(),
            detail: serde_json::json!({ "evidence_uid": evidence_uid.as_str() }),
            created_at: now,
        });
    }

    fn emit(&self, case_uid: &CaseUid, expired: usize, hard_delete_candidates: usize, now: Timestamp) {
        self.bus.emit(AegiEvent::new(
            "retention.swept",
            Some(case_uid.clone()),
            EventSeverity::Info,
            serde_json::json!({ "expired": expired, "hard_delete_candidates": hard_delete_candidates }),
            now,
        ));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::ids::ChunkUid;
    use aegi_core::model::Evidence;
    use aegi_core::model::EvidenceKind;
    use aegi_core::runtime::InMemoryEvidenceStore;
    use aegi_core::runtime::NoopAuditSink;

    fn ts(hours_ago: f64) -> Timestamp {
        Timestamp::new(time::OffsetDateTime::now_utc() - time::Duration::seconds_f64(hours_ago * 3600.0))
    }

    fn evidence(case_uid: &CaseUid, created_at: Timestamp, expires_at: Option<Timestamp>, pinned: bool) -> Evidence {
        Evidence {
            uid: aegi_core::ids::EvidenceUid::mint(),
            case_uid: case_uid.clone(),
            chunk_uid: ChunkUid::mint(),
            kind: EvidenceKind::Document,
            retention: RetentionMetadata { expires_at, pinned },
            created_at,
        }
    }

    fn sweep() -> (RetentionSweep, Arc<InMemoryEvidenceStore>) {
        let store = Arc::new(InMemoryEvidenceStore::new());
        let sweep = RetentionSweep::new(
            store.clone(),
            Arc::new(NoopAuditSink),
            Arc::new(EventBus::new(Arc::new(NoopAuditSink))),
            RetentionConfig { time_to_live_hours: 24.0, grace_period_hours: 24.0 * 7.0 },
        );
        (sweep, store)
    }

    #[tokio::test]
    async fn marks_an_old_unpinned_row_expired() {
        let (sweep, store) = sweep();
        let case_uid = CaseUid::mint();
        let row = evidence(&case_uid, ts(48.0), None, false);
        let uid = row.uid.clone();
        store.put_evidence(&row).await.expect("seed");
        let result = sweep.run(&case_uid, &BTreeSet::new(), Timestamp::new(time::OffsetDateTime::now_utc())).await.expect("sweep runs");
        assert_eq!(result.marked_expired, vec![uid]);
        assert!(result.hard_delete_candidates.is_empty());
    }

    #[tokio::test]
    async fn never_expires_a_pinned_row() {
        let (sweep, store) = sweep();
        let case_uid = CaseUid::mint();
        let row = evidence(&case_uid, ts(1000.0), None, true);
        store.put_evidence(&row).await.expect("seed");
        let result = sweep.run(&case_uid, &BTreeSet::new(), Timestamp::new(time::OffsetDateTime::now_utc())).await.expect("sweep runs");
        assert!(result.marked_expired.is_empty());
        assert!(result.hard_delete_candidates.is_empty());
    }

    #[tokio::test]
    async fn leaves_a_recent_row_alone() {
        let (sweep, store) = sweep();
        let case_uid = CaseUid::mint();
        let row = evidence(&case_uid, ts(1.0), None, false);
        store.put_evidence(&row).await.expect("seed");
        let result = sweep.run(&case_uid, &BTreeSet::new(), Timestamp::new(time::OffsetDateTime::now_utc())).await.expect("sweep runs");
        assert!(result.marked_expired.is_empty());
    }

    #[tokio::test]
    async fn surfaces_a_hard_delete_candidate_past_grace_period() {
        let (sweep, store) = sweep();
        let case_uid = CaseUid::mint();
        let row = evidence(&case_uid, ts(1000.0), Some(ts(200.0)), false);
        let uid = row.uid.clone();
        store.put_evidence(&row).await.expect("seed");
        let result = sweep.run(&case_uid, &BTreeSet::new(), Timestamp::new(time::OffsetDateTime::now_utc())).await.expect("sweep runs");
        assert_eq!(result.hard_delete_candidates, vec![uid]);
    }

    #[tokio::test]
    async fn referenced_evidence_is_never_a_hard_delete_candidate() {
        let (sweep, store) = sweep();
        let case_uid = CaseUid::mint();
        let row = evidence(&case_uid, ts(1000.0), Some(ts(200.0)), false);
        let uid = row.uid.clone();
        store.put_evidence(&row).await.expect("seed");
        let referenced = BTreeSet::from([uid]);
        let result = sweep.run(&case_uid, &referenced, Timestamp::new(time::OffsetDateTime::now_utc())).await.expect("sweep runs");
        assert!(result.hard_delete_candidates.is_empty());
    }
}
