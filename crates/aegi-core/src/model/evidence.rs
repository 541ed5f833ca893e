// aegi-core/src/model/evidence.rs
// ============================================================================
// Module: Evidence
// Description: Citable unit pairing a chunk with a case, plus retention state.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CaseUid;
use crate::ids::ChunkUid;
use crate::ids::EvidenceUid;
use crate::time::Timestamp;

/// Provenance kind of an evidence row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// Ingested from an analyst-supplied document.
    Document,
    /// Ingested from the GDELT monitor.
    GdeltEvent,
    /// Produced by an analyst's manual annotation.
    Manual,
}

/// Retention bookkeeping carried alongside each evidence row (§4.15).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionMetadata {
    /// Time after which this evidence is eligible for retention sweep.
    pub expires_at: Option<Timestamp>,
    /// Whether an analyst has pinned this evidence, exempting it from sweep.
    pub pinned: bool,
}

/// Citable unit pairing a chunk with a case. The unit of citation referenced
/// by assertions, hypotheses, and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Globally unique identifier.
    pub uid: EvidenceUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Owning chunk.
    pub chunk_uid: ChunkUid,
    /// Provenance kind.
    pub kind: EvidenceKind,
    /// Retention bookkeeping.
    pub retention: RetentionMetadata,
    /// Creation time.
    pub created_at: Timestamp,
}
