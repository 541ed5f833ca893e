// aegi-core/src/model/source_claim.rs
// ============================================================================
// Module: Source Claim
// Description: Verbatim, anchored quotation extracted from a chunk.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CaseUid;
use crate::ids::ChunkUid;
use crate::ids::SourceClaimUid;
use crate::time::Timestamp;

/// Modality under which a claim was made. Drives downstream confidence and
/// the DS fusion mass functions (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Stated as established fact by the source.
    Asserted,
    /// Reported as someone else's claim, not independently verified.
    Reported,
    /// Explicitly hedged (e.g. "allegedly", "may have").
    Speculative,
    /// Explicitly denied or contradicted by the source itself.
    Denied,
}

/// A verbatim, anchored quotation extracted from a chunk. Always carries at
/// least one anchor; a source claim with zero anchors is a contradiction of
/// its own invariant and must not be constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceClaim {
    /// Globally unique identifier.
    pub uid: SourceClaimUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Owning chunk.
    pub chunk_uid: ChunkUid,
    /// Verbatim quoted text.
    pub text: String,
    /// Modality under which the claim was made.
    pub modality: Modality,
    /// Creation time.
    pub created_at: Timestamp,
}
