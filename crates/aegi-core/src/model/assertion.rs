// aegi-core/src/model/assertion.rs
// ============================================================================
// Module: Assertion
// Description: Fused factual claim derived from one or more source claims,
//              carrying its Dempster-Shafer belief state.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AssertionUid;
use crate::ids::CaseUid;
use crate::ids::SourceClaimUid;
use crate::time::Timestamp;

/// Kind of conflict detected between source claims fused into one assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Two source claims directly contradict each other (one asserts, one denies).
    Contradiction,
    /// Source claims diverge on a numeric or categorical detail.
    Discrepancy,
    /// Combination produced high Dempster-Shafer conflict mass (§4.4).
    HighDsConflict,
}

/// Record of a detected conflict between the source claims underlying an
/// assertion. Retained for analyst review rather than silently resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Kind of conflict.
    pub kind: ConflictKind,
    /// Source claims implicated in the conflict.
    pub source_claim_uids: Vec<SourceClaimUid>,
    /// Human-readable description of the conflict.
    pub description: String,
}

/// Dempster-Shafer belief state of an assertion: combined mass assigned to
/// true, false, and uncertain, plus the derived confidence measures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssertionValue {
    /// Combined belief (lower probability bound) that the assertion is true.
    pub belief: f64,
    /// Combined plausibility (upper probability bound) that the assertion is true.
    pub plausibility: f64,
    /// Residual uncertainty mass not assigned to true or false.
    pub uncertainty: f64,
    /// Aggregate Dempster-Shafer conflict mass accumulated across combinations.
    pub conflict_degree: f64,
    /// Number of source claims combined into this value.
    pub source_count: u32,
    /// Whether a conflicting source claim was detected during fusion.
    pub has_conflict: bool,
}

/// Fused factual claim derived from one or more source claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Globally unique identifier.
    pub uid: AssertionUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Canonical text of the fused claim.
    pub text: String,
    /// Source claims fused into this assertion. Must be non-empty.
    pub source_claim_uids: Vec<SourceClaimUid>,
    /// Current Dempster-Shafer belief state.
    pub value: AssertionValue,
    /// Conflicts detected while fusing this assertion's source claims.
    pub conflicts: Vec<ConflictRecord>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the last fusion update.
    pub updated_at: Timestamp,
}
