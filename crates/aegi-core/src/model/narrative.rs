// aegi-core/src/model/narrative.rs
// ============================================================================
// Module: Narrative
// Description: Cluster of source claims sharing a theme and time span.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CaseUid;
use crate::ids::NarrativeUid;
use crate::ids::SourceClaimUid;
use crate::time::Timestamp;

/// Cluster of source claims sharing a theme and time span, produced by the
/// narrative builder (§4.5). `coordination_score` is populated by the
/// coordination detector and left `None` until that pass runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    /// Globally unique identifier.
    pub uid: NarrativeUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Short analyst-facing label for the theme.
    pub label: String,
    /// Source claims clustered into this narrative, in cluster order.
    pub source_claim_uids: Vec<SourceClaimUid>,
    /// Start of the clustering time window.
    pub window_start: Timestamp,
    /// End of the clustering time window.
    pub window_end: Timestamp,
    /// Coordination-detector score in `[0, 1]`, `None` until computed.
    pub coordination_score: Option<f64>,
    /// Rationale strings explaining a low coordination score, kept for
    /// analyst review even when the score itself is unremarkable.
    pub coordination_rationale: Vec<String>,
    /// Creation time.
    pub created_at: Timestamp,
}
