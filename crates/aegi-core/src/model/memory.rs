// aegi-core/src/model/memory.rs
// ============================================================================
// Module: Analysis Memory
// Description: Recorded analysis scenario used for recall and outcome
//              tracking by the quality/bias/blindspot pass (§4.10).
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AnalysisMemoryUid;
use crate::ids::CaseUid;
use crate::ids::HypothesisUid;
use crate::time::Timestamp;

/// A recorded analysis scenario: the hypothesis set considered, which one
/// was ultimately favored, and (once known) how that call turned out.
/// `historical_accuracy` is `None` until an outcome has been recorded,
/// distinct from a recorded outcome of zero accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMemoryRecord {
    /// Globally unique identifier.
    pub uid: AnalysisMemoryUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Short description of the analytical scenario.
    pub scenario: String,
    /// LLM-produced conclusion reached for this scenario.
    pub conclusion: String,
    /// Pattern tags this scenario is filed under, for per-tag recall stats.
    pub pattern_tags: Vec<String>,
    /// Hypotheses considered in this scenario.
    pub hypothesis_uids: Vec<HypothesisUid>,
    /// Hypothesis favored at the time, if any.
    pub favored_hypothesis_uid: Option<HypothesisUid>,
    /// Recorded outcome accuracy once known, `None` until an outcome lands.
    pub historical_accuracy: Option<f64>,
    /// Lessons learned once the outcome is known, `None` until then.
    pub lessons_learned: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
}
