// aegi-core/src/model/hypothesis.rs
// ============================================================================
// Module: Hypothesis
// Description: Labeled competing explanation participating in ACH.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AssertionUid;
use crate::ids::CaseUid;
use crate::ids::HypothesisUid;
use crate::time::Timestamp;

/// Labeled competing explanation participating in Analysis of Competing
/// Hypotheses (§4.8). Its `posterior` is maintained by the Bayesian update
/// engine and always co-normalized with its sibling hypotheses to sum to
/// 1.0 within tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypothesis {
    /// Globally unique identifier.
    pub uid: HypothesisUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Short analyst-facing label.
    pub label: String,
    /// Full statement of the hypothesis.
    pub statement: String,
    /// Prior probability assigned at creation.
    pub prior: f64,
    /// Current posterior probability, maintained by the update engine.
    pub posterior: f64,
    /// Assertions cited in support of this hypothesis.
    pub supporting_assertion_uids: Vec<AssertionUid>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the last posterior update.
    pub updated_at: Timestamp,
}
