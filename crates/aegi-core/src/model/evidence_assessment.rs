// aegi-core/src/model/evidence_assessment.rs
// ============================================================================
// Module: Evidence Assessment
// Description: Per-(hypothesis, evidence) relation row and the append-only
//              prior-to-posterior transition log it produces.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AssertionUid;
use crate::ids::EvidenceAssessmentUid;
use crate::ids::HypothesisUid;
use crate::ids::ProbabilityUpdateUid;
use crate::time::Timestamp;

/// Analyst or engine judgment of how one piece of evidence bears on one
/// hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceRelation {
    /// Evidence is consistent with and raises confidence in the hypothesis.
    Support,
    /// Evidence is inconsistent with and lowers confidence in the hypothesis.
    Contradict,
    /// Evidence has no diagnostic bearing on the hypothesis.
    Irrelevant,
}

/// A single (hypothesis, evidence) assessment: the relation plus the
/// implied likelihood `P(E|H)` used by the Bayesian update engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceAssessment {
    /// Globally unique identifier.
    pub uid: EvidenceAssessmentUid,
    /// Hypothesis this assessment bears on.
    pub hypothesis_uid: HypothesisUid,
    /// Assertion supplying the evidentiary content.
    pub assertion_uid: AssertionUid,
    /// Analyst or engine judgment of the relation.
    pub relation: EvidenceRelation,
    /// Implied likelihood `P(E|H)`, symmetric around 0.5 for support versus
    /// contradict (§4.8).
    pub likelihood: f64,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Append-only log entry recording one hypothesis's prior-to-posterior
/// transition as a consequence of a single evidence assessment batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityUpdate {
    /// Globally unique identifier.
    pub uid: ProbabilityUpdateUid,
    /// Hypothesis whose probability changed.
    pub hypothesis_uid: HypothesisUid,
    /// Probability before the update.
    pub prior: f64,
    /// Probability after the update and co-normalization.
    pub posterior: f64,
    /// Evidence assessments that drove this update.
    pub evidence_assessment_uids: Vec<EvidenceAssessmentUid>,
    /// Time the update was applied.
    pub created_at: Timestamp,
}
