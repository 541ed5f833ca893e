// aegi-core/src/model/investigation.rs
// ============================================================================
// Module: Investigation
// Description: Event-triggered, multi-round evidence collection run.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CaseUid;
use crate::ids::EvidenceUid;
use crate::ids::InvestigationUid;
use crate::time::Timestamp;

/// Lifecycle status of an investigation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestigationStatus {
    /// Currently collecting evidence.
    Active,
    /// Ran to completion within its round budget.
    Completed,
    /// Stopped early by an analyst or a stop condition.
    Aborted,
}

/// One round of an investigation: the questions pursued and evidence
/// collected in that round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestigationRound {
    /// Zero-based round number within the investigation.
    pub round_number: u32,
    /// Questions the round set out to answer.
    pub questions: Vec<String>,
    /// Evidence collected during the round.
    pub evidence_uids: Vec<EvidenceUid>,
    /// Time the round completed.
    pub completed_at: Timestamp,
}

/// Event-triggered, multi-round evidence collection run (§4.14).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    /// Globally unique identifier.
    pub uid: InvestigationUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Statement of what triggered this investigation.
    pub trigger: String,
    /// Rounds completed so far, in order.
    pub rounds: Vec<InvestigationRound>,
    /// Maximum number of rounds this investigation may run.
    pub max_rounds: u32,
    /// Current lifecycle status.
    pub status: InvestigationStatus,
    /// Creation time.
    pub created_at: Timestamp,
}
