// aegi-core/src/model/report.rs
// ============================================================================
// Module: Report
// Description: Generated analyst-facing report, composed of grounded sections.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::grounding::GroundingLevel;
use crate::ids::AssertionUid;
use crate::ids::CaseUid;
use crate::ids::EvidenceUid;
use crate::ids::ReportUid;
use crate::time::Timestamp;

/// One section of a generated report: a claim plus the grounding level it
/// was clamped to and the evidence cited for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Section heading.
    pub heading: String,
    /// Section body text.
    pub body: String,
    /// Grounding level this section was clamped to before rendering.
    pub grounding_level: GroundingLevel,
    /// Assertions cited in this section.
    pub cited_assertion_uids: Vec<AssertionUid>,
    /// Evidence cited in this section.
    pub cited_evidence_uids: Vec<EvidenceUid>,
}

/// Generated analyst-facing report (§4.11).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Globally unique identifier.
    pub uid: ReportUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Report title.
    pub title: String,
    /// Ordered report sections.
    pub sections: Vec<ReportSection>,
    /// Creation time.
    pub created_at: Timestamp,
}
