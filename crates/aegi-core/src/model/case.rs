// aegi-core/src/model/case.rs
// ============================================================================
// Module: Case
// Description: Top-level analytical workspace owning every scoped entity.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CaseUid;
use crate::time::Timestamp;

/// Top-level analytical workspace. Every other scoped entity carries a
/// `case_uid` back to its owning case. Created externally (outside this
/// crate's scope); soft-immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    /// Globally unique case identifier.
    pub uid: CaseUid,
    /// Human-facing case title.
    pub title: String,
    /// Free-text case summary.
    pub summary: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last mutation time.
    pub updated_at: Timestamp,
}
