// aegi-core/src/model/relation_fact.rs
// ============================================================================
// Module: Relation Fact
// Description: Typed edge between two graph entities.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AssertionUid;
use crate::ids::CaseUid;
use crate::ids::EntityUid;
use crate::ids::RelationFactUid;
use crate::time::Timestamp;

/// Typed, directed edge between two graph entities, grounded in the
/// assertion(s) that support it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationFact {
    /// Globally unique identifier.
    pub uid: RelationFactUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Relation type name, drawn from the active ontology version.
    pub relation_type: String,
    /// Source entity of the edge.
    pub subject_entity_uid: EntityUid,
    /// Target entity of the edge.
    pub object_entity_uid: EntityUid,
    /// Assertions grounding this edge. Must be non-empty.
    pub assertion_uids: Vec<AssertionUid>,
    /// Creation time.
    pub created_at: Timestamp,
}
