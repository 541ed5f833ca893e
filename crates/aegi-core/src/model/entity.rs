// aegi-core/src/model/entity.rs
// ============================================================================
// Module: Entity and Graph Event
// Description: Graph-projected entities and events, plus the entity
//              identity resolution action queue (merge/split proposals).
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::CaseUid;
use crate::ids::EntityIdentityActionUid;
use crate::ids::EntityUid;
use crate::ids::EventUid;
use crate::time::Timestamp;

/// Graph-projected entity identifier and its resolved attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Globally unique identifier.
    pub uid: EntityUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Entity type name, drawn from the active ontology version.
    pub entity_type: String,
    /// Canonical display name after disambiguation.
    pub canonical_name: String,
    /// Alternate names observed across source claims, merged into this entity.
    pub aliases: Vec<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Time of the last identity resolution touching this entity.
    pub updated_at: Timestamp,
}

/// Graph-projected event: an occurrence entities participate in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEvent {
    /// Globally unique identifier.
    pub uid: EventUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Event type name, drawn from the active ontology version.
    pub event_type: String,
    /// Entities participating in the event.
    pub participant_entity_uids: Vec<EntityUid>,
    /// Time the event is assessed to have occurred.
    pub occurred_at: Option<Timestamp>,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Kind of entity identity resolution action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityIdentityActionType {
    /// Propose merging two entities believed to be the same real-world referent.
    Merge,
    /// Propose splitting one entity believed to conflate two referents.
    Split,
}

/// Lifecycle status of an entity identity action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityIdentityActionStatus {
    /// Proposed by the disambiguator, awaiting analyst review.
    Pending,
    /// Approved and applied to the graph.
    Approved,
    /// Reviewed and rejected.
    Rejected,
}

/// A pending, approved, or rejected entity merge or split proposal (§4.6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityIdentityAction {
    /// Globally unique identifier.
    pub uid: EntityIdentityActionUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Kind of action proposed.
    pub action_type: EntityIdentityActionType,
    /// Entities subject to the action.
    pub entity_uids: Vec<EntityUid>,
    /// Disambiguator's confidence in the proposal.
    pub confidence: f64,
    /// Current lifecycle status.
    pub status: EntityIdentityActionStatus,
    /// Creation time.
    pub created_at: Timestamp,
}
