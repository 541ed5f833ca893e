// aegi-core/src/model/bus_event.rs
// ============================================================================
// Module: Bus Event
// Description: Event envelope published on the in-process event bus.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::BusEventUid;
use crate::ids::CaseUid;
use crate::time::Timestamp;

/// Severity of an event, used by push-engine rate limiting and rule matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventSeverity {
    /// Routine state change, no analyst attention implied.
    Info,
    /// Noteworthy change an analyst may want to see.
    Notable,
    /// Change requiring prompt analyst attention.
    Critical,
}

/// Envelope published on the in-process event bus (§4.13). `topic` is
/// matched against subscriber topic filters including the wildcard `"*"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AegiEvent {
    /// Globally unique identifier for this event instance.
    pub uid: BusEventUid,
    /// Dotted topic name, e.g. `hypothesis.posterior_updated`.
    pub topic: String,
    /// Case scope, when the event is case-scoped.
    pub case_uid: Option<CaseUid>,
    /// Severity of the event.
    pub severity: EventSeverity,
    /// Free-form JSON payload specific to the topic.
    pub payload: serde_json::Value,
    /// Dedup key the push engine's `EventLog` keys on. Distinct from `uid`
    /// so an emitter that can compose its own stable key (e.g. the claim
    /// extractor's `claim:<case>:<chunk>:<unix_ts>`) collapses logically
    /// duplicate events even though each carries a freshly minted `uid`.
    pub source_event_uid: BusEventUid,
    /// Time the event was emitted.
    pub created_at: Timestamp,
}

impl AegiEvent {
    /// Builds an event whose dedup key defaults to its own `uid` (§4.13:
    /// `source_event_uid` is auto-generated when the emitter has no
    /// naturally composed dedup key of its own).
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        case_uid: Option<CaseUid>,
        severity: EventSeverity,
        payload: serde_json::Value,
        created_at: Timestamp,
    ) -> Self {
        let uid = BusEventUid::mint();
        Self {
            uid: uid.clone(),
            topic: topic.into(),
            case_uid,
            severity,
            payload,
            source_event_uid: uid,
            created_at,
        }
    }

    /// Overrides the dedup key with an explicitly composed one.
    #[must_use]
    pub fn with_source_event_uid(mut self, source_event_uid: BusEventUid) -> Self {
        self.source_event_uid = source_event_uid;
        self
    }
}
