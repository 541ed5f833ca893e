// aegi-core/src/model/audit.rs
// ============================================================================
// Module: Audit
// Description: Audit row types for mutating operations and external
//              capability calls, recorded through an AuditSink rather than
//              a text logging framework.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::ActionUid;
use crate::ids::CaseUid;
use crate::ids::ToolTraceUid;
use crate::time::Timestamp;

/// Audit row for a single mutating operation against case state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Globally unique identifier.
    pub uid: ActionUid,
    /// Case scope, when the action is case-scoped.
    pub case_uid: Option<CaseUid>,
    /// Dotted name of the operation, e.g. `hypothesis.update_posterior`.
    pub operation: String,
    /// Identifier of the actor (analyst, investigation agent, scheduler).
    pub actor: String,
    /// Free-form JSON detail of the operation's arguments or effect.
    pub detail: serde_json::Value,
    /// Time the action was recorded.
    pub created_at: Timestamp,
}

/// Outcome of a single external capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolTraceStatus {
    /// Call completed normally.
    Ok,
    /// Call returned a degraded output rather than failing outright.
    Degraded,
    /// Call failed.
    Failed,
}

/// Audit row for a single external capability call (LLM invocation, GDELT
/// fetch, notification delivery).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolTrace {
    /// Globally unique identifier.
    pub uid: ToolTraceUid,
    /// Name of the capability invoked.
    pub capability: String,
    /// Outcome of the call.
    pub status: ToolTraceStatus,
    /// Wall-clock duration of the call, in milliseconds.
    pub duration_ms: u64,
    /// Free-form JSON detail, e.g. degraded reason or truncated error text.
    pub detail: serde_json::Value,
    /// Time the call was recorded.
    pub created_at: Timestamp,
}
