// aegi-core/src/runtime/audit.rs
// ============================================================================
// Module: Audit Sinks
// Description: No-op and stderr implementations of AuditSink.
// Purpose: Provide sinks suitable for tests and local runs without pulling
//          in a logging framework.
// Dependencies: crate::{interfaces, model}
// ============================================================================

use std::io::Write as _;

use crate::interfaces::AuditSink;
use crate::model::Action;
use crate::model::ToolTrace;

/// Audit sink that discards every record. Used where audit has no
/// consumer wired up, such as unit tests.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record_action(&self, _action: &Action) {}

    fn record_tool_trace(&self, _trace: &ToolTrace) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record_action(&self, action: &Action) {
        if let Ok(payload) = serde_json::to_string(action) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }

    fn record_tool_trace(&self, trace: &ToolTrace) {
        if let Ok(payload) = serde_json::to_string(trace) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}
