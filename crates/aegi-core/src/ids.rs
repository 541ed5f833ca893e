// aegi-core/src/ids.rs
// ============================================================================
// Module: AEGI Identifiers
// Description: Canonical opaque identifiers for every persisted AEGI entity.
// Purpose: Provide strongly typed, serializable, globally unique text UIDs.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Every persisted entity in §3 of the specification carries a globally
//! unique text UID of the form `<prefix>_<hex>`. UIDs are minted once and
//! never reused. This module defines one newtype per entity kind so that,
//! for example, a [`CaseUid`] can never be passed where an [`EvidenceUid`]
//! is expected, and generates the boilerplate (`Display`, `From<String>`,
//! serde transparency) with a single macro, the way the identifiers in this
//! lineage are hand-written one at a time but follow one shape exactly.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

macro_rules! uid_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used when minting a new identifier of this kind.
            pub const PREFIX: &'static str = $prefix;

            /// Wraps an existing identifier string without validation.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Mints a fresh, random identifier with this kind's prefix.
            #[must_use]
            pub fn mint() -> Self {
                Self(crate::hashing::mint_uid(Self::PREFIX))
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

uid_type!(
    /// Top-level analytical workspace identifier.
    CaseUid,
    "case"
);
uid_type!(
    /// Canonical-source identity identifier.
    ArtifactIdentityUid,
    "artid"
);
uid_type!(
    /// Stored-rendering (version) of an artifact identity.
    ArtifactVersionUid,
    "artv"
);
uid_type!(
    /// Ordered text-bearing slice of an artifact version.
    ChunkUid,
    "chunk"
);
uid_type!(
    /// Verbatim, anchored quotation extracted from a chunk.
    SourceClaimUid,
    "claim"
);
uid_type!(
    /// Citable unit pairing a chunk with a case.
    EvidenceUid,
    "evid"
);
uid_type!(
    /// Fused factual claim derived from one or more source claims.
    AssertionUid,
    "assert"
);
uid_type!(
    /// Labeled competing explanation participating in ACH.
    HypothesisUid,
    "hyp"
);
uid_type!(
    /// Per-(hypothesis, evidence) relation/strength row.
    EvidenceAssessmentUid,
    "assess"
);
uid_type!(
    /// Append-only prior-to-posterior transition log entry.
    ProbabilityUpdateUid,
    "pupd"
);
uid_type!(
    /// Cluster of source claims sharing a theme and time span.
    NarrativeUid,
    "nar"
);
uid_type!(
    /// Typed edge between two graph entities.
    RelationFactUid,
    "rel"
);
uid_type!(
    /// Graph-projected entity identifier.
    EntityUid,
    "ent"
);
uid_type!(
    /// Graph-projected event identifier.
    EventUid,
    "gevt"
);
uid_type!(
    /// Pending/approved/rejected entity merge or split proposal.
    EntityIdentityActionUid,
    "eia"
);
uid_type!(
    /// Immutable named ontology snapshot.
    OntologyVersionUid,
    "ont"
);
uid_type!(
    /// Audit row for a mutating operation.
    ActionUid,
    "act"
);
uid_type!(
    /// Audit row for a single external capability call.
    ToolTraceUid,
    "trc"
);
uid_type!(
    /// Push-notification subscription identifier.
    SubscriptionUid,
    "sub"
);
uid_type!(
    /// Dedup row keyed by the source event UID.
    EventLogUid,
    "evl"
);
uid_type!(
    /// One delivery attempt of an event to a subscriber.
    PushLogUid,
    "pshl"
);
uid_type!(
    /// Recorded analysis scenario used for recall and outcome tracking.
    AnalysisMemoryUid,
    "mem"
);
uid_type!(
    /// Event-triggered, multi-round evidence collection run.
    InvestigationUid,
    "inv"
);
uid_type!(
    /// Generated analyst-facing report identifier.
    ReportUid,
    "rpt"
);
uid_type!(
    /// Bus event instance identifier (distinct from its dedup key).
    BusEventUid,
    "bev"
);
uid_type!(
    /// GDELT monitor event identifier.
    GdeltEventUid,
    "gdel"
);
uid_type!(
    /// Opaque tenant/user identifier for subscriptions and chat sessions.
    UserId,
    "user"
);
uid_type!(
    /// Correlation identifier threading a request through traces.
    TraceId,
    "trace"
);
uid_type!(
    /// Per-hypothesis scenario forecast identifier.
    ForecastUid,
    "fcst"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_uses_kind_prefix() {
        let uid = CaseUid::mint();
        assert!(uid.as_str().starts_with("case_"));
    }

    #[test]
    fn distinct_mints_are_unique() {
        assert_ne!(EvidenceUid::mint(), EvidenceUid::mint());
    }

    #[test]
    fn display_matches_as_str() {
        let uid = HypothesisUid::new("hyp_deadbeef");
        assert_eq!(format!("{uid}"), "hyp_deadbeef");
    }

    #[test]
    fn serde_roundtrip_is_transparent() {
        let uid = AssertionUid::new("assert_abc123");
        let json = serde_json::to_string(&uid).expect("serialize");
        assert_eq!(json, "\"assert_abc123\"");
        let back: AssertionUid = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, uid);
    }
}
