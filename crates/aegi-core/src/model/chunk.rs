// aegi-core/src/model/chunk.rs
// ============================================================================
// Module: Chunk
// Description: Ordered, anchored, text-bearing slice of an artifact version.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::ArtifactVersionUid;
use crate::ids::CaseUid;
use crate::ids::ChunkUid;
use crate::time::Timestamp;

/// Selector used to re-locate a quote in its original artifact. Modeled on
/// the W3C Web Annotation `TextQuoteSelector` shape named in §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuoteSelector {
    /// The exact quoted text.
    pub exact: String,
    /// Text immediately preceding the quote, for disambiguation.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Text immediately following the quote, for disambiguation.
    #[serde(default)]
    pub suffix: Option<String>,
}

/// Health of an anchor: whether the selector can still be located in the
/// original artifact. Degrades over time as source pages change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorHealth {
    /// Selector resolves cleanly against the current artifact rendering.
    Healthy,
    /// Selector could not be re-located; the anchor has degraded.
    Degraded,
    /// Anchor health has not been checked since creation.
    Unchecked,
}

/// Ordered, text-bearing slice of an artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Globally unique identifier.
    pub uid: ChunkUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Owning artifact version.
    pub artifact_version_uid: ArtifactVersionUid,
    /// Zero-based ordinal position within the artifact.
    pub ordinal: u32,
    /// Chunk text content.
    pub text: String,
    /// Selectors used to re-locate this chunk's quotes in the artifact.
    pub anchors: Vec<TextQuoteSelector>,
    /// Current anchor health.
    pub anchor_health: AnchorHealth,
    /// Creation time.
    pub created_at: Timestamp,
}
