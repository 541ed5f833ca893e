// aegi-core/src/model/artifact.rs
// ============================================================================
// Module: Artifact Identity and Version
// Description: Canonical source URL vs. one stored rendering of it.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::ArtifactIdentityUid;
use crate::ids::ArtifactVersionUid;
use crate::ids::CaseUid;
use crate::time::Timestamp;

/// Kind of artifact payload stored in a runpack-like sink. Reused by
/// [`crate::interfaces::NotifyCapability`] delivery receipts and the
/// orchestrator's report attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Raw document bytes as ingested.
    RawDocument,
    /// A rendered report artifact.
    Report,
    /// A generic attachment (e.g. GDELT CSV export).
    Attachment,
}

/// Canonical identity of a source document, independent of how many times
/// it has been fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactIdentity {
    /// Globally unique identifier.
    pub uid: ArtifactIdentityUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Canonical URL of the source.
    pub canonical_url: String,
    /// First-seen time.
    pub created_at: Timestamp,
}

/// One stored rendering of an [`ArtifactIdentity`]. Versions are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    /// Globally unique identifier.
    pub uid: ArtifactVersionUid,
    /// Owning artifact identity.
    pub artifact_identity_uid: ArtifactIdentityUid,
    /// Opaque pointer into the storage layer (§6 storage layout).
    pub storage_ref: String,
    /// MIME content type of the stored rendering.
    pub content_type: String,
    /// Time this rendering was captured.
    pub created_at: Timestamp,
}
