// aegi-core/src/interfaces/mod.rs
// ============================================================================
// Module: AEGI Interfaces
// Description: Backend-agnostic interfaces for storage, the graph, vector
//              search, notification delivery, LLM invocation, and audit.
// Purpose: Define the contract surfaces the analysis crate and orchestrator
//          build against, independent of any concrete backend.
// Dependencies: crate::{ids, model, time}
// ============================================================================

//! ## Overview
//! Interfaces define how the AEGI core integrates with external systems
//! without embedding backend-specific details. Implementations must be
//! deterministic given their inputs and must fail closed rather than
//! silently drop data. Concrete adapters (SQLite, an LLM HTTP client) live
//! in their own crates; `runtime` in this crate provides in-memory
//! implementations suitable for tests and the CLI demo.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::ids::AssertionUid;
use crate::ids::BusEventUid;
use crate::ids::CaseUid;
use crate::ids::ChunkUid;
use crate::ids::EntityIdentityActionUid;
use crate::ids::EntityUid;
use crate::ids::EvidenceUid;
use crate::model::Assertion;
use crate::model::Chunk;
use crate::model::Entity;
use crate::model::EntityIdentityAction;
use crate::model::Evidence;
use crate::model::Hypothesis;
use crate::model::RelationFact;
use crate::model::SourceClaim;
use crate::model::Subscription;

// ============================================================================
// SECTION: Evidence Store
// ============================================================================

/// Evidence store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend I/O error.
    #[error("store io error: {0}")]
    Io(String),
    /// Requested record does not exist.
    #[error("store record not found: {0}")]
    NotFound(String),
    /// Record failed a validation or invariant check before persistence.
    #[error("store invalid data: {0}")]
    Invalid(String),
    /// Backend reported a conflict (e.g. duplicate UID).
    #[error("store conflict: {0}")]
    Conflict(String),
}

/// Persistence for chunks, source claims, evidence, assertions, and
/// hypotheses: the claim-to-belief spine of a case (§3, §4.3-§4.4, §4.8).
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// Persists a chunk, replacing any existing row with the same UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_chunk(&self, chunk: &Chunk) -> Result<(), StoreError>;

    /// Loads a chunk by UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_chunk(&self, uid: &ChunkUid) -> Result<Option<Chunk>, StoreError>;

    /// Persists a source claim.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_source_claim(&self, claim: &SourceClaim) -> Result<(), StoreError>;

    /// Lists source claims belonging to a chunk, in extraction order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_source_claims_by_chunk(
        &self,
        chunk_uid: &ChunkUid,
    ) -> Result<Vec<SourceClaim>, StoreError>;

    /// Persists an evidence row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_evidence(&self, evidence: &Evidence) -> Result<(), StoreError>;

    /// Loads an evidence row by UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_evidence(&self, uid: &EvidenceUid) -> Result<Option<Evidence>, StoreError>;

    /// Lists all evidence in a case, for retention sweeps and quality scoring.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_evidence_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Evidence>, StoreError>;

    /// Persists an assertion, replacing any existing row with the same UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_assertion(&self, assertion: &Assertion) -> Result<(), StoreError>;

    /// Loads an assertion by UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_assertion(&self, uid: &AssertionUid) -> Result<Option<Assertion>, StoreError>;

    /// Lists all assertions in a case.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_assertions_by_case(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<Assertion>, StoreError>;

    /// Persists a hypothesis, replacing any existing row with the same UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_hypothesis(&self, hypothesis: &Hypothesis) -> Result<(), StoreError>;

    /// Lists all hypotheses in a case, the co-normalization scope for ACH.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_hypotheses_by_case(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<Hypothesis>, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    async fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Graph Store
// ============================================================================

/// Persistence for the knowledge graph projection: entities, relation facts,
/// and pending identity resolution actions (§4.6-§4.7).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Persists an entity, replacing any existing row with the same UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_entity(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Loads an entity by UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_entity(&self, uid: &EntityUid) -> Result<Option<Entity>, StoreError>;

    /// Lists all entities in a case.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_entities_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Entity>, StoreError>;

    /// Persists a relation fact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_relation_fact(&self, relation: &RelationFact) -> Result<(), StoreError>;

    /// Lists relation facts incident to an entity, in either direction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_relations_by_entity(
        &self,
        entity_uid: &EntityUid,
    ) -> Result<Vec<RelationFact>, StoreError>;

    /// Persists a pending, approved, or rejected identity action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    async fn put_identity_action(
        &self,
        action: &EntityIdentityAction,
    ) -> Result<(), StoreError>;

    /// Lists identity actions still awaiting analyst review in a case.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn list_pending_identity_actions(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<EntityIdentityAction>, StoreError>;

    /// Loads an identity action by UID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    async fn get_identity_action(
        &self,
        uid: &EntityIdentityActionUid,
    ) -> Result<Option<EntityIdentityAction>, StoreError>;
}

// ============================================================================
// SECTION: Vector Store
// ============================================================================

/// One nearest-neighbor match returned by a vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    /// Identifier of the matched item (a source claim or chunk UID string).
    pub item_id: String,
    /// Cosine similarity in `[-1, 1]`.
    pub score: f64,
}

/// Vector store errors.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Backend I/O error.
    #[error("vector store io error: {0}")]
    Io(String),
    /// Embedding dimension did not match the store's configured dimension.
    #[error("vector store dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the store is configured for.
        expected: usize,
        /// Dimension of the vector actually supplied.
        actual: usize,
    },
}

/// Embedding-backed nearest-neighbor search used by narrative clustering and
/// semantic subscription matching (§4.5, §4.13).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upserts an item's embedding.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError`] when the write fails or the dimension
    /// does not match.
    async fn upsert(&self, item_id: &str, embedding: &[f32]) -> Result<(), VectorStoreError>;

    /// Finds the `limit` nearest neighbors of `embedding`.
    ///
    /// # Errors
    ///
    /// Returns [`VectorStoreError`] when the search fails or the dimension
    /// does not match.
    async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorMatch>, VectorStoreError>;
}

// ============================================================================
// SECTION: Notify Capability
// ============================================================================

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Delivery transport error.
    #[error("notify transport error: {0}")]
    Transport(String),
    /// Subscriber rejected or could not be reached.
    #[error("notify subscriber unreachable: {0}")]
    Unreachable(String),
}

/// Outbound push notification delivery capability (§4.13).
#[async_trait]
pub trait NotifyCapability: Send + Sync {
    /// Delivers one bus event to one subscriber.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when delivery fails.
    async fn deliver(
        &self,
        subscription: &Subscription,
        event_uid: &BusEventUid,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError>;
}

// ============================================================================
// SECTION: LLM Client
// ============================================================================

/// Deadline and token ceiling an LLM invocation must honor. Components pass
/// this through from the orchestrator's stage budget rather than each
/// owning their own timeout policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetContext {
    /// Maximum wall-clock time the call may take.
    pub deadline: Duration,
    /// Maximum output tokens the call may request.
    pub max_output_tokens: u32,
}

/// Reason an LLM invocation returned a degraded output instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradedReason {
    /// The call did not complete within its [`BudgetContext`] deadline.
    DeadlineExceeded,
    /// The underlying provider returned a transient error after retries.
    ProviderUnavailable,
    /// The model's response could not be parsed into the expected shape.
    UnparsableResponse,
}

/// A usable-but-degraded result returned in place of an error, so that
/// callers (the causal reasoner, chat renderer, report generator) can
/// downgrade a grounding level and continue rather than aborting the stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegradedOutput {
    /// Best-effort text produced before degradation, if any.
    pub partial_text: Option<String>,
    /// Why the output is degraded.
    pub reason: DegradedReason,
}

/// Request to invoke an LLM capability. The budget is passed alongside as a
/// separate argument to [`LlmClient::invoke`] rather than embedded here, so
/// this type stays plainly serializable for audit logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmInvocationRequest {
    /// System/instruction prompt.
    pub system_prompt: String,
    /// User-facing prompt content.
    pub user_prompt: String,
}

/// LLM invocation errors. A degraded result is returned as
/// [`DegradedOutput`] data, not as an error variant here; these variants are
/// reserved for conditions a caller cannot recover from by downgrading.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request was rejected before any provider call was attempted.
    #[error("llm request invalid: {0}")]
    InvalidRequest(String),
    /// Provider call failed and no degraded output could be constructed.
    #[error("llm provider error: {0}")]
    Provider(String),
}

/// Backend-agnostic LLM invocation capability used by the claim extractor,
/// causal reasoner, and report/chat renderers. Every method honors the
/// supplied [`BudgetContext`] and reports a [`DegradedOutput`] rather than
/// failing outright when the budget or provider cannot deliver a result.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invokes the model with a free-text prompt, returning either full text
    /// or a [`DegradedOutput`].
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the request itself is invalid or the
    /// provider fails in a way no degraded output can represent.
    async fn invoke(
        &self,
        request: &LlmInvocationRequest,
        budget: BudgetContext,
    ) -> Result<Result<String, DegradedOutput>, LlmError>;

    /// Invokes the model and parses its response against `schema`, a JSON
    /// Schema document describing the expected shape.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the request itself is invalid or the
    /// provider fails in a way no degraded output can represent.
    async fn invoke_structured(
        &self,
        request: &LlmInvocationRequest,
        schema: &serde_json::Value,
        budget: BudgetContext,
    ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError>;

    /// Embeds `text` into a fixed-dimension vector for use with a
    /// [`VectorStore`].
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the request itself is invalid or the
    /// provider fails in a way no degraded output can represent.
    async fn embed(
        &self,
        text: &str,
        budget: BudgetContext,
    ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError>;
}

// ============================================================================
// SECTION: Audit Sink
// ============================================================================

/// Sink for structured audit records, the teacher's substitute for a text
/// logging framework (§10.2). Implementations must not panic; a failed
/// write is swallowed by the caller's discretion, never propagated as a
/// control-flow error from the operation being audited.
pub trait AuditSink: Send + Sync {
    /// Records a mutating operation against case state.
    fn record_action(&self, action: &crate::model::Action);

    /// Records the outcome of a single external capability call.
    fn record_tool_trace(&self, trace: &crate::model::ToolTrace);
}
