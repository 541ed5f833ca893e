// aegi-core/src/lib.rs
// ============================================================================
// Module: AEGI Core Library
// Description: Public API surface for the AEGI analysis orchestration core.
// Purpose: Expose contracts, grounding gate, data model, and backend interfaces.
// Dependencies: crate::{ids, time, hashing, grounding, model, interfaces, runtime}
// ============================================================================

//! ## Overview
//! AEGI core provides the value types, identifiers, grounding gate, and
//! backend-agnostic interfaces shared by every analysis component: the
//! claim extractor, the Dempster-Shafer fuser, the Bayesian ACH engine,
//! the event bus, and the pipeline orchestrator all build on top of the
//! types defined here rather than reaching into a concrete store or LLM
//! client. Concrete backends (SQLite, an LLM HTTP client, a vector store)
//! live in their own crates and implement the traits in [`interfaces`].

pub mod grounding;
pub mod hashing;
pub mod ids;
pub mod interfaces;
pub mod model;
pub mod runtime;
pub mod time;

pub use grounding::GroundingLevel;
pub use grounding::grounding_gate;
pub use hashing::HashDigest;
pub use hashing::mint_uid;
pub use time::Timestamp;

pub use model::*;

pub use interfaces::AuditSink;
pub use interfaces::BudgetContext;
pub use interfaces::DegradedOutput;
pub use interfaces::DegradedReason;
pub use interfaces::EvidenceStore;
pub use interfaces::GraphStore;
pub use interfaces::LlmClient;
pub use interfaces::LlmError;
pub use interfaces::LlmInvocationRequest;
pub use interfaces::NotifyCapability;
pub use interfaces::NotifyError;
pub use interfaces::StoreError;
pub use interfaces::VectorStore;

pub use runtime::InMemoryEvidenceStore;
pub use runtime::InMemoryGraphStore;
pub use runtime::InMemoryVectorStore;
pub use runtime::NoopAuditSink;
pub use runtime::StderrAuditSink;
