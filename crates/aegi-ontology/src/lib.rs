// aegi-ontology/src/lib.rs
// ============================================================================
// Module: AEGI Ontology
// Description: Versioned ontology registry, compatibility diff, and
//              graph-write validation.
// Purpose: Expose the §4.2 ontology registry to the analysis and
//          orchestrator crates without coupling them to its internals.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! The ontology registry holds every registered [`aegi_core::model::OntologyVersion`]
//! the case's knowledge-graph pipeline has been configured with. Callers
//! compare two versions with [`compatibility_diff`] before switching a case
//! over, and validate entity/relation payloads with [`validate_entity`] and
//! [`validate_relation`] before writing to the graph store.

pub mod diff;
pub mod registry;
pub mod validation;

pub use diff::CompatibilityDiff;
pub use diff::CompatibilityLevel;
pub use diff::TypeChange;
pub use diff::compatibility_diff;
pub use registry::OntologyRegistry;
pub use registry::RegistryError;
pub use validation::EntityPayload;
pub use validation::ProblemDetail;
pub use validation::RelationPayload;
pub use validation::validate_entity;
pub use validation::validate_relation;
