// aegi-core/src/model/ontology.rs
// ============================================================================
// Module: Ontology Data Types
// Description: Base data types for the versioned ontology. Registry and
//              compatibility-diff logic live in the ontology crate; this
//              module only defines the shapes they operate on.
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::ids::OntologyVersionUid;
use crate::time::Timestamp;

/// Kind of ontology type definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// Defines a graph entity type.
    Entity,
    /// Defines a graph relation type.
    Relation,
    /// Defines a graph event type.
    Event,
}

/// Cardinality constraint on a relation type's endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardinalityKind {
    /// At most one edge of this type per subject.
    OneToOne,
    /// One subject may relate to many objects.
    OneToMany,
    /// Many subjects may relate to many objects.
    ManyToMany,
}

/// One named type definition within an ontology version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type name, unique within its ontology version and kind.
    pub name: String,
    /// Kind of type being defined.
    pub kind: TypeKind,
    /// Cardinality constraint, present only for relation types.
    pub cardinality: Option<CardinalityKind>,
    /// Allowed attribute names and their declared value types.
    pub attributes: BTreeMap<String, String>,
    /// Names of types this one deprecates, if any.
    pub deprecates: Vec<String>,
}

/// Immutable named snapshot of the full ontology at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyVersion {
    /// Globally unique identifier.
    pub uid: OntologyVersionUid,
    /// Monotonically increasing version number.
    pub version: u32,
    /// All type definitions active in this version.
    pub types: Vec<TypeDefinition>,
    /// Creation time.
    pub created_at: Timestamp,
}
