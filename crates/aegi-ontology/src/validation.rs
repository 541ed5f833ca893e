// aegi-ontology/src/validation.rs
// ============================================================================
// Module: Ontology Validation
// Description: Validates entity/relation payloads against an ontology
//              version, producing None on success or a structured
//              ProblemDetail describing the first violation (§4.2).
// Purpose: Give the knowledge-graph pipeline a single gate for graph writes.
// Dependencies: aegi-core
// ============================================================================

use std::collections::BTreeMap;

use aegi_core::model::OntologyVersion;
use aegi_core::model::TypeKind;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Structured validation failure, mirroring the error envelope used across
/// the external interface (§7 error handling design).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetail {
    /// Stable machine-readable error code.
    pub error_code: String,
    /// Human-readable detail message.
    pub detail: String,
}

impl ProblemDetail {
    fn new(error_code: &str, detail: impl Into<String>) -> Self {
        Self {
            error_code: error_code.to_string(),
            detail: detail.into(),
        }
    }
}

/// A candidate entity payload awaiting graph-write validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityPayload {
    /// Entity type name.
    pub entity_type: String,
    /// Attribute values keyed by attribute name.
    pub attributes: BTreeMap<String, Value>,
}

/// A candidate relation payload awaiting graph-write validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationPayload {
    /// Relation type name.
    pub relation_type: String,
    /// Attribute values keyed by attribute name.
    pub attributes: BTreeMap<String, Value>,
    /// Entity type of the subject endpoint, when known.
    pub subject_entity_type: Option<String>,
    /// Entity type of the object endpoint, when known.
    pub object_entity_type: Option<String>,
}

/// Validates an entity payload against an ontology version.
///
/// Returns `None` on success, or a [`ProblemDetail`] for the first
/// violation found: an unknown entity type, or a required attribute (one
/// declared on the type) missing from the payload.
#[must_use]
pub fn validate_entity(ontology: &OntologyVersion, payload: &EntityPayload) -> Option<ProblemDetail> {
    let Some(type_def) = ontology
        .types
        .iter()
        .find(|t| t.kind == TypeKind::Entity && t.name == payload.entity_type)
    else {
        return Some(ProblemDetail::new(
            "ontology_entity_unknown_type",
            format!("entity type '{}' is not defined in this ontology version", payload.entity_type),
        ));
    };

    let missing: Vec<&str> = type_def
        .attributes
        .keys()
        .filter(|attr| !payload.attributes.contains_key(*attr))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Some(ProblemDetail::new(
            "ontology_entity_missing_properties",
            format!("entity type '{}' is missing properties: {}", payload.entity_type, missing.join(", ")),
        ));
    }

    None
}

/// Validates a relation payload against an ontology version, including a
/// domain/range check when both endpoint entity types are provided.
///
/// Returns `None` on success, or a [`ProblemDetail`] for the first
/// violation found.
#[must_use]
pub fn validate_relation(
    ontology: &OntologyVersion,
    payload: &RelationPayload,
) -> Option<ProblemDetail> {
    let Some(type_def) = ontology
        .types
        .iter()
        .find(|t| t.kind == TypeKind::Relation && t.name == payload.relation_type)
    else {
        return Some(ProblemDetail::new(
            "ontology_relation_unknown_type",
            format!("relation type '{}' is not defined in this ontology version", payload.relation_type),
        ));
    };

    let missing: Vec<&str> = type_def
        .attributes
        .keys()
        .filter(|attr| !payload.attributes.contains_key(*attr))
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Some(ProblemDetail::new(
            "ontology_relation_missing_properties",
            format!("relation type '{}' is missing properties: {}", payload.relation_type, missing.join(", ")),
        ));
    }

    if let (Some(subject_type), Some(object_type)) =
        (&payload.subject_entity_type, &payload.object_entity_type)
    {
        let subject_known = ontology
            .types
            .iter()
            .any(|t| t.kind == TypeKind::Entity && &t.name == subject_type);
        let object_known = ontology
            .types
            .iter()
            .any(|t| t.kind == TypeKind::Entity && &t.name == object_type);
        if !subject_known || !object_known {
            return Some(ProblemDetail::new(
                "ontology_relation_domain_violation",
                format!(
                    "relation '{}' endpoints reference unknown entity types ({subject_type}, {object_type})",
                    payload.relation_type
                ),
            ));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::Timestamp;
    use aegi_core::ids::OntologyVersionUid;
    use aegi_core::model::CardinalityKind;
    use aegi_core::model::TypeDefinition;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid unix time"))
    }

    fn ontology() -> OntologyVersion {
        let mut person_attrs = BTreeMap::new();
        person_attrs.insert("name".to_string(), "string".to_string());
        OntologyVersion {
            uid: OntologyVersionUid::mint(),
            version: 1,
            types: vec![
                TypeDefinition {
                    name: "Person".to_string(),
                    kind: TypeKind::Entity,
                    cardinality: None,
                    attributes: person_attrs,
                    deprecates: vec![],
                },
                TypeDefinition {
                    name: "Organization".to_string(),
                    kind: TypeKind::Entity,
                    cardinality: None,
                    attributes: BTreeMap::new(),
                    deprecates: vec![],
                },
                TypeDefinition {
                    name: "works_for".to_string(),
                    kind: TypeKind::Relation,
                    cardinality: Some(CardinalityKind::ManyToMany),
                    attributes: BTreeMap::new(),
                    deprecates: vec![],
                },
            ],
            created_at: now(),
        }
    }

    #[test]
    fn unknown_entity_type_is_rejected() {
        let problem = validate_entity(
            &ontology(),
            &EntityPayload {
                entity_type: "Vehicle".to_string(),
                attributes: BTreeMap::new(),
            },
        );
        assert_eq!(problem.unwrap().error_code, "ontology_entity_unknown_type");
    }

    #[test]
    fn missing_required_attribute_is_rejected() {
        let problem = validate_entity(
            &ontology(),
            &EntityPayload {
                entity_type: "Person".to_string(),
                attributes: BTreeMap::new(),
            },
        );
        assert_eq!(problem.unwrap().error_code, "ontology_entity_missing_properties");
    }

    #[test]
    fn complete_entity_payload_passes() {
        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), Value::String("Jane".to_string()));
        let problem = validate_entity(
            &ontology(),
            &EntityPayload {
                entity_type: "Person".to_string(),
                attributes: attrs,
            },
        );
        assert!(problem.is_none());
    }

    #[test]
    fn relation_with_unknown_endpoint_type_is_rejected() {
        let problem = validate_relation(
            &ontology(),
            &RelationPayload {
                relation_type: "works_for".to_string(),
                attributes: BTreeMap::new(),
                subject_entity_type: Some("Person".to_string()),
                object_entity_type: Some("Spaceship".to_string()),
            },
        );
        assert_eq!(problem.unwrap().error_code, "ontology_relation_domain_violation");
    }

    #[test]
    fn relation_with_known_endpoints_passes() {
        let problem = validate_relation(
            &ontology(),
            &RelationPayload {
                relation_type: "works_for".to_string(),
                attributes: BTreeMap::new(),
                subject_entity_type: Some("Person".to_string()),
                object_entity_type: Some("Organization".to_string()),
            },
        );
        assert!(problem.is_none());
    }
}
