// aegi-ontology/src/diff.rs
// ============================================================================
// Module: Ontology Compatibility Diff
// Description: Classifies every change between two ontology versions as
//              COMPATIBLE, DEPRECATED, or BREAKING (§4.2).
// Purpose: Let callers reject or warn on ontology migrations before they
//          are applied to a running case.
// Dependencies: aegi-core
// ============================================================================

use std::collections::BTreeSet;

use aegi_core::model::CardinalityKind;
use aegi_core::model::OntologyVersion;
use aegi_core::model::TypeDefinition;
use serde::Deserialize;
use serde::Serialize;

/// Severity of a single change between two ontology versions, ordered by
/// increasing impact so [`CompatibilityDiff::overall_level`] can take a max.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompatibilityLevel {
    /// Additive, non-breaking change (new optional type or attribute).
    Compatible,
    /// A type was marked deprecated, with a successor pointer.
    Deprecated,
    /// A change that can break existing data or callers.
    Breaking,
}

/// A single classified change between two ontology versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeChange {
    /// Name of the type the change applies to.
    pub type_name: String,
    /// Severity of this change.
    pub level: CompatibilityLevel,
    /// Human-readable description of the change.
    pub description: String,
}

/// Full compatibility diff between two ontology versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityDiff {
    /// Every classified change, in no particular order.
    pub changes: Vec<TypeChange>,
    /// Maximum level over all changes. `Compatible` when there are none.
    pub overall_level: CompatibilityLevel,
}

fn find<'a>(types: &'a [TypeDefinition], name: &str) -> Option<&'a TypeDefinition> {
    types.iter().find(|t| t.name == name)
}

/// Computes the compatibility diff from `old` to `new`.
#[must_use]
pub fn compatibility_diff(old: &OntologyVersion, new: &OntologyVersion) -> CompatibilityDiff {
    let mut changes = Vec::new();

    let old_names: BTreeSet<&str> = old.types.iter().map(|t| t.name.as_str()).collect();
    let new_names: BTreeSet<&str> = new.types.iter().map(|t| t.name.as_str()).collect();

    for name in new_names.difference(&old_names) {
        changes.push(TypeChange {
            type_name: (*name).to_string(),
            level: CompatibilityLevel::Compatible,
            description: format!("type '{name}' added"),
        });
    }

    for name in old_names.difference(&new_names) {
        let removed = find(&old.types, name);
        let still_deprecated_elsewhere = new
            .types
            .iter()
            .any(|t| t.deprecates.iter().any(|d| d == name));
        let level = if still_deprecated_elsewhere {
            CompatibilityLevel::Deprecated
        } else {
            CompatibilityLevel::Breaking
        };
        let description = match (removed, still_deprecated_elsewhere) {
            (_, true) => format!("type '{name}' removed in favor of a successor"),
            _ => format!("type '{name}' removed without a successor"),
        };
        changes.push(TypeChange {
            type_name: (*name).to_string(),
            level,
            description,
        });
    }

    for name in old_names.intersection(&new_names) {
        let Some(before) = find(&old.types, name) else {
            continue;
        };
        let Some(after) = find(&new.types, name) else {
            continue;
        };
        changes.extend(diff_type(before, after));
    }

    let overall_level = changes
        .iter()
        .map(|c| c.level)
        .max()
        .unwrap_or(CompatibilityLevel::Compatible);

    CompatibilityDiff {
        changes,
        overall_level,
    }
}

fn diff_type(before: &TypeDefinition, after: &TypeDefinition) -> Vec<TypeChange> {
    let mut changes = Vec::new();

    for (attr_name, attr_type) in &after.attributes {
        if !before.attributes.contains_key(attr_name) {
            changes.push(TypeChange {
                type_name: after.name.clone(),
                level: CompatibilityLevel::Compatible,
                description: format!("attribute '{attr_name}: {attr_type}' added"),
            });
        }
    }

    for (attr_name, attr_type) in &before.attributes {
        if !after.attributes.contains_key(attr_name) {
            changes.push(TypeChange {
                type_name: after.name.clone(),
                level: CompatibilityLevel::Breaking,
                description: format!("required property '{attr_name}: {attr_type}' removed"),
            });
        }
    }

    if let (Some(before_card), Some(after_card)) = (before.cardinality, after.cardinality)
        && cardinality_tightened(before_card, after_card)
    {
        changes.push(TypeChange {
            type_name: after.name.clone(),
            level: CompatibilityLevel::Breaking,
            description: "cardinality tightened".to_string(),
        });
    }

    changes
}

fn cardinality_tightened(before: CardinalityKind, after: CardinalityKind) -> bool {
    fn rank(kind: CardinalityKind) -> u8 {
        match kind {
            CardinalityKind::ManyToMany => 0,
            CardinalityKind::OneToMany => 1,
            CardinalityKind::OneToOne => 2,
        }
    }
    rank(after) > rank(before)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::Timestamp;
    use aegi_core::ids::OntologyVersionUid;
    use aegi_core::model::TypeKind;
    use std::collections::BTreeMap;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid unix time"))
    }

    fn version(version: u32, types: Vec<TypeDefinition>) -> OntologyVersion {
        OntologyVersion {
            uid: OntologyVersionUid::mint(),
            version,
            types,
            created_at: now(),
        }
    }

    #[test]
    fn added_type_is_compatible() {
        let old = version(1, vec![]);
        let new = version(
            2,
            vec![TypeDefinition {
                name: "Person".to_string(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: BTreeMap::new(),
                deprecates: vec![],
            }],
        );
        let diff = compatibility_diff(&old, &new);
        assert_eq!(diff.overall_level, CompatibilityLevel::Compatible);
        assert_eq!(diff.changes.len(), 1);
    }

    #[test]
    fn removed_type_without_successor_is_breaking() {
        let old = version(
            1,
            vec![TypeDefinition {
                name: "Person".to_string(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: BTreeMap::new(),
                deprecates: vec![],
            }],
        );
        let new = version(2, vec![]);
        let diff = compatibility_diff(&old, &new);
        assert_eq!(diff.overall_level, CompatibilityLevel::Breaking);
    }

    #[test]
    fn removed_type_with_successor_is_deprecated() {
        let old = version(
            1,
            vec![TypeDefinition {
                name: "Person".to_string(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: BTreeMap::new(),
                deprecates: vec![],
            }],
        );
        let new = version(
            2,
            vec![TypeDefinition {
                name: "Individual".to_string(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: BTreeMap::new(),
                deprecates: vec!["Person".to_string()],
            }],
        );
        let diff = compatibility_diff(&old, &new);
        assert_eq!(diff.overall_level, CompatibilityLevel::Deprecated);
    }

    #[test]
    fn removed_required_attribute_is_breaking() {
        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), "string".to_string());
        let old = version(
            1,
            vec![TypeDefinition {
                name: "Person".to_string(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: attrs,
                deprecates: vec![],
            }],
        );
        let new = version(
            2,
            vec![TypeDefinition {
                name: "Person".to_string(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: BTreeMap::new(),
                deprecates: vec![],
            }],
        );
        let diff = compatibility_diff(&old, &new);
        assert_eq!(diff.overall_level, CompatibilityLevel::Breaking);
    }

    #[test]
    fn tightened_cardinality_is_breaking() {
        let old = version(
            1,
            vec![TypeDefinition {
                name: "works_for".to_string(),
                kind: TypeKind::Relation,
                cardinality: Some(CardinalityKind::ManyToMany),
                attributes: BTreeMap::new(),
                deprecates: vec![],
            }],
        );
        let new = version(
            2,
            vec![TypeDefinition {
                name: "works_for".to_string(),
                kind: TypeKind::Relation,
                cardinality: Some(CardinalityKind::OneToOne),
                attributes: BTreeMap::new(),
                deprecates: vec![],
            }],
        );
        let diff = compatibility_diff(&old, &new);
        assert_eq!(diff.overall_level, CompatibilityLevel::Breaking);
    }

    #[test]
    fn identical_versions_have_no_changes() {
        let types = vec![TypeDefinition {
            name: "Person".to_string(),
            kind: TypeKind::Entity,
            cardinality: None,
            attributes: BTreeMap::new(),
            deprecates: vec![],
        }];
        let old = version(1, types.clone());
        let new = version(2, types);
        let diff = compatibility_diff(&old, &new);
        assert!(diff.changes.is_empty());
        assert_eq!(diff.overall_level, CompatibilityLevel::Compatible);
    }
}
