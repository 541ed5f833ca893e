// aegi-ontology/src/registry.rs
// ============================================================================
// Module: Ontology Registry
// Description: Process-wide map of ontology version to its type definitions.
// Purpose: Hold the active and historical ontology versions in memory,
//          accepting both legacy list-of-name shapes and full contract
//          dicts on load (§4.2 backward compatibility).
// Dependencies: aegi-core
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use aegi_core::Timestamp;
use aegi_core::ids::OntologyVersionUid;
use aegi_core::model::CardinalityKind;
use aegi_core::model::OntologyVersion;
use aegi_core::model::TypeDefinition;
use aegi_core::model::TypeKind;
use thiserror::Error;

/// Ontology registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Requested ontology version does not exist.
    #[error("ontology version not found: {0}")]
    VersionNotFound(u32),
    /// Registry already holds a version with this number.
    #[error("ontology version already registered: {0}")]
    VersionConflict(u32),
    /// Registry's internal lock was poisoned by a panicking holder.
    #[error("ontology registry lock poisoned")]
    LockPoisoned,
}

/// Process-wide map `version -> OntologyVersion`. Guarded by a mutex so the
/// registry can be shared across the analysis pipeline's concurrent stages.
#[derive(Clone, Default)]
pub struct OntologyRegistry {
    versions: Arc<Mutex<BTreeMap<u32, OntologyVersion>>>,
}

impl OntologyRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<u32, OntologyVersion>>, RegistryError> {
        self.versions.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Registers a new ontology version.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::VersionConflict`] if the version number is
    /// already registered.
    pub fn register(&self, version: OntologyVersion) -> Result<(), RegistryError> {
        let mut guard = self.lock()?;
        if guard.contains_key(&version.version) {
            return Err(RegistryError::VersionConflict(version.version));
        }
        guard.insert(version.version, version);
        Ok(())
    }

    /// Loads a legacy list-of-name ontology shape, synthesizing a minimal
    /// [`TypeDefinition`] (no attributes, no cardinality) for each name.
    /// Kept for backward compatibility with pre-registry ontology exports.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::VersionConflict`] if the version number is
    /// already registered.
    pub fn load_legacy_names(
        &self,
        version: u32,
        entity_type_names: &[String],
        relation_type_names: &[String],
        created_at: Timestamp,
    ) -> Result<(), RegistryError> {
        let mut types = Vec::with_capacity(entity_type_names.len() + relation_type_names.len());
        for name in entity_type_names {
            types.push(TypeDefinition {
                name: name.clone(),
                kind: TypeKind::Entity,
                cardinality: None,
                attributes: BTreeMap::new(),
                deprecates: Vec::new(),
            });
        }
        for name in relation_type_names {
            types.push(TypeDefinition {
                name: name.clone(),
                kind: TypeKind::Relation,
                cardinality: Some(CardinalityKind::ManyToMany),
                attributes: BTreeMap::new(),
                deprecates: Vec::new(),
            });
        }
        self.register(OntologyVersion {
            uid: OntologyVersionUid::mint(),
            version,
            types,
            created_at,
        })
    }

    /// Returns the ontology version with the given number.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::VersionNotFound`] when no such version is registered.
    pub fn get(&self, version: u32) -> Result<OntologyVersion, RegistryError> {
        self.lock()?
            .get(&version)
            .cloned()
            .ok_or(RegistryError::VersionNotFound(version))
    }

    /// Returns the highest-numbered registered version, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::LockPoisoned`] if the registry's lock was poisoned.
    pub fn latest(&self) -> Result<Option<OntologyVersion>, RegistryError> {
        Ok(self.lock()?.values().next_back().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid unix time"))
    }

    #[test]
    fn legacy_names_synthesize_minimal_definitions() {
        let registry = OntologyRegistry::new();
        registry
            .load_legacy_names(
                1,
                &["Person".to_string(), "Organization".to_string()],
                &["works_for".to_string()],
                now(),
            )
            .expect("load");
        let version = registry.get(1).expect("get");
        assert_eq!(version.types.len(), 3);
    }

    #[test]
    fn registering_duplicate_version_conflicts() {
        let registry = OntologyRegistry::new();
        let version = OntologyVersion {
            uid: OntologyVersionUid::mint(),
            version: 1,
            types: Vec::new(),
            created_at: now(),
        };
        registry.register(version.clone()).expect("first register");
        let err = registry.register(version).unwrap_err();
        assert!(matches!(err, RegistryError::VersionConflict(1)));
    }

    #[test]
    fn latest_returns_highest_version() {
        let registry = OntologyRegistry::new();
        for v in [1, 3, 2] {
            registry
                .register(OntologyVersion {
                    uid: OntologyVersionUid::mint(),
                    version: v,
                    types: Vec::new(),
                    created_at: now(),
                })
                .expect("register");
        }
        assert_eq!(registry.latest().expect("latest").map(|v| v.version), Some(3));
    }
}
