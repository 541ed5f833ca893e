// aegi-core/src/runtime/memory_graph.rs
// ============================================================================
// Module: In-Memory Graph Store
// Description: Simple in-memory graph store for tests and the CLI demo.
// Purpose: Provide a deterministic GraphStore implementation without
//          external dependencies.
// Dependencies: crate::{ids, interfaces, model}
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ids::CaseUid;
use crate::ids::EntityIdentityActionUid;
use crate::ids::EntityUid;
use crate::interfaces::GraphStore;
use crate::interfaces::StoreError;
use crate::model::Entity;
use crate::model::EntityIdentityAction;
use crate::model::RelationFact;

#[derive(Debug, Default)]
struct Tables {
    entities: BTreeMap<String, Entity>,
    relations: Vec<RelationFact>,
    identity_actions: BTreeMap<String, EntityIdentityAction>,
}

/// In-memory [`GraphStore`] for tests and local demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryGraphStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryGraphStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Io("graph store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn put_entity(&self, entity: &Entity) -> Result<(), StoreError> {
        self.lock()?
            .entities
            .insert(entity.uid.as_str().to_string(), entity.clone());
        Ok(())
    }

    async fn get_entity(&self, uid: &EntityUid) -> Result<Option<Entity>, StoreError> {
        Ok(self.lock()?.entities.get(uid.as_str()).cloned())
    }

    async fn list_entities_by_case(&self, case_uid: &CaseUid) -> Result<Vec<Entity>, StoreError> {
        Ok(self
            .lock()?
            .entities
            .values()
            .filter(|row| &row.case_uid == case_uid)
            .cloned()
            .collect())
    }

    async fn put_relation_fact(&self, relation: &RelationFact) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.relations.retain(|row| row.uid != relation.uid);
        tables.relations.push(relation.clone());
        Ok(())
    }

    async fn list_relations_by_entity(
        &self,
        entity_uid: &EntityUid,
    ) -> Result<Vec<RelationFact>, StoreError> {
        Ok(self
            .lock()?
            .relations
            .iter()
            .filter(|row| &row.subject_entity_uid == entity_uid || &row.object_entity_uid == entity_uid)
            .cloned()
            .collect())
    }

    async fn put_identity_action(&self, action: &EntityIdentityAction) -> Result<(), StoreError> {
        self.lock()?
            .identity_actions
            .insert(action.uid.as_str().to_string(), action.clone());
        Ok(())
    }

    async fn list_pending_identity_actions(
        &self,
        case_uid: &CaseUid,
    ) -> Result<Vec<EntityIdentityAction>, StoreError> {
        Ok(self
            .lock()?
            .identity_actions
            .values()
            .filter(|row| {
                &row.case_uid == case_uid
                    && row.status == crate::model::EntityIdentityActionStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn get_identity_action(
        &self,
        uid: &EntityIdentityActionUid,
    ) -> Result<Option<EntityIdentityAction>, StoreError> {
        Ok(self.lock()?.identity_actions.get(uid.as_str()).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityIdentityActionStatus;
    use crate::model::EntityIdentityActionType;
    use crate::time::Timestamp;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid unix time"))
    }

    #[tokio::test]
    async fn relations_are_found_from_either_endpoint() {
        let store = InMemoryGraphStore::new();
        let a = EntityUid::new("ent_a");
        let b = EntityUid::new("ent_b");
        let relation = RelationFact {
            uid: crate::ids::RelationFactUid::new("rel_1"),
            case_uid: CaseUid::new("case_1"),
            relation_type: "works_for".to_string(),
            subject_entity_uid: a.clone(),
            object_entity_uid: b.clone(),
            assertion_uids: vec![],
            created_at: now(),
        };
        store.put_relation_fact(&relation).await.expect("put");
        assert_eq!(store.list_relations_by_entity(&a).await.expect("list").len(), 1);
        assert_eq!(store.list_relations_by_entity(&b).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn pending_filter_excludes_resolved_actions() {
        let store = InMemoryGraphStore::new();
        let case = CaseUid::new("case_1");
        for (uid, status) in [
            ("eia_1", EntityIdentityActionStatus::Pending),
            ("eia_2", EntityIdentityActionStatus::Approved),
        ] {
            let action = EntityIdentityAction {
                uid: EntityIdentityActionUid::new(uid),
                case_uid: case.clone(),
                action_type: EntityIdentityActionType::Merge,
                entity_uids: vec![],
                confidence: 0.9,
                status,
                created_at: now(),
            };
            store.put_identity_action(&action).await.expect("put");
        }
        let pending = store
            .list_pending_identity_actions(&case)
            .await
            .expect("list");
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].uid, EntityIdentityActionUid::new("eia_1"));
    }
}
