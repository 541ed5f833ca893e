// aegi-analysis/src/disambiguation.rs
// ============================================================================
// Module: Entity Disambiguator
// Description: Two-layer entity identity resolution: exact normalized-name
//              matching, then embedding-similarity clustering for the rest.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! Layer 1 is deterministic: entities whose normalized canonical name or
//! alias coincide are merged with high confidence. Layer 2 is probabilistic:
//! remaining entities are clustered by embedding cosine similarity; clusters
//! whose mean similarity clears [`LAYER2_CONFIDENT_THRESHOLD`] are proposed
//! with higher confidence than those only clearing [`UNCERTAINTY_THRESHOLD`].
//! Neither layer applies a merge directly — both produce
//! [`EntityIdentityAction`] rows for the caller to persist and for an
//! analyst (or an auto-approval policy) to resolve.

use std::collections::BTreeMap;

use aegi_core::ids::CaseUid;
use aegi_core::ids::EntityIdentityActionUid;
use aegi_core::ids::EntityUid;
use aegi_core::model::Entity;
use aegi_core::model::EntityIdentityAction;
use aegi_core::model::EntityIdentityActionStatus;
use aegi_core::model::EntityIdentityActionType;
use aegi_core::time::Timestamp;

use crate::narrative::cosine_similarity;

/// Confidence assigned to a Layer 1 (exact normalized match) merge proposal.
pub const LAYER1_MERGE_CONFIDENCE: f64 = 0.95;
/// Minimum cosine similarity for a Layer 2 cluster to be treated as a
/// confident merge proposal rather than merely uncertain.
pub const LAYER2_CONFIDENT_THRESHOLD: f64 = 0.82;
/// Minimum cosine similarity for a Layer 2 pair to be considered at all.
pub const UNCERTAINTY_THRESHOLD: f64 = 0.7;

/// Approximates Unicode NFKC-fold-and-compare for entity name matching:
/// lowercases, strips everything but alphanumerics, and collapses
/// whitespace. Not a substitute for true NFKC, but sufficient to catch
/// case/punctuation/spacing variants of the same name.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut last_was_space = true;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            normalized.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            normalized.push(' ');
            last_was_space = true;
        }
    }
    normalized.trim_end().to_string()
}

fn all_names(entity: &Entity) -> Vec<String> {
    std::iter::once(entity.canonical_name.clone()).chain(entity.aliases.iter().cloned()).collect()
}

/// Proposes Layer 1 merges: entities sharing a normalized name or alias,
/// grouped regardless of embedding availability. Singleton groups produce
/// no proposal.
#[must_use]
pub fn layer1_exact_match_merges(entities: &[Entity], now: Timestamp) -> Vec<EntityIdentityAction> {
    let mut groups: BTreeMap<String, Vec<&Entity>> = BTreeMap::new();
    for entity in entities {
        for name in all_names(entity) {
            let key = normalize_name(&name);
            if key.is_empty() {
                continue;
            }
            groups.entry(key).or_default().push(entity);
        }
    }

    let mut proposals = Vec::new();
    let mut already_proposed: std::collections::BTreeSet<Vec<EntityUid>> = std::collections::BTreeSet::new();
    for members in groups.into_values() {
        let mut uids: Vec<EntityUid> = members.iter().map(|e| e.uid.clone()).collect();
        uids.sort();
        uids.dedup();
        if uids.len() < 2 || !already_proposed.insert(uids.clone()) {
            continue;
        }
        proposals.push(EntityIdentityAction {
            uid: EntityIdentityActionUid::mint(),
            case_uid: members[0].case_uid.clone(),
            action_type: EntityIdentityActionType::Merge,
            entity_uids: uids,
            confidence: LAYER1_MERGE_CONFIDENCE,
            status: EntityIdentityActionStatus::Approved,
            created_at: now,
        });
    }
    proposals
}

struct EmbeddingCluster {
    member_indices: Vec<usize>,
}

/// Proposes Layer 2 merges over entities not already resolved by Layer 1,
/// using caller-supplied embeddings (e.g. of the canonical name). Entities
/// without an embedding are skipped; there is no token-overlap fallback
/// here since entity names carry too little signal for it to be
/// meaningful at this layer.
///
/// Pairs join a cluster at [`LAYER2_CONFIDENT_THRESHOLD`]; once formed, a
/// cluster's mean pairwise similarity can still fall below that bar when
/// greedy chaining links members that are not pairwise similar. Clusters
/// whose mean stays at or above [`UNCERTAINTY_THRESHOLD`] auto-merge;
/// clusters whose mean drops below it are marked uncertain and must not
/// auto-merge, producing a pending [`EntityIdentityAction`] instead.
#[must_use]
pub fn layer2_embedding_merges(
    case_uid: &CaseUid,
    entities: &[Entity],
    embeddings: &BTreeMap<EntityUid, Vec<f32>>,
    now: Timestamp,
) -> Vec<EntityIdentityAction> {
    let candidates: Vec<&Entity> = entities.iter().filter(|e| embeddings.contains_key(&e.uid)).collect();
    let mut clusters: Vec<EmbeddingCluster> = Vec::new();

    for (idx, entity) in candidates.iter().enumerate() {
        let embedding = &embeddings[&entity.uid];
        let mut joined = None;
        for cluster in &mut clusters {
            let representative = candidates[cluster.member_indices[0]];
            let similarity = cosine_similarity(embedding, &embeddings[&representative.uid]);
            if similarity >= LAYER2_CONFIDENT_THRESHOLD {
                cluster.member_indices.push(idx);
                joined = Some(());
                break;
            }
        }
        if joined.is_none() {
            clusters.push(EmbeddingCluster { member_indices: vec![idx] });
        }
    }

    clusters
        .into_iter()
        .filter(|cluster| cluster.member_indices.len() >= 2)
        .map(|cluster| {
            let members: Vec<&Entity> = cluster.member_indices.iter().map(|&idx| candidates[idx]).collect();
            let confidence = mean_pairwise_similarity(&members, embeddings);
            let status = if confidence < UNCERTAINTY_THRESHOLD {
                EntityIdentityActionStatus::Pending
            } else {
                EntityIdentityActionStatus::Approved
            };
            let mut uids: Vec<EntityUid> = members.iter().map(|e| e.uid.clone()).collect();
            uids.sort();
            EntityIdentityAction {
                uid: EntityIdentityActionUid::mint(),
                case_uid: case_uid.clone(),
                action_type: EntityIdentityActionType::Merge,
                entity_uids: uids,
                confidence,
                status,
                created_at: now,
            }
        })
        .collect()
}

fn mean_pairwise_similarity(members: &[&Entity], embeddings: &BTreeMap<EntityUid, Vec<f32>>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            sum += cosine_similarity(&embeddings[&members[i].uid], &embeddings[&members[j].uid]);
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Whether a Layer 2 proposal was held back from auto-merge as uncertain,
/// based on its stored confidence.
#[must_use]
pub fn is_uncertain(action: &EntityIdentityAction) -> bool {
    action.confidence < UNCERTAINTY_THRESHOLD
}

/// Applies an approved merge: folds every duplicate's canonical name and
/// aliases into `primary`, deduplicating and excluding `primary`'s own
/// canonical name.
#[must_use]
pub fn apply_merge(primary: &Entity, duplicates: &[Entity], now: Timestamp) -> Entity {
    let mut aliases = primary.aliases.clone();
    for duplicate in duplicates {
        for name in all_names(duplicate) {
            if name != primary.canonical_name && !aliases.contains(&name) {
                aliases.push(name);
            }
        }
    }
    Entity { aliases, updated_at: now, ..primary.clone() }
}

/// Records an analyst decision on a pending identity action.
#[must_use]
pub fn resolve_action(action: EntityIdentityAction, status: EntityIdentityActionStatus) -> EntityIdentityAction {
    EntityIdentityAction { status, ..action }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::ids::EntityUid;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid"))
    }

    fn entity(uid: &str, canonical_name: &str, aliases: &[&str]) -> Entity {
        Entity {
            uid: EntityUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            entity_type: "person".to_string(),
            canonical_name: canonical_name.to_string(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn normalize_name_folds_case_and_punctuation() {
        assert_eq!(normalize_name("Jean-Luc Picard"), normalize_name("jean luc  picard"));
    }

    #[test]
    fn layer1_merges_entities_sharing_a_normalized_alias() {
        let entities = vec![
            entity("ent_1", "Jean-Luc Picard", &[]),
            entity("ent_2", "J.L. Picard", &["jean luc picard"]),
            entity("ent_3", "William Riker", &[]),
        ];
        let proposals = layer1_exact_match_merges(&entities, now());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].status, EntityIdentityActionStatus::Approved);
        assert_eq!(proposals[0].entity_uids.len(), 2);
    }

    #[test]
    fn layer2_auto_merges_a_confident_cluster() {
        let entities = vec![entity("ent_1", "Acme Corp", &[]), entity("ent_2", "Acme Corporation", &[])];
        let mut embeddings = BTreeMap::new();
        embeddings.insert(EntityUid::new("ent_1"), vec![1.0, 0.0]);
        embeddings.insert(EntityUid::new("ent_2"), vec![0.95, 0.05]);
        let proposals = layer2_embedding_merges(&CaseUid::new("case_1"), &entities, &embeddings, now());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].status, EntityIdentityActionStatus::Approved);
        assert!(!is_uncertain(&proposals[0]));
    }

    #[test]
    fn layer2_holds_back_a_cluster_whose_mean_drops_below_uncertainty() {
        // ent_2 and ent_3 both join ent_1's cluster on cosine >= 0.82, but
        // ent_2 and ent_3 are not similar to each other; the resulting
        // triangle's mean similarity falls under UNCERTAINTY_THRESHOLD.
        let entities = vec![
            entity("ent_1", "Acme Corp", &[]),
            entity("ent_2", "Acme Holdings", &[]),
            entity("ent_3", "Acme Ventures", &[]),
        ];
        let mut embeddings = BTreeMap::new();
        embeddings.insert(EntityUid::new("ent_1"), vec![1.0, 0.0]);
        embeddings.insert(EntityUid::new("ent_2"), vec![0.85, 0.527]);
        embeddings.insert(EntityUid::new("ent_3"), vec![0.83, -0.558]);
        let proposals = layer2_embedding_merges(&CaseUid::new("case_1"), &entities, &embeddings, now());
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].status, EntityIdentityActionStatus::Pending);
        assert!(is_uncertain(&proposals[0]));
    }

    #[test]
    fn layer2_skips_dissimilar_embeddings() {
        let entities = vec![entity("ent_1", "Acme Corp", &[]), entity("ent_2", "Globex Inc", &[])];
        let mut embeddings = BTreeMap::new();
        embeddings.insert(EntityUid::new("ent_1"), vec![1.0, 0.0]);
        embeddings.insert(EntityUid::new("ent_2"), vec![0.0, 1.0]);
        let proposals = layer2_embedding_merges(&CaseUid::new("case_1"), &entities, &embeddings, now());
        assert!(proposals.is_empty());
    }

    #[test]
    fn apply_merge_unions_aliases_without_duplicating_canonical_name() {
        let primary = entity("ent_1", "Acme Corp", &[]);
        let duplicate = entity("ent_2", "Acme Corporation", &["Acme Corp"]);
        let merged = apply_merge(&primary, std::slice::from_ref(&duplicate), now());
        assert_eq!(merged.canonical_name, "Acme Corp");
        assert!(merged.aliases.contains(&"Acme Corporation".to_string()));
        assert_eq!(merged.aliases.iter().filter(|a| *a == "Acme Corp").count(), 0);
    }

    #[test]
    fn resolve_action_overwrites_status_only() {
        let action = EntityIdentityAction {
            uid: EntityIdentityActionUid::new("eia_1"),
            case_uid: CaseUid::new("case_1"),
            action_type: EntityIdentityActionType::Merge,
            entity_uids: vec![EntityUid::new("ent_1"), EntityUid::new("ent_2")],
            confidence: 0.75,
            status: EntityIdentityActionStatus::Pending,
            created_at: now(),
        };
        let resolved = resolve_action(action.clone(), EntityIdentityActionStatus::Rejected);
        assert_eq!(resolved.status, EntityIdentityActionStatus::Rejected);
        assert_eq!(resolved.confidence, action.confidence);
    }
}
