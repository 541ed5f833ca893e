// aegi-analysis/src/graph.rs
// ============================================================================
// Module: KG Pipeline and Graph Analysis
// Description: Extracts typed entities/relations/events from assertions,
//              validates them against the active ontology version, and runs
//              community/centrality/path/timeline/gap analyses over the
//              resulting case subgraph.
// Dependencies: aegi-core, aegi-ontology
// ============================================================================

//! ## Overview
//! The KG pipeline issues one structured LLM call per assertion, asking for
//! candidate entity/relation/event mentions grounded in that assertion's
//! text. Candidates are validated against the active [`OntologyVersion`]
//! before becoming graph rows; anything the ontology rejects is dropped and
//! counted rather than raised. The pipeline records one `kg.build` audit
//! [`Action`] per call to [`build_graph`].
//!
//! Graph analyses are pure functions over an already-built entity/relation
//! set, hand-rolled on `std` collections: no graph-algorithm crate in this
//! workspace's dependency tree covers Louvain/PageRank/betweenness, and none
//! of the example repos this system was grounded on pull one in either.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::VecDeque;

use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::LlmInvocationRequest;
use aegi_core::ToolTraceStatus;
use aegi_core::ids::ActionUid;
use aegi_core::ids::AssertionUid;
use aegi_core::ids::CaseUid;
use aegi_core::ids::EntityUid;
use aegi_core::ids::EventUid;
use aegi_core::ids::RelationFactUid;
use aegi_core::ids::ToolTraceUid;
use aegi_core::model::Action;
use aegi_core::model::Assertion;
use aegi_core::model::Entity;
use aegi_core::model::GraphEvent;
use aegi_core::model::OntologyVersion;
use aegi_core::model::RelationFact;
use aegi_core::model::ToolTrace;
use aegi_core::time::Timestamp;
use aegi_ontology::EntityPayload;
use aegi_ontology::ProblemDetail;
use aegi_ontology::RelationPayload;
use aegi_ontology::validate_entity;
use aegi_ontology::validate_relation;
use serde::Deserialize;

use crate::disambiguation::normalize_name;

const KG_SYSTEM_PROMPT: &str = concat!(
    "Given one factual statement, identify the entities it mentions, any ",
    "typed relation between them, and any event it describes. Respond as ",
    "JSON with `entities`, `relations`, and `events` arrays; omit any you ",
    "cannot ground in the statement's text."
);

#[derive(Debug, Clone, Deserialize)]
struct RawEntity {
    entity_type: String,
    canonical_name: String,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRelation {
    relation_type: String,
    subject_name: String,
    object_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEvent {
    event_type: String,
    participant_names: Vec<String>,
    #[serde(default)]
    occurred_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawExtraction {
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    relations: Vec<RawRelation>,
    #[serde(default)]
    events: Vec<RawEvent>,
}

/// Outcome of one `build_graph` run over a batch of assertions.
#[derive(Debug, Clone)]
pub struct KgBuildResult {
    /// Entities to upsert into the graph store.
    pub entities: Vec<Entity>,
    /// Relation facts to upsert into the graph store.
    pub relations: Vec<RelationFact>,
    /// Graph events discovered; this system has no dedicated event store,
    /// so callers fold these into whichever evidence/report surface needs
    /// them.
    pub events: Vec<GraphEvent>,
    /// Ontology violations encountered, one per rejected candidate.
    pub problems: Vec<ProblemDetail>,
    /// Audit action recording this build.
    pub action: Action,
    /// Audit traces of the underlying LLM calls, one per assertion.
    pub traces: Vec<ToolTrace>,
}

struct Builder<'a> {
    case_uid: &'a CaseUid,
    ontology: &'a OntologyVersion,
    entities_by_name: BTreeMap<String, Entity>,
    relations: Vec<RelationFact>,
    events: Vec<GraphEvent>,
    problems: Vec<ProblemDetail>,
}

impl<'a> Builder<'a> {
    fn new(case_uid: &'a CaseUid, ontology: &'a OntologyVersion) -> Self {
        Self {
            case_uid,
            ontology,
            entities_by_name: BTreeMap::new(),
            relations: Vec::new(),
            events: Vec::new(),
            problems: Vec::new(),
        }
    }

    fn upsert_entity(&mut self, raw: &RawEntity, now: Timestamp) -> Option<EntityUid> {
        let payload = EntityPayload {
            entity_type: raw.entity_type.clone(),
            attributes: BTreeMap::new(),
        };
        if let Some(problem) = validate_entity(self.ontology, &payload) {
            self.problems.push(problem);
            return None;
        }
        let key = normalize_name(&raw.canonical_name);
        if key.is_empty() {
            return None;
        }
        let uid = if let Some(existing) = self.entities_by_name.get_mut(&key) {
            for alias in &raw.aliases {
                if !existing.aliases.contains(alias) {
                    existing.aliases.push(alias.clone());
                }
            }
            existing.updated_at = now;
            existing.uid.clone()
        } else {
            let entity = Entity {
                uid: EntityUid::mint(),
                case_uid: self.case_uid.clone(),
                entity_type: raw.entity_type.clone(),
                canonical_name: raw.canonical_name.clone(),
                aliases: raw.aliases.clone(),
                created_at: now,
                updated_at: now,
            };
            let uid = entity.uid.clone();
            self.entities_by_name.insert(key, entity);
            uid
        };
        Some(uid)
    }

    fn find_entity_uid(&self, name: &str) -> Option<EntityUid> {
        self.entities_by_name.get(&normalize_name(name)).map(|e| e.uid.clone())
    }

    fn add_relation(&mut self, raw: &RawRelation, assertion_uid: &AssertionUid, now: Timestamp) {
        let Some(subject_uid) = self.find_entity_uid(&raw.subject_name) else { return };
        let Some(object_uid) = self.find_entity_uid(&raw.object_name) else { return };
        let subject_type = self.entities_by_name.values().find(|e| e.uid == subject_uid).map(|e| e.entity_type.clone());
        let object_type = self.entities_by_name.values().find(|e| e.uid == object_uid).map(|e| e.entity_type.clone());
        let payload = RelationPayload {
            relation_type: raw.relation_type.clone(),
            attributes: BTreeMap::new(),
            subject_entity_type: subject_type,
            object_entity_type: object_type,
        };
        if let Some(problem) = validate_relation(self.ontology, &payload) {
            self.problems.push(problem);
            return;
        }
        self.relations.push(RelationFact {
            uid: RelationFactUid::mint(),
            case_uid: self.case_uid.clone(),
            relation_type: raw.relation_type.clone(),
            subject_entity_uid: subject_uid,
            object_entity_uid: object_uid,
            assertion_uids: vec![assertion_uid.clone()],
            created_at: now,
        });
    }

    fn add_event(&mut self, raw: &RawEvent, now: Timestamp) {
        let participant_entity_uids: Vec<EntityUid> =
            raw.participant_names.iter().filter_map(|name| self.find_entity_uid(name)).collect();
        let occurred_at = raw
            .occurred_at
            .as_deref()
            .and_then(|text| time::OffsetDateTime::parse(text, &time::format_description::well_known::Rfc3339).ok())
            .map(Timestamp::new);
        self.events.push(GraphEvent {
            uid: EventUid::mint(),
            case_uid: self.case_uid.clone(),
            event_type: raw.event_type.clone(),
            participant_entity_uids,
            occurred_at,
            created_at: now,
        });
    }
}

/// Builds the case knowledge graph from a batch of assertions, one LLM
/// call per assertion, validating every candidate against `ontology`
/// before it becomes a graph row.
pub async fn build_graph(
    llm: &dyn LlmClient,
    ontology: &OntologyVersion,
    case_uid: &CaseUid,
    assertions: &[Assertion],
    budget: BudgetContext,
    now: Timestamp,
) -> KgBuildResult {
    let mut builder = Builder::new(case_uid, ontology);
    let mut traces = Vec::new();

    for assertion in assertions {
        let request =
            LlmInvocationRequest { system_prompt: KG_SYSTEM_PROMPT.to_string(), user_prompt: assertion.text.clone() };
        let invocation = llm.invoke_structured(&request, &extraction_schema(), budget).await;

        let (status, detail) = match invocation {
            Ok(Ok(value)) => match serde_json::from_value::<RawExtraction>(value) {
                Ok(raw) => {
                    for entity in &raw.entities {
                        builder.upsert_entity(entity, now);
                    }
                    for relation in &raw.relations {
                        builder.add_relation(relation, &assertion.uid, now);
                    }
                    for event in &raw.events {
                        builder.add_event(event, now);
                    }
                    (ToolTraceStatus::Ok, serde_json::json!({"assertion_uid": assertion.uid.as_str()}))
                }
                Err(err) => (
                    ToolTraceStatus::Degraded,
                    serde_json::json!({"reason": "unparsable_response", "detail": err.to_string()}),
                ),
            },
            Ok(Err(degraded)) => {
                (ToolTraceStatus::Degraded, serde_json::json!({"reason": format!("{:?}", degraded.reason)}))
            }
            Err(err) => (ToolTraceStatus::Failed, serde_json::json!({"reason": err.to_string()})),
        };

        traces.push(ToolTrace {
            uid: ToolTraceUid::mint(),
            capability: "llm.invoke_structured.kg_extraction".to_string(),
            status,
            duration_ms: 0,
            detail,
            created_at: now,
        });
    }

    let entities: Vec<Entity> = builder.entities_by_name.into_values().collect();
    let action = Action {
        uid: ActionUid::mint(),
        case_uid: Some(case_uid.clone()),
        operation: "kg.build".to_string(),
        actor: "kg_pipeline".to_string(),
        detail: serde_json::json!({
            "assertion_count": assertions.len(),
            "entity_count": entities.len(),
            "relation_count": builder.relations.len(),
            "event_count": builder.events.len(),
            "problem_count": builder.problems.len(),
        }),
        created_at: now,
    };

    KgBuildResult { entities, relations: builder.relations, events: builder.events, problems: builder.problems, action, traces }
}

fn extraction_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "entities": {"type": "array"},
            "relations": {"type": "array"},
            "events": {"type": "array"}
        }
    })
}

// ============================================================================
// SECTION: Graph Analysis
// ============================================================================

fn build_adjacency(entities: &[Entity], relations: &[RelationFact]) -> BTreeMap<EntityUid, BTreeSet<EntityUid>> {
    let mut adjacency: BTreeMap<EntityUid, BTreeSet<EntityUid>> =
        entities.iter().map(|e| (e.uid.clone(), BTreeSet::new())).collect();
    for relation in relations {
        adjacency.entry(relation.subject_entity_uid.clone()).or_default().insert(relation.object_entity_uid.clone());
        adjacency.entry(relation.object_entity_uid.clone()).or_default().insert(relation.subject_entity_uid.clone());
    }
    adjacency
}

/// Degree centrality: raw neighbor count per entity.
#[must_use]
pub fn degree_centrality(entities: &[Entity], relations: &[RelationFact]) -> BTreeMap<EntityUid, f64> {
    build_adjacency(entities, relations).into_iter().map(|(uid, neighbors)| (uid, neighbors.len() as f64)).collect()
}

/// PageRank over the undirected case subgraph via power iteration.
#[must_use]
pub fn pagerank(
    entities: &[Entity],
    relations: &[RelationFact],
    damping: f64,
    iterations: usize,
) -> BTreeMap<EntityUid, f64> {
    let adjacency = build_adjacency(entities, relations);
    let n = adjacency.len();
    if n == 0 {
        return BTreeMap::new();
    }
    let uids: Vec<EntityUid> = adjacency.keys().cloned().collect();
    let mut ranks: BTreeMap<EntityUid, f64> = uids.iter().map(|uid| (uid.clone(), 1.0 / n as f64)).collect();

    for _ in 0..iterations {
        let dangling_mass: f64 =
            uids.iter().filter(|uid| adjacency[*uid].is_empty()).map(|uid| ranks[uid]).sum();
        let mut next: BTreeMap<EntityUid, f64> =
            uids.iter().map(|uid| (uid.clone(), (1.0 - damping) / n as f64 + damping * dangling_mass / n as f64)).collect();
        for uid in &uids {
            let neighbors = &adjacency[uid];
            if neighbors.is_empty() {
                continue;
            }
            let share = damping * ranks[uid] / neighbors.len() as f64;
            for neighbor in neighbors {
                *next.get_mut(neighbor).expect("neighbor present in adjacency") += share;
            }
        }
        ranks = next;
    }
    ranks
}

/// Betweenness centrality via Brandes' algorithm over the unweighted,
/// undirected case subgraph.
#[must_use]
pub fn betweenness_centrality(entities: &[Entity], relations: &[RelationFact]) -> BTreeMap<EntityUid, f64> {
    let adjacency = build_adjacency(entities, relations);
    let mut centrality: BTreeMap<EntityUid, f64> = adjacency.keys().map(|uid| (uid.clone(), 0.0)).collect();

    for source in adjacency.keys() {
        let mut stack = Vec::new();
        let mut predecessors: BTreeMap<EntityUid, Vec<EntityUid>> =
            adjacency.keys().map(|uid| (uid.clone(), Vec::new())).collect();
        let mut sigma: BTreeMap<EntityUid, f64> = adjacency.keys().map(|uid| (uid.clone(), 0.0)).collect();
        let mut dist: BTreeMap<EntityUid, i64> = adjacency.keys().map(|uid| (uid.clone(), -1)).collect();
        *sigma.get_mut(source).expect("source present") = 1.0;
        *dist.get_mut(source).expect("source present") = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source.clone());
        while let Some(v) = queue.pop_front() {
            stack.push(v.clone());
            for w in &adjacency[&v] {
                if dist[w] < 0 {
                    dist.insert(w.clone(), dist[&v] + 1);
                    queue.push_back(w.clone());
                }
                if dist[w] == dist[&v] + 1 {
                    let updated = sigma[&v];
                    *sigma.get_mut(w).expect("present") += updated;
                    predecessors.get_mut(w).expect("present").push(v.clone());
                }
            }
        }

        let mut delta: BTreeMap<EntityUid, f64> = adjacency.keys().map(|uid| (uid.clone(), 0.0)).collect();
        while let Some(w) = stack.pop() {
            for v in &predecessors[&w] {
                let contribution = (sigma[v] / sigma[&w]) * (1.0 + delta[&w]);
                *delta.get_mut(v).expect("present") += contribution;
            }
            if w != *source {
                *centrality.get_mut(&w).expect("present") += delta[&w];
            }
        }
    }

    // Undirected graphs double-count each shortest path through both
    // endpoints' traversals; halve to match the conventional definition.
    for value in centrality.values_mut() {
        *value /= 2.0;
    }
    centrality
}

/// Community assignment via synchronous label propagation: each entity
/// adopts the majority label among its neighbors, ties broken by the
/// numerically smallest label, until labels stop changing or
/// `max_iterations` is reached.
#[must_use]
pub fn label_propagation_communities(
    entities: &[Entity],
    relations: &[RelationFact],
    max_iterations: usize,
) -> BTreeMap<EntityUid, usize> {
    let adjacency = build_adjacency(entities, relations);
    let uids: Vec<EntityUid> = adjacency.keys().cloned().collect();
    let mut labels: BTreeMap<EntityUid, usize> = uids.iter().enumerate().map(|(idx, uid)| (uid.clone(), idx)).collect();

    for _ in 0..max_iterations {
        let mut changed = false;
        let snapshot = labels.clone();
        for uid in &uids {
            let neighbors = &adjacency[uid];
            if neighbors.is_empty() {
                continue;
            }
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for neighbor in neighbors {
                *counts.entry(snapshot[neighbor]).or_insert(0) += 1;
            }
            let best = counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(label, _)| label)
                .unwrap_or(snapshot[uid]);
            if best != labels[uid] {
                labels.insert(uid.clone(), best);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    labels
}

/// Enumerates simple paths between two entities up to `max_hops` edges,
/// via bounded depth-first search over the undirected case subgraph.
#[must_use]
pub fn multi_hop_paths(
    entities: &[Entity],
    relations: &[RelationFact],
    from: &EntityUid,
    to: &EntityUid,
    max_hops: usize,
) -> Vec<Vec<EntityUid>> {
    let adjacency = build_adjacency(entities, relations);
    let mut paths = Vec::new();
    let mut visited = BTreeSet::new();
    let mut path = vec![from.clone()];
    visited.insert(from.clone());
    walk_paths(&adjacency, from, to, max_hops, &mut visited, &mut path, &mut paths);
    paths
}

fn walk_paths(
    adjacency: &BTreeMap<EntityUid, BTreeSet<EntityUid>>,
    current: &EntityUid,
    target: &EntityUid,
    hops_remaining: usize,
    visited: &mut BTreeSet<EntityUid>,
    path: &mut Vec<EntityUid>,
    paths: &mut Vec<Vec<EntityUid>>,
) {
    if current == target && path.len() > 1 {
        paths.push(path.clone());
        return;
    }
    if hops_remaining == 0 {
        return;
    }
    let Some(neighbors) = adjacency.get(current) else { return };
    for neighbor in neighbors {
        if visited.contains(neighbor) {
            continue;
        }
        visited.insert(neighbor.clone());
        path.push(neighbor.clone());
        walk_paths(adjacency, neighbor, target, hops_remaining - 1, visited, path, paths);
        path.pop();
        visited.remove(neighbor);
    }
}

/// Graph events ordered into a timeline; events with an unknown
/// `occurred_at` sort after every dated event, in creation order.
#[must_use]
pub fn event_timeline(events: &[GraphEvent]) -> Vec<GraphEvent> {
    let mut ordered = events.to_vec();
    ordered.sort_by(|a, b| match (a.occurred_at, b.occurred_at) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.created_at.cmp(&b.created_at),
    });
    ordered
}

/// Structural gap report over the case subgraph.
#[derive(Debug, Clone, PartialEq)]
pub struct GapReport {
    /// Entities with no incident relations.
    pub isolated_entity_uids: Vec<EntityUid>,
    /// Size of each connected component, largest first.
    pub component_sizes: Vec<usize>,
    /// Edge density: actual edges over possible undirected edges.
    pub density: f64,
}

/// Computes isolated nodes, connected component sizes, and edge density
/// over the case subgraph.
#[must_use]
pub fn gap_report(entities: &[Entity], relations: &[RelationFact]) -> GapReport {
    let adjacency = build_adjacency(entities, relations);
    let isolated_entity_uids: Vec<EntityUid> =
        adjacency.iter().filter(|(_, neighbors)| neighbors.is_empty()).map(|(uid, _)| uid.clone()).collect();

    let mut visited = BTreeSet::new();
    let mut component_sizes = Vec::new();
    for uid in adjacency.keys() {
        if visited.contains(uid) {
            continue;
        }
        let mut size = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back(uid.clone());
        visited.insert(uid.clone());
        while let Some(current) = queue.pop_front() {
            size += 1;
            for neighbor in &adjacency[&current] {
                if visited.insert(neighbor.clone()) {
                    queue.push_back(neighbor.clone());
                }
            }
        }
        component_sizes.push(size);
    }
    component_sizes.sort_unstable_by(|a, b| b.cmp(a));

    let n = adjacency.len();
    let edge_count = relations.len();
    let possible = if n < 2 { 0 } else { n * (n - 1) / 2 };
    let density = if possible == 0 { 0.0 } else { edge_count as f64 / possible as f64 };

    GapReport { isolated_entity_uids, component_sizes, density }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::DegradedOutput;
    use aegi_core::DegradedReason;
    use aegi_core::LlmError;
    use aegi_core::ids::AssertionUid;
    use aegi_core::ids::OntologyVersionUid;
    use aegi_core::model::AssertionValue;
    use aegi_core::model::CardinalityKind;
    use aegi_core::model::TypeDefinition;
    use aegi_core::model::TypeKind;
    use async_trait::async_trait;
    use std::time::Duration;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid"))
    }

    fn budget() -> BudgetContext {
        BudgetContext { deadline: Duration::from_secs(5), max_output_tokens: 256 }
    }

    fn test_ontology() -> OntologyVersion {
        OntologyVersion {
            uid: OntologyVersionUid::new("ont_1"),
            version: 1,
            types: vec![
                TypeDefinition {
                    name: "person".to_string(),
                    kind: TypeKind::Entity,
                    cardinality: None,
                    attributes: BTreeMap::new(),
                    deprecates: Vec::new(),
                },
                TypeDefinition {
                    name: "met_with".to_string(),
                    kind: TypeKind::Relation,
                    cardinality: Some(CardinalityKind::ManyToMany),
                    attributes: BTreeMap::new(),
                    deprecates: Vec::new(),
                },
            ],
            created_at: now(),
        }
    }

    fn assertion(uid: &str, text: &str) -> Assertion {
        Assertion {
            uid: AssertionUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            text: text.to_string(),
            source_claim_uids: Vec::new(),
            value: AssertionValue {
                belief: 0.9,
                plausibility: 0.95,
                uncertainty: 0.05,
                conflict_degree: 0.0,
                source_count: 1,
                has_conflict: false,
            },
            conflicts: Vec::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    struct StubLlm {
        response: serde_json::Value,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(
            &self,
            _request: &LlmInvocationRequest,
            _budget: BudgetContext,
        ) -> Result<Result<String, DegradedOutput>, LlmError> {
            Ok(Ok(String::new()))
        }

        async fn invoke_structured(
            &self,
            _request: &LlmInvocationRequest,
            _schema: &serde_json::Value,
            _budget: BudgetContext,
        ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
            Ok(Ok(self.response.clone()))
        }

        async fn embed(
            &self,
            _text: &str,
            _budget: BudgetContext,
        ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
            Ok(Ok(vec![0.0]))
        }
    }

    #[tokio::test]
    async fn build_graph_upserts_entities_and_relations_and_records_an_action() {
        let llm = StubLlm {
            response: serde_json::json!({
                "entities": [
                    {"entity_type": "person", "canonical_name": "Alice"},
                    {"entity_type": "person", "canonical_name": "Bob"}
                ],
                "relations": [
                    {"relation_type": "met_with", "subject_name": "Alice", "object_name": "Bob"}
                ],
                "events": []
            }),
        };
        let result = build_graph(
            &llm,
            &test_ontology(),
            &CaseUid::new("case_1"),
            &[assertion("assert_1", "Alice met with Bob yesterday.")],
            budget(),
            now(),
        )
        .await;
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.relations.len(), 1);
        assert_eq!(result.action.operation, "kg.build");
        assert!(result.problems.is_empty());
    }

    #[tokio::test]
    async fn build_graph_drops_entities_of_unknown_type() {
        let llm = StubLlm {
            response: serde_json::json!({
                "entities": [{"entity_type": "spaceship", "canonical_name": "Enterprise"}],
                "relations": [],
                "events": []
            }),
        };
        let result = build_graph(
            &llm,
            &test_ontology(),
            &CaseUid::new("case_1"),
            &[assertion("assert_1", "The Enterprise departed.")],
            budget(),
            now(),
        )
        .await;
        assert!(result.entities.is_empty());
        assert_eq!(result.problems.len(), 1);
    }

    fn entity(uid: &str) -> Entity {
        Entity {
            uid: EntityUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            entity_type: "person".to_string(),
            canonical_name: uid.to_string(),
            aliases: Vec::new(),
            created_at: now(),
            updated_at: now(),
        }
    }

    fn relation(subject: &str, object: &str) -> RelationFact {
        RelationFact {
            uid: RelationFactUid::mint(),
            case_uid: CaseUid::new("case_1"),
            relation_type: "met_with".to_string(),
            subject_entity_uid: EntityUid::new(subject),
            object_entity_uid: EntityUid::new(object),
            assertion_uids: vec![AssertionUid::new("assert_1")],
            created_at: now(),
        }
    }

    #[test]
    fn degree_centrality_counts_distinct_neighbors() {
        let entities = vec![entity("ent_1"), entity("ent_2"), entity("ent_3")];
        let relations = vec![relation("ent_1", "ent_2"), relation("ent_1", "ent_3")];
        let degrees = degree_centrality(&entities, &relations);
        assert_eq!(degrees[&EntityUid::new("ent_1")], 2.0);
        assert_eq!(degrees[&EntityUid::new("ent_2")], 1.0);
    }

    #[test]
    fn pagerank_sums_to_approximately_one() {
        let entities = vec![entity("ent_1"), entity("ent_2"), entity("ent_3")];
        let relations = vec![relation("ent_1", "ent_2"), relation("ent_2", "ent_3"), relation("ent_3", "ent_1")];
        let ranks = pagerank(&entities, &relations, 0.85, 50);
        let total: f64 = ranks.values().sum();
        assert!((total - 1.0).abs() < 1e-6, "total was {total}");
    }

    #[test]
    fn betweenness_centrality_is_highest_for_a_bridge_node() {
        let entities = vec![entity("ent_1"), entity("ent_2"), entity("ent_3")];
        let relations = vec![relation("ent_1", "ent_2"), relation("ent_2", "ent_3")];
        let centrality = betweenness_centrality(&entities, &relations);
        assert!(centrality[&EntityUid::new("ent_2")] > centrality[&EntityUid::new("ent_1")]);
    }

    #[test]
    fn label_propagation_separates_disconnected_components() {
        let entities = vec![entity("ent_1"), entity("ent_2"), entity("ent_3"), entity("ent_4")];
        let relations = vec![relation("ent_1", "ent_2"), relation("ent_3", "ent_4")];
        let labels = label_propagation_communities(&entities, &relations, 10);
        assert_eq!(labels[&EntityUid::new("ent_1")], labels[&EntityUid::new("ent_2")]);
        assert_eq!(labels[&EntityUid::new("ent_3")], labels[&EntityUid::new("ent_4")]);
        assert_ne!(labels[&EntityUid::new("ent_1")], labels[&EntityUid::new("ent_3")]);
    }

    #[test]
    fn multi_hop_paths_finds_the_two_hop_route() {
        let entities = vec![entity("ent_1"), entity("ent_2"), entity("ent_3")];
        let relations = vec![relation("ent_1", "ent_2"), relation("ent_2", "ent_3")];
        let paths = multi_hop_paths(&entities, &relations, &EntityUid::new("ent_1"), &EntityUid::new("ent_3"), 3);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 3);
    }

    #[test]
    fn gap_report_flags_an_isolated_entity() {
        let entities = vec![entity("ent_1"), entity("ent_2"), entity("ent_3")];
        let relations = vec![relation("ent_1", "ent_2")];
        let report = gap_report(&entities, &relations);
        assert_eq!(report.isolated_entity_uids, vec![EntityUid::new("ent_3")]);
        assert_eq!(report.component_sizes, vec![2, 1]);
    }
}
