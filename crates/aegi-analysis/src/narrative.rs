// aegi-analysis/src/narrative.rs
// ============================================================================
// Module: Narrative Builder and Coordination Detector
// Description: Greedy time-windowed clustering of source claims into
//              narratives, plus a coordination-signal detector over the
//              resulting clusters.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! Claims are sorted by `created_at` and each joins the first existing
//! cluster whose representative falls within `time_window_hours` and whose
//! similarity meets the active threshold, else starts a new cluster.
//! Similarity prefers cosine over supplied embeddings (raising the
//! effective threshold to at least 0.6) and falls back to token overlap
//! when no embeddings are supplied.

use std::collections::BTreeMap;

use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::ids::CaseUid;
use aegi_core::ids::NarrativeUid;
use aegi_core::ids::SourceClaimUid;
use aegi_core::model::Narrative;
use aegi_core::model::SourceClaim;
use aegi_core::time::Timestamp;

/// Tunable parameters for narrative clustering.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeConfig {
    /// Maximum hours between a claim and its cluster's representative.
    pub time_window_hours: f64,
    /// Minimum similarity for a claim to join an existing cluster.
    pub similarity_threshold: f64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self { time_window_hours: 24.0, similarity_threshold: 0.45 }
    }
}

/// Cosine similarity of two equal-length embeddings. Returns 0.0 for a
/// zero-magnitude vector rather than dividing by zero.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (mag_a * mag_b))
}

/// Token-overlap (Jaccard) similarity fallback used when no embeddings are
/// supplied for a claim pair.
#[must_use]
pub fn token_overlap_similarity(a: &str, b: &str) -> f64 {
    let tokens_a: std::collections::BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: std::collections::BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.union(&tokens_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

struct Cluster {
    narrative_uid: NarrativeUid,
    representative_idx: usize,
    member_indices: Vec<usize>,
}

/// Builds narratives from a set of source claims via greedy time-windowed
/// clustering. `embeddings`, when present, maps a claim UID to its
/// precomputed embedding; claims without an entry fall back to
/// token-overlap similarity against the cluster representative's text.
#[must_use]
pub fn build_narratives(
    case_uid: &CaseUid,
    claims: &[SourceClaim],
    embeddings: &BTreeMap<SourceClaimUid, Vec<f32>>,
    config: NarrativeConfig,
    now: Timestamp,
) -> Vec<Narrative> {
    let mut ordered: Vec<usize> = (0..claims.len()).collect();
    ordered.sort_by_key(|&idx| claims[idx].created_at);

    let mut clusters: Vec<Cluster> = Vec::new();

    for &idx in &ordered {
        let claim = &claims[idx];
        let mut joined = None;
        for cluster in &mut clusters {
            let representative = &claims[cluster.representative_idx];
            let within_window =
                (claim.created_at.hours_since(representative.created_at)).abs() <= config.time_window_hours;
            if !within_window {
                continue;
            }
            let (similarity, effective_threshold) = similarity_for(
                claim,
                representative,
                embeddings,
                config.similarity_threshold,
            );
            if similarity >= effective_threshold {
                cluster.member_indices.push(idx);
                joined = Some(());
                break;
            }
        }
        if joined.is_none() {
            clusters.push(Cluster {
                narrative_uid: NarrativeUid::mint(),
                representative_idx: idx,
                member_indices: vec![idx],
            });
        }
    }

    clusters
        .into_iter()
        .map(|cluster| {
            let window_start = cluster
                .member_indices
                .iter()
                .map(|&idx| claims[idx].created_at)
                .min()
                .unwrap_or(now);
            let window_end = cluster
                .member_indices
                .iter()
                .map(|&idx| claims[idx].created_at)
                .max()
                .unwrap_or(now);
            Narrative {
                uid: cluster.narrative_uid,
                case_uid: case_uid.clone(),
                label: claims[cluster.representative_idx].text.chars().take(48).collect(),
                source_claim_uids: cluster.member_indices.iter().map(|&idx| claims[idx].uid.clone()).collect(),
                window_start,
                window_end,
                coordination_score: None,
                coordination_rationale: Vec::new(),
                created_at: now,
            }
        })
        .collect()
}

/// Fetches an embedding per claim through the LLM capability before
/// delegating to [`build_narratives`]'s deterministic clustering path. A
/// claim whose embedding call fails or degrades is clustered by token
/// overlap instead, exactly as if it were absent from the embeddings map.
pub async fn build_with_embedding_client(
    llm: &dyn LlmClient,
    case_uid: &CaseUid,
    claims: &[SourceClaim],
    config: NarrativeConfig,
    budget: BudgetContext,
    now: Timestamp,
) -> Vec<Narrative> {
    let mut embeddings = BTreeMap::new();
    for claim in claims {
        if let Ok(Ok(embedding)) = llm.embed(&claim.text, budget).await {
            embeddings.insert(claim.uid.clone(), embedding);
        }
    }
    build_narratives(case_uid, claims, &embeddings, config, now)
}

fn similarity_for(
    claim: &SourceClaim,
    representative: &SourceClaim,
    embeddings: &BTreeMap<SourceClaimUid, Vec<f32>>,
    base_threshold: f64,
) -> (f64, f64) {
    match (embeddings.get(&claim.uid), embeddings.get(&representative.uid)) {
        (Some(a), Some(b)) => (cosine_similarity(a, b), base_threshold.max(0.6)),
        _ => (token_overlap_similarity(&claim.text, &representative.text), base_threshold),
    }
}

/// Returns the time-ordered chain of claims that built a narrative. By
/// construction every UID in a narrative's `source_claim_uids` resolves to
/// a leaf source claim, so this always succeeds for UIDs drawn from
/// `narrative.source_claim_uids`.
#[must_use]
pub fn trace_narrative<'a>(
    narrative: &Narrative,
    claims_by_uid: &BTreeMap<&'a SourceClaimUid, &'a SourceClaim>,
) -> Vec<&'a SourceClaim> {
    let mut chain: Vec<&SourceClaim> = narrative
        .source_claim_uids
        .iter()
        .filter_map(|uid| claims_by_uid.get(uid).copied())
        .collect();
    chain.sort_by_key(|claim| claim.created_at);
    chain
}

// ============================================================================
// SECTION: Coordination Detector
// ============================================================================

/// Tunable parameters for coordination detection.
#[derive(Debug, Clone, Copy)]
pub struct CoordinationConfig {
    /// Minimum cluster size considered for coordination analysis.
    pub min_cluster_size: usize,
    /// Window, from the earliest claim, counted for the burst ratio.
    pub burst_window_hours: f64,
    /// Minimum mean similarity for a signal to fire at all.
    pub similarity_threshold: f64,
    /// Minimum confidence for a signal to be treated as non-low-confidence.
    pub confidence_threshold: f64,
}

impl Default for CoordinationConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            burst_window_hours: 2.0,
            similarity_threshold: 0.5,
            confidence_threshold: 0.6,
        }
    }
}

/// A detected (or suppressed-as-low-confidence) coordination signal over one
/// narrative cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinationSignal {
    /// Narrative this signal was computed over.
    pub narrative_uid: NarrativeUid,
    /// Mean pairwise similarity across the cluster.
    pub similarity: f64,
    /// Share of claims falling inside the burst window from the earliest.
    pub burst_ratio: f64,
    /// `(similarity + burst_ratio) / 2`.
    pub confidence: f64,
    /// Whether `confidence` fell below `confidence_threshold`.
    pub low_confidence: bool,
    /// Present only when `low_confidence`: explains why natural
    /// propagation cannot be ruled out.
    pub false_positive_explanation: Option<String>,
    /// Source claims behind this signal's cluster.
    pub source_claim_uids: Vec<SourceClaimUid>,
}

/// Detects coordination signals over a set of narratives and their claims.
/// Narratives smaller than `min_cluster_size` produce no signal.
#[must_use]
pub fn detect_coordination(
    narratives: &[Narrative],
    claims_by_uid: &BTreeMap<&SourceClaimUid, &SourceClaim>,
    embeddings: &BTreeMap<SourceClaimUid, Vec<f32>>,
    config: CoordinationConfig,
) -> Vec<CoordinationSignal> {
    narratives
        .iter()
        .filter(|narrative| narrative.source_claim_uids.len() >= config.min_cluster_size)
        .filter_map(|narrative| coordination_signal_for(narrative, claims_by_uid, embeddings, config))
        .collect()
}

fn coordination_signal_for(
    narrative: &Narrative,
    claims_by_uid: &BTreeMap<&SourceClaimUid, &SourceClaim>,
    embeddings: &BTreeMap<SourceClaimUid, Vec<f32>>,
    config: CoordinationConfig,
) -> Option<CoordinationSignal> {
    let members: Vec<&SourceClaim> = narrative
        .source_claim_uids
        .iter()
        .filter_map(|uid| claims_by_uid.get(uid).copied())
        .collect();
    if members.len() < 2 {
        return None;
    }

    let mut pair_count = 0usize;
    let mut similarity_sum = 0.0_f64;
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let similarity = match (embeddings.get(&members[i].uid), embeddings.get(&members[j].uid)) {
                (Some(a), Some(b)) => cosine_similarity(a, b),
                _ => token_overlap_similarity(&members[i].text, &members[j].text),
            };
            similarity_sum += similarity;
            pair_count += 1;
        }
    }
    let mean_similarity = if pair_count == 0 { 0.0 } else { similarity_sum / pair_count as f64 };
    if mean_similarity < config.similarity_threshold {
        return None;
    }

    let earliest = members.iter().map(|c| c.created_at).min()?;
    let burst_count = members
        .iter()
        .filter(|c| c.created_at.hours_since(earliest) <= config.burst_window_hours)
        .count();
    let burst_ratio = burst_count as f64 / members.len() as f64;

    let confidence = (mean_similarity + burst_ratio) / 2.0;
    let low_confidence = confidence < config.confidence_threshold;
    let false_positive_explanation = low_confidence.then(|| {
        format!(
            "similarity={mean_similarity:.3}, burst_ratio={burst_ratio:.3}; natural propagation cannot be ruled out"
        )
    });

    Some(CoordinationSignal {
        narrative_uid: narrative.uid.clone(),
        similarity: mean_similarity,
        burst_ratio,
        confidence,
        low_confidence,
        false_positive_explanation,
        source_claim_uids: narrative.source_claim_uids.clone(),
    })
}
