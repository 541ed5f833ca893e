// aegi-analysis/src/ach.rs
// ============================================================================
// Module: Bayesian ACH Engine
// Description: Analysis of Competing Hypotheses: prior initialization,
//              LLM-backed evidence assessment, Bayesian posterior updates,
//              diagnosticity, and manual override.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! A case's hypotheses carry a prior and posterior that always co-normalize
//! to 1.0 within `PRIOR_SUM_TOLERANCE`. [`assess_evidence`] issues one LLM
//! call per evidence/assertion, asking for a `(relation, strength)` pair per
//! hypothesis, mapped to a likelihood `P(E|H)` by [`relation_to_likelihood`].
//! [`apply_update`] folds one evidence's assessments into new posteriors via
//! Bayes' rule; [`recalculate`] replays a case's full assessment history
//! through the same function, guaranteeing the replay-equivalence invariant
//! by construction rather than by a separate code path.

use std::collections::BTreeMap;

use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::LlmInvocationRequest;
use aegi_core::ids::AssertionUid;
use aegi_core::ids::EvidenceAssessmentUid;
use aegi_core::ids::HypothesisUid;
use aegi_core::ids::ProbabilityUpdateUid;
use aegi_core::model::Assertion;
use aegi_core::model::EvidenceAssessment;
use aegi_core::model::EvidenceRelation;
use aegi_core::model::Hypothesis;
use aegi_core::model::ProbabilityUpdate;
use aegi_core::time::Timestamp;
use serde::Deserialize;
use thiserror::Error;

/// Maximum allowed deviation of a user-supplied prior map from summing to 1.0.
pub const PRIOR_SUM_TOLERANCE: f64 = 0.01;
/// Floor applied to `P(E)` before dividing, to avoid a zero-probability update.
pub const MARGINAL_EPSILON: f64 = 1e-10;
/// Clamp applied to every derived likelihood, keeping it strictly in `(0, 1)`.
const LIKELIHOOD_EPSILON: f64 = 1e-6;

/// Error initializing hypothesis priors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AchError {
    /// A user-supplied prior map did not sum to 1.0 within tolerance.
    #[error("user-supplied priors sum to {sum}, which deviates from 1.0 by more than {PRIOR_SUM_TOLERANCE}")]
    PriorsDoNotSumToOne {
        /// The sum that was rejected.
        sum: f64,
    },
}

/// A hypothesis awaiting prior assignment.
#[derive(Debug, Clone)]
pub struct HypothesisSeed {
    /// Short analyst-facing label, used to key a user-supplied prior map.
    pub label: String,
    /// Full statement of the hypothesis.
    pub statement: String,
    /// Assertions cited in support of this hypothesis at creation.
    pub supporting_assertion_uids: Vec<AssertionUid>,
}

/// Initializes priors for a fresh set of hypotheses. A uniform prior is
/// assigned unless `user_priors` (keyed by seed label) is supplied, in
/// which case it is used verbatim after validating it sums to 1.0 within
/// [`PRIOR_SUM_TOLERANCE`].
///
/// # Errors
///
/// Returns [`AchError::PriorsDoNotSumToOne`] when a supplied prior map
/// deviates from summing to 1.0 by more than the tolerance.
pub fn initialize_priors(
    case_uid: &aegi_core::ids::CaseUid,
    seeds: &[HypothesisSeed],
    user_priors: Option<&BTreeMap<String, f64>>,
    now: Timestamp,
) -> Result<Vec<Hypothesis>, AchError> {
    if seeds.is_empty() {
        return Ok(Vec::new());
    }

    let priors: Vec<f64> = if let Some(map) = user_priors {
        let values: Vec<f64> = seeds.iter().map(|seed| *map.get(&seed.label).unwrap_or(&0.0)).collect();
        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > PRIOR_SUM_TOLERANCE {
            return Err(AchError::PriorsDoNotSumToOne { sum });
        }
        values
    } else {
        let uniform = 1.0 / seeds.len() as f64;
        vec![uniform; seeds.len()]
    };

    Ok(seeds
        .iter()
        .zip(priors)
        .map(|(seed, prior)| Hypothesis {
            uid: HypothesisUid::mint(),
            case_uid: case_uid.clone(),
            label: seed.label.clone(),
            statement: seed.statement.clone(),
            prior,
            posterior: prior,
            supporting_assertion_uids: seed.supporting_assertion_uids.clone(),
            created_at: now,
            updated_at: now,
        })
        .collect())
}

/// Maps an evidence relation and its strength in `[0, 1]` to a likelihood
/// `P(E|H)`. `support(s) + contradict(s) = 1` by construction; `irrelevant`
/// always yields exactly 0.5 regardless of strength. The result is clamped
/// strictly inside `(0, 1)` so downstream division is always well-defined.
#[must_use]
pub fn relation_to_likelihood(relation: EvidenceRelation, strength: f64) -> f64 {
    let strength = strength.clamp(0.0, 1.0);
    let raw = match relation {
        EvidenceRelation::Support => 0.5 + 0.5 * strength,
        EvidenceRelation::Contradict => 0.5 - 0.5 * strength,
        EvidenceRelation::Irrelevant => 0.5,
    };
    raw.clamp(LIKELIHOOD_EPSILON, 1.0 - LIKELIHOOD_EPSILON)
}

const ASSESSMENT_SYSTEM_PROMPT: &str = concat!(
    "Given one piece of evidence and a numbered list of hypotheses, judge ",
    "how the evidence bears on each: support, contradict, or irrelevant, ",
    "with a strength in [0, 1]. Respond as JSON with one entry per ",
    "hypothesis label."
);

#[derive(Debug, Clone, Deserialize)]
struct RawAssessment {
    hypothesis_label: String,
    relation: EvidenceRelation,
    strength: f64,
}

#[derive(Debug, Clone, Deserialize, Default)]
struct RawAssessmentBatch {
    #[serde(default)]
    assessments: Vec<RawAssessment>,
}

fn assessment_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "assessments": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "hypothesis_label": {"type": "string"},
                        "relation": {"type": "string"},
                        "strength": {"type": "number"}
                    },
                    "required": ["hypothesis_label", "relation", "strength"]
                }
            }
        },
        "required": ["assessments"]
    })
}

/// Assesses one evidence/assertion against every hypothesis with a single
/// LLM call, producing up to one [`EvidenceAssessment`] per hypothesis.
/// Re-assessing the same `(hypothesis_uid, assertion_uid)` pair reuses the
/// matching row's UID from `existing` rather than minting a duplicate.
///
/// # Errors
///
/// Never returns an error: provider failure or an unparsable response
/// yields an empty assessment list and no rows change.
pub async fn assess_evidence(
    llm: &dyn LlmClient,
    hypotheses: &[Hypothesis],
    assertion: &Assertion,
    existing: &[EvidenceAssessment],
    budget: BudgetContext,
    now: Timestamp,
) -> Vec<EvidenceAssessment> {
    if hypotheses.is_empty() {
        return Vec::new();
    }

    let hypothesis_list =
        hypotheses.iter().map(|h| format!("- {} :: {}", h.label, h.statement)).collect::<Vec<_>>().join("\n");
    let request = LlmInvocationRequest {
        system_prompt: ASSESSMENT_SYSTEM_PROMPT.to_string(),
        user_prompt: format!("Evidence: {}\n\nHypotheses:\n{hypothesis_list}", assertion.text),
    };

    let Ok(Ok(value)) = llm.invoke_structured(&request, &assessment_schema(), budget).await else {
        return Vec::new();
    };
    let Ok(batch) = serde_json::from_value::<RawAssessmentBatch>(value) else {
        return Vec::new();
    };

    let by_label: BTreeMap<&str, &Hypothesis> = hypotheses.iter().map(|h| (h.label.as_str(), h)).collect();

    batch
        .assessments
        .into_iter()
        .filter_map(|raw| {
            let hypothesis = by_label.get(raw.hypothesis_label.as_str())?;
            let likelihood = relation_to_likelihood(raw.relation, raw.strength);
            let uid = existing
                .iter()
                .find(|a| a.hypothesis_uid == hypothesis.uid && a.assertion_uid == assertion.uid)
                .map(|a| a.uid.clone())
                .unwrap_or_else(EvidenceAssessmentUid::mint);
            Some(EvidenceAssessment {
                uid,
                hypothesis_uid: hypothesis.uid.clone(),
                assertion_uid: assertion.uid.clone(),
                relation: raw.relation,
                likelihood,
                created_at: now,
            })
        })
        .collect()
}

/// Which hypothesis moved the most under one [`apply_update`] call, and by
/// how much, for analyst-facing summaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BayesianUpdateOutcome {
    /// Updated hypotheses, same order as the input.
    pub hypotheses: Vec<Hypothesis>,
    /// Probability update log entries this call produced.
    pub updates: Vec<ProbabilityUpdate>,
    /// The hypothesis whose posterior moved furthest from its prior.
    pub most_affected_hypothesis_uid: Option<HypothesisUid>,
    /// `|posterior - prior|` for `most_affected_hypothesis_uid`.
    pub max_change: f64,
}

fn summarize_updates(hypotheses: Vec<Hypothesis>, updates: Vec<ProbabilityUpdate>) -> BayesianUpdateOutcome {
    let most_affected = updates
        .iter()
        .map(|u| (u.hypothesis_uid.clone(), (u.posterior - u.prior).abs()))
        .fold(None, |acc: Option<(HypothesisUid, f64)>, (uid, change)| match acc {
            Some((_, best)) if best >= change => acc,
            _ => Some((uid, change)),
        });
    BayesianUpdateOutcome {
        hypotheses,
        updates,
        most_affected_hypothesis_uid: most_affected.as_ref().map(|(uid, _)| uid.clone()),
        max_change: most_affected.map_or(0.0, |(_, change)| change),
    }
}

/// Applies one evidence's assessments to a set of hypotheses via Bayes'
/// rule, co-normalizing posteriors to sum to 1.0, then wraps the result with
/// [`summarize_updates`]. A hypothesis with no matching assessment in
/// `assessments` is treated as unassessed by this evidence (likelihood 0.5,
/// i.e. no information) rather than excluded.
#[must_use]
pub fn apply_update_summarized(
    hypotheses: &[Hypothesis],
    assessments: &[EvidenceAssessment],
    now: Timestamp,
) -> BayesianUpdateOutcome {
    let (updated, updates) = apply_update(hypotheses, assessments, now);
    summarize_updates(updated, updates)
}

/// Applies one evidence's assessments to a set of hypotheses via Bayes'
/// rule, co-normalizing posteriors to sum to 1.0. A hypothesis with no
/// matching assessment in `assessments` is treated as unassessed by this
/// evidence (likelihood 0.5, i.e. no information) rather than excluded.
///
/// Returns the updated hypotheses (same order as `hypotheses`) and the
/// [`ProbabilityUpdate`] log entries this call produced.
#[must_use]
pub fn apply_update(
    hypotheses: &[Hypothesis],
    assessments: &[EvidenceAssessment],
    now: Timestamp,
) -> (Vec<Hypothesis>, Vec<ProbabilityUpdate>) {
    if hypotheses.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let likelihood_for = |uid: &HypothesisUid| -> (f64, Option<EvidenceAssessmentUid>) {
        assessments
            .iter()
            .find(|a| &a.hypothesis_uid == uid)
            .map_or((0.5, None), |a| (a.likelihood, Some(a.uid.clone())))
    };

    let marginal: f64 = hypotheses
        .iter()
        .map(|h| {
            let (likelihood, _) = likelihood_for(&h.uid);
            likelihood * h.posterior
        })
        .sum::<f64>()
        .max(MARGINAL_EPSILON);

    let raw_posteriors: Vec<f64> = hypotheses
        .iter()
        .map(|h| {
            let (likelihood, _) = likelihood_for(&h.uid);
            likelihood * h.posterior / marginal
        })
        .collect();
    let total: f64 = raw_posteriors.iter().sum::<f64>().max(MARGINAL_EPSILON);

    let mut updated = Vec::with_capacity(hypotheses.len());
    let mut updates = Vec::with_capacity(hypotheses.len());
    for (hypothesis, raw_posterior) in hypotheses.iter().zip(raw_posteriors) {
        let posterior = raw_posterior / total;
        let (_, assessment_uid) = likelihood_for(&hypothesis.uid);
        updates.push(ProbabilityUpdate {
            uid: ProbabilityUpdateUid::mint(),
            hypothesis_uid: hypothesis.uid.clone(),
            prior: hypothesis.posterior,
            posterior,
            evidence_assessment_uids: assessment_uid.into_iter().collect(),
            created_at: now,
        });
        updated.push(Hypothesis { posterior, updated_at: now, ..hypothesis.clone() });
    }
    (updated, updates)
}

/// Replays a case's full evidence-assessment history, in order, from each
/// hypothesis's original prior. Because [`apply_update`] is a pure
/// function of its inputs, replaying the same ordered batches from the
/// same starting priors always yields the same posteriors as the
/// sequential path that produced them (the replay-equivalence invariant).
#[must_use]
pub fn recalculate(
    initial_hypotheses: &[Hypothesis],
    assessment_batches_in_order: &[Vec<EvidenceAssessment>],
    now: Timestamp,
) -> (Vec<Hypothesis>, Vec<ProbabilityUpdate>) {
    let mut current: Vec<Hypothesis> =
        initial_hypotheses.iter().map(|h| Hypothesis { posterior: h.prior, ..h.clone() }).collect();
    let mut all_updates = Vec::new();
    for batch in assessment_batches_in_order {
        let (next, updates) = apply_update(&current, batch, now);
        current = next;
        all_updates.extend(updates);
    }
    (current, all_updates)
}

/// Outcome of [`recalculate`] with the distinct evidence count folded into
/// the replay, for analyst-facing summaries alongside the posteriors.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalculateOutcome {
    /// Hypotheses after the full replay.
    pub hypotheses: Vec<Hypothesis>,
    /// Probability update log entries produced by the replay.
    pub updates: Vec<ProbabilityUpdate>,
    /// Count of distinct assertions (evidence) folded into the replay.
    pub evidence_count: usize,
}

/// Replays a case's full evidence-assessment history like [`recalculate`],
/// additionally reporting the distinct evidence (assertion) count folded
/// into the replay.
#[must_use]
pub fn recalculate_with_evidence_count(
    initial_hypotheses: &[Hypothesis],
    assessment_batches_in_order: &[Vec<EvidenceAssessment>],
    now: Timestamp,
) -> RecalculateOutcome {
    let (hypotheses, updates) = recalculate(initial_hypotheses, assessment_batches_in_order, now);
    let evidence_count = assessment_batches_in_order
        .iter()
        .flatten()
        .map(|a| a.assertion_uid.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .len();
    RecalculateOutcome { hypotheses, updates, evidence_count }
}

/// Diagnosticity of each hypothesis under one evidence's assessments:
/// `max_{j≠i} P(E|H_i)/P(E|H_j)`. Higher is more discriminating between
/// competing hypotheses; a hypothesis absent from `assessments` is treated
/// as likelihood 0.5, per [`apply_update`]'s convention.
#[must_use]
pub fn diagnosticity(
    hypotheses: &[Hypothesis],
    assessments: &[EvidenceAssessment],
) -> BTreeMap<HypothesisUid, f64> {
    let likelihoods: Vec<(HypothesisUid, f64)> = hypotheses
        .iter()
        .map(|h| {
            let likelihood =
                assessments.iter().find(|a| a.hypothesis_uid == h.uid).map_or(0.5, |a| a.likelihood);
            (h.uid.clone(), likelihood)
        })
        .collect();

    likelihoods
        .iter()
        .map(|(uid, likelihood_i)| {
            let max_ratio = likelihoods
                .iter()
                .filter(|(other_uid, _)| other_uid != uid)
                .map(|(_, likelihood_j)| likelihood_i / likelihood_j.max(LIKELIHOOD_EPSILON))
                .fold(0.0_f64, f64::max);
            (uid.clone(), max_ratio)
        })
        .collect()
}

/// Diagnosticity of every hypothesis under one evidence's assessments,
/// sorted descending by score, for analyst-facing ranking views.
#[must_use]
pub fn diagnosticity_ranking(
    hypotheses: &[Hypothesis],
    assessments: &[EvidenceAssessment],
) -> Vec<(HypothesisUid, f64)> {
    let mut ranked: Vec<(HypothesisUid, f64)> = diagnosticity(hypotheses, assessments).into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// Manually overrides a single evidence assessment row, leaving every other
/// row untouched. Callers MUST call [`recalculate`] afterward: this
/// function only mutates the assessment log, not any hypothesis's
/// posterior.
#[must_use]
pub fn override_assessment(
    mut assessments: Vec<EvidenceAssessment>,
    assessment_uid: &EvidenceAssessmentUid,
    relation: EvidenceRelation,
    strength: f64,
    now: Timestamp,
) -> Vec<EvidenceAssessment> {
    if let Some(existing) = assessments.iter_mut().find(|a| &a.uid == assessment_uid) {
        existing.relation = relation;
        existing.likelihood = relation_to_likelihood(relation, strength);
        existing.created_at = now;
    }
    assessments
}
