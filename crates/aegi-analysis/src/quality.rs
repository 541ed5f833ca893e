// aegi-analysis/src/quality.rs
// ============================================================================
// Module: Quality Gate, Bias Detectors, Blindspot Detectors, Analysis Memory
// Description: Case-level health scoring, bias flags, coverage/timeline
//              gap detection, and LLM-backed scenario memory with vector
//              recall.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! [`assess_quality`] scans a case's already-loaded entities, relations,
//! assertions, hypotheses, and evidence assessments into one
//! [`QualityReport`], flagging the three alert conditions named in §4.10.
//! [`detect_bias`] and [`source_homogeneity`] look for skewed sourcing;
//! [`missing_assertion_blindspots`], [`temporal_spread_blindspot`], and
//! [`periodic_gap_blindspots`] look for coverage gaps. [`record_scenario`]
//! and [`recall_scenarios`] are the analysis-memory read/write path, backed
//! by [`VectorStore`] the same way narrative clustering and subscription
//! matching are (§4.5, §4.13).
//!
//! The data model has no `attributed_to`/source-identity field on
//! [`SourceClaim`] itself (its only link to a source is `chunk_uid`, which
//! traces to an artifact). Callers here supply that mapping explicitly as
//! [`ClaimProvenance`], the same way narrative clustering takes its
//! embeddings as a caller-supplied map rather than a model field.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::LlmInvocationRequest;
use aegi_core::VectorStore;
use aegi_core::interfaces::VectorMatch;
use aegi_core::interfaces::VectorStoreError;
use aegi_core::ids::AnalysisMemoryUid;
use aegi_core::ids::AssertionUid;
use aegi_core::ids::CaseUid;
use aegi_core::ids::HypothesisUid;
use aegi_core::ids::SourceClaimUid;
use aegi_core::model::AnalysisMemoryRecord;
use aegi_core::model::Assertion;
use aegi_core::model::Entity;
use aegi_core::model::EntityIdentityAction;
use aegi_core::model::EntityIdentityActionStatus;
use aegi_core::model::EvidenceAssessment;
use aegi_core::model::EvidenceRelation;
use aegi_core::model::Hypothesis;
use aegi_core::model::RelationFact;
use aegi_core::model::SourceClaim;
use aegi_core::time::Timestamp;

/// Evidence coverage over hypotheses below this fraction raises an alert.
pub const EVIDENCE_COVERAGE_ALERT_THRESHOLD: f64 = 0.5;
/// More than this many unresolved conflicts raises an alert.
pub const UNRESOLVED_CONFLICT_ALERT_THRESHOLD: usize = 3;
/// Average diagnosticity below this raises an alert.
pub const DIAGNOSTICITY_ALERT_THRESHOLD: f64 = 1.5;
/// Below this fraction of unique sources among enough claims is homogeneous.
pub const SOURCE_HOMOGENEITY_FRACTION_THRESHOLD: f64 = 0.3;
/// Minimum claim count before source homogeneity is even evaluated.
pub const SOURCE_HOMOGENEITY_MIN_CLAIMS: usize = 3;

/// A quality alert raised by [`assess_quality`].
#[derive(Debug, Clone, PartialEq)]
pub enum QualityAlert {
    /// Evidence coverage over hypotheses fell below the threshold.
    LowEvidenceCoverage { coverage: f64 },
    /// More unresolved conflicts than the threshold allows.
    TooManyUnresolvedConflicts { count: usize },
    /// Average diagnosticity across assessed hypotheses is too low to
    /// discriminate between them.
    LowDiagnosticity { average: f64 },
}

/// Case-level health scan result (§4.10).
#[derive(Debug, Clone, PartialEq)]
pub struct QualityReport {
    /// Fraction of entities with no pending identity-resolution action.
    pub entity_resolution_rate: f64,
    /// Fraction of entities that participate in at least one relation.
    pub relation_coverage: f64,
    /// Count of assertions still flagged with an unresolved conflict.
    pub unresolved_conflict_count: usize,
    /// Fraction of hypotheses with at least one evidence assessment.
    pub evidence_coverage: f64,
    /// Mean diagnosticity across the supplied per-hypothesis scores.
    pub average_diagnosticity: f64,
    /// Historical accuracy recalled from analysis memory, if any pattern
    /// match exists.
    pub historical_accuracy: Option<f64>,
    /// Mean age, in hours, of the case's source claims as of `now`.
    pub average_evidence_age_hours: f64,
    /// Alerts raised by this scan.
    pub alerts: Vec<QualityAlert>,
}

fn fraction(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Scans a case's already-loaded state into one [`QualityReport`].
/// `diagnosticity_scores` is the caller-aggregated per-hypothesis
/// diagnosticity (see [`crate::ach::diagnosticity`]); an empty map yields
/// an average of 0.0, which correctly raises the low-diagnosticity alert
/// since no assessed evidence is itself a gap worth flagging.
#[must_use]
pub fn assess_quality(
    entities: &[Entity],
    pending_entity_actions: &[EntityIdentityAction],
    relations: &[RelationFact],
    assertions: &[Assertion],
    hypotheses: &[Hypothesis],
    assessments: &[EvidenceAssessment],
    diagnosticity_scores: &BTreeMap<HypothesisUid, f64>,
    historical_accuracy: Option<f64>,
    source_claims: &[SourceClaim],
    now: Timestamp,
) -> QualityReport {
    let pending_entity_uids: BTreeSet<_> = pending_entity_actions
        .iter()
        .filter(|action| action.status == EntityIdentityActionStatus::Pending)
        .flat_map(|action| action.entity_uids.iter().cloned())
        .collect();
    let unresolved_entities =
        entities.iter().filter(|entity| pending_entity_uids.contains(&entity.uid)).count();
    let entity_resolution_rate = fraction(entities.len() - unresolved_entities, entities.len());

    let connected_entity_uids: BTreeSet<_> = relations
        .iter()
        .flat_map(|relation| [relation.subject_entity_uid.clone(), relation.object_entity_uid.clone()])
        .collect();
    let connected_count =
        entities.iter().filter(|entity| connected_entity_uids.contains(&entity.uid)).count();
    let relation_coverage = fraction(connected_count, entities.len());

    let unresolved_conflict_count = assertions.iter().filter(|a| a.value.has_conflict).count();

    let assessed_hypothesis_uids: BTreeSet<_> =
        assessments.iter().map(|a| a.hypothesis_uid.clone()).collect();
    let assessed_count =
        hypotheses.iter().filter(|h| assessed_hypothesis_uids.contains(&h.uid)).count();
    let evidence_coverage = fraction(assessed_count, hypotheses.len());

    let average_diagnosticity = if diagnosticity_scores.is_empty() {
        0.0
    } else {
        diagnosticity_scores.values().sum::<f64>() / diagnosticity_scores.len() as f64
    };

    let average_evidence_age_hours = if source_claims.is_empty() {
        0.0
    } else {
        source_claims.iter().map(|claim| now.hours_since(claim.created_at)).sum::<f64>()
            / source_claims.len() as f64
    };

    let mut alerts = Vec::new();
    if evidence_coverage < EVIDENCE_COVERAGE_ALERT_THRESHOLD {
        alerts.push(QualityAlert::LowEvidenceCoverage { coverage: evidence_coverage });
    }
    if unresolved_conflict_count > UNRESOLVED_CONFLICT_ALERT_THRESHOLD {
        alerts.push(QualityAlert::TooManyUnresolvedConflicts { count: unresolved_conflict_count });
    }
    if average_diagnosticity < DIAGNOSTICITY_ALERT_THRESHOLD {
        alerts.push(QualityAlert::LowDiagnosticity { average: average_diagnosticity });
    }

    QualityReport {
        entity_resolution_rate,
        relation_coverage,
        unresolved_conflict_count,
        evidence_coverage,
        average_diagnosticity,
        historical_accuracy,
        average_evidence_age_hours,
        alerts,
    }
}

/// Where a source claim came from, supplied by the caller since the model
/// itself only links a claim to its chunk, not a source identity.
#[derive(Debug, Clone)]
pub struct ClaimProvenance {
    /// The claim this provenance describes.
    pub source_claim_uid: SourceClaimUid,
    /// Stable identifier of the originating source (e.g. a canonical URL).
    pub source_id: String,
    /// Named speaker, outlet, or byline the claim is attributed to, if known.
    pub attributed_to: Option<String>,
}

/// A detected analytical bias in how a hypothesis is being supported.
#[derive(Debug, Clone, PartialEq)]
pub enum BiasFlag {
    /// Every claim supporting a hypothesis traces to the same source.
    SingleSourceDependency { hypothesis_uid: HypothesisUid, source_id: String },
    /// Every claim supporting a hypothesis shares the same attribution.
    SingleStanceBias { hypothesis_uid: HypothesisUid, attributed_to: String },
    /// A hypothesis has only ever been assessed as supported, never tested.
    ConfirmationBias { hypothesis_uid: HypothesisUid },
    /// Fewer than 30% unique sources among at least 3 claims case-wide.
    SourceHomogeneity { unique_fraction: f64, claim_count: usize },
}

fn supporting_claim_provenance<'a>(
    hypothesis: &Hypothesis,
    assertions_by_uid: &BTreeMap<&AssertionUid, &Assertion>,
    provenance_by_claim: &'a BTreeMap<SourceClaimUid, ClaimProvenance>,
) -> Vec<&'a ClaimProvenance> {
    hypothesis
        .supporting_assertion_uids
        .iter()
        .filter_map(|uid| assertions_by_uid.get(uid).copied())
        .flat_map(|assertion| assertion.source_claim_uids.iter())
        .filter_map(|claim_uid| provenance_by_claim.get(claim_uid))
        .collect()
}

/// Runs the single-source-dependency, single-stance-bias, and
/// confirmation-bias detectors over every hypothesis.
#[must_use]
pub fn detect_bias(
    hypotheses: &[Hypothesis],
    assertions: &[Assertion],
    assessments: &[EvidenceAssessment],
    provenance_by_claim: &BTreeMap<SourceClaimUid, ClaimProvenance>,
) -> Vec<BiasFlag> {
    let assertions_by_uid: BTreeMap<&AssertionUid, &Assertion> =
        assertions.iter().map(|a| (&a.uid, a)).collect();

    let mut flags = Vec::new();
    for hypothesis in hypotheses {
        let provenance = supporting_claim_provenance(hypothesis, &assertions_by_uid, provenance_by_claim);
        if !provenance.is_empty() {
            let source_ids: BTreeSet<&str> =
                provenance.iter().map(|p| p.source_id.as_str()).collect();
            if source_ids.len() == 1 {
                flags.push(BiasFlag::SingleSourceDependency {
                    hypothesis_uid: hypothesis.uid.clone(),
                    source_id: source_ids.into_iter().next().expect("one element").to_string(),
                });
            }

            let attributions: BTreeSet<&str> =
                provenance.iter().filter_map(|p| p.attributed_to.as_deref()).collect();
            if provenance.len() > 1 && attributions.len() == 1 {
                flags.push(BiasFlag::SingleStanceBias {
                    hypothesis_uid: hypothesis.uid.clone(),
                    attributed_to: attributions.into_iter().next().expect("one element").to_string(),
                });
            }
        }

        let hypothesis_assessments: Vec<&EvidenceAssessment> =
            assessments.iter().filter(|a| a.hypothesis_uid == hypothesis.uid).collect();
        if !hypothesis_assessments.is_empty()
            && hypothesis_assessments.iter().all(|a| a.relation == EvidenceRelation::Support)
        {
            flags.push(BiasFlag::ConfirmationBias { hypothesis_uid: hypothesis.uid.clone() });
        }
    }
    flags
}

/// Case-wide source homogeneity check: fewer than
/// [`SOURCE_HOMOGENEITY_FRACTION_THRESHOLD`] unique sources among at least
/// [`SOURCE_HOMOGENEITY_MIN_CLAIMS`] claims.
#[must_use]
pub fn source_homogeneity(provenance: &[ClaimProvenance]) -> Option<BiasFlag> {
    if provenance.len() < SOURCE_HOMOGENEITY_MIN_CLAIMS {
        return None;
    }
    let unique = provenance.iter().map(|p| p.source_id.as_str()).collect::<BTreeSet<_>>().len();
    let unique_fraction = unique as f64 / provenance.len() as f64;
    (unique_fraction < SOURCE_HOMOGENEITY_FRACTION_THRESHOLD)
        .then_some(BiasFlag::SourceHomogeneity { unique_fraction, claim_count: provenance.len() })
}

/// Severity of a detected blindspot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlindspotSeverity {
    Low,
    Medium,
    High,
}

/// Kind of coverage gap a blindspot detector found.
#[derive(Debug, Clone, PartialEq)]
pub enum BlindspotKind {
    /// A hypothesis cites an assertion that is not in the case's known set.
    MissingAssertion { hypothesis_uid: HypothesisUid, assertion_uid: AssertionUid },
    /// The case's evidence spans too narrow a window to support a timeline.
    NarrowTemporalSpread { span_hours: f64 },
    /// A gap in the timeline lines up with an expected reporting interval.
    PeriodicGap { gap_hours: f64, expected_interval_hours: f64 },
}

/// A detected coverage gap.
#[derive(Debug, Clone, PartialEq)]
pub struct Blindspot {
    /// What kind of gap this is.
    pub kind: BlindspotKind,
    /// How seriously an analyst should weigh this gap.
    pub severity: BlindspotSeverity,
    /// Human-readable description.
    pub description: String,
}

/// Flags hypotheses that cite an assertion not present in `known_assertion_uids`.
#[must_use]
pub fn missing_assertion_blindspots(
    hypotheses: &[Hypothesis],
    known_assertion_uids: &BTreeSet<AssertionUid>,
) -> Vec<Blindspot> {
    hypotheses
        .iter()
        .flat_map(|hypothesis| {
            hypothesis.supporting_assertion_uids.iter().filter_map(move |assertion_uid| {
                (!known_assertion_uids.contains(assertion_uid)).then(|| Blindspot {
                    kind: BlindspotKind::MissingAssertion {
                        hypothesis_uid: hypothesis.uid.clone(),
                        assertion_uid: assertion_uid.clone(),
                    },
                    severity: BlindspotSeverity::High,
                    description: format!(
                        "hypothesis {} cites assertion {assertion_uid} which is not in the case's known assertion set",
                        hypothesis.label
                    ),
                })
            })
        })
        .collect()
}

/// Flags a case whose evidence spans less than `min_span_hours`, too narrow
/// to support a confident timeline.
#[must_use]
pub fn temporal_spread_blindspot(assertions: &[Assertion], min_span_hours: f64) -> Option<Blindspot> {
    if assertions.len() < 2 {
        return None;
    }
    let earliest = assertions.iter().map(|a| a.created_at).min()?;
    let latest = assertions.iter().map(|a| a.created_at).max()?;
    let span_hours = latest.hours_since(earliest);
    (span_hours < min_span_hours).then(|| Blindspot {
        kind: BlindspotKind::NarrowTemporalSpread { span_hours },
        severity: BlindspotSeverity::Medium,
        description: format!(
            "evidence spans only {span_hours:.1}h, too narrow for a confident timeline"
        ),
    })
}

/// Flags timeline gaps that line up with an expected regular reporting
/// interval (e.g. a missed daily digest) as low severity, distinguishing
/// routine missing data from a substantive silence.
#[must_use]
pub fn periodic_gap_blindspots(
    timestamps: &[Timestamp],
    expected_interval_hours: f64,
) -> Vec<Blindspot> {
    if expected_interval_hours <= 0.0 || timestamps.len() < 2 {
        return Vec::new();
    }
    let mut sorted = timestamps.to_vec();
    sorted.sort();

    sorted
        .windows(2)
        .filter_map(|pair| {
            let gap_hours = pair[1].hours_since(pair[0]);
            let multiple = (gap_hours / expected_interval_hours).round();
            let deviation = (gap_hours - multiple * expected_interval_hours).abs();
            (multiple >= 2.0 && deviation < expected_interval_hours * 0.25).then(|| Blindspot {
                kind: BlindspotKind::PeriodicGap { gap_hours, expected_interval_hours },
                severity: BlindspotSeverity::Low,
                description: format!(
                    "a {gap_hours:.1}h gap matches the expected {expected_interval_hours:.1}h \
                     reporting interval, consistent with routine missing data"
                ),
            })
        })
        .collect()
}

const MEMORY_SYSTEM_PROMPT: &str = concat!(
    "Summarize this case's analytical scenario in one or two sentences and ",
    "give a short conclusion. Respond as plain text: a summary, then a ",
    "newline, then the conclusion."
);

/// Records one analysis scenario: asks the LLM for a short summary and
/// conclusion, embeds the combined text, and upserts it into `vector_store`
/// keyed by the memory's UID. Returns the persisted-shape record for the
/// caller to store; `conclusion` falls back to the scenario text itself
/// when the LLM path degrades, rather than leaving it blank.
///
/// # Errors
///
/// Returns [`VectorStoreError`] when the embedding upsert fails.
pub async fn record_scenario(
    llm: &dyn LlmClient,
    vector_store: &dyn VectorStore,
    case_uid: &CaseUid,
    scenario: String,
    pattern_tags: Vec<String>,
    hypothesis_uids: Vec<HypothesisUid>,
    favored_hypothesis_uid: Option<HypothesisUid>,
    budget: BudgetContext,
    now: Timestamp,
) -> Result<AnalysisMemoryRecord, VectorStoreError> {
    let request = LlmInvocationRequest {
        system_prompt: MEMORY_SYSTEM_PROMPT.to_string(),
        user_prompt: scenario.clone(),
    };
    let conclusion = match llm.invoke(&request, budget).await {
        Ok(Ok(text)) => text.lines().last().unwrap_or(&scenario).to_string(),
        _ => scenario.clone(),
    };

    let uid = AnalysisMemoryUid::mint();
    let embedding_text = format!("{scenario} {conclusion} {}", pattern_tags.join(" "));
    let embedding = match llm.embed(&embedding_text, budget).await {
        Ok(Ok(vector)) => vector,
        _ => Vec::new(),
    };
    if !embedding.is_empty() {
        vector_store.upsert(uid.as_str(), &embedding).await?;
    }

    Ok(AnalysisMemoryRecord {
        uid,
        case_uid: case_uid.clone(),
        scenario,
        conclusion,
        pattern_tags,
        hypothesis_uids,
        favored_hypothesis_uid,
        historical_accuracy: None,
        lessons_learned: None,
        created_at: now,
    })
}

/// Recalls scenarios similar to `query`, returning up to `limit` matches by
/// cosine similarity over the embedding the query text produces.
///
/// # Errors
///
/// Returns [`VectorStoreError`] when embedding or the search fails.
pub async fn recall_scenarios(
    llm: &dyn LlmClient,
    vector_store: &dyn VectorStore,
    query: &str,
    limit: usize,
    budget: BudgetContext,
) -> Result<Vec<VectorMatch>, VectorStoreError> {
    let embedding = match llm.embed(query, budget).await {
        Ok(Ok(vector)) => vector,
        _ => return Ok(Vec::new()),
    };
    vector_store.search(&embedding, limit).await
}

/// Attaches a real-world outcome to a recorded scenario.
#[must_use]
pub fn update_outcome(
    mut record: AnalysisMemoryRecord,
    accuracy: f64,
    lessons_learned: String,
) -> AnalysisMemoryRecord {
    record.historical_accuracy = Some(accuracy.clamp(0.0, 1.0));
    record.lessons_learned = Some(lessons_learned);
    record
}

/// Aggregated accuracy statistics for one pattern tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternStats {
    /// How many scenarios carry this tag and have a recorded outcome.
    pub sample_count: usize,
    /// Mean historical accuracy among those scenarios.
    pub average_accuracy: f64,
}

/// Aggregates per-tag accuracy statistics over a set of recorded scenarios.
#[must_use]
pub fn pattern_statistics(records: &[AnalysisMemoryRecord]) -> BTreeMap<String, PatternStats> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for record in records {
        let Some(accuracy) = record.historical_accuracy else { continue };
        for tag in &record.pattern_tags {
            let entry = sums.entry(tag.clone()).or_insert((0.0, 0));
            entry.0 += accuracy;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(tag, (sum, count))| {
            (tag, PatternStats { sample_count: count, average_accuracy: sum / count as f64 })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::DegradedOutput;
    use aegi_core::DegradedReason;
    use aegi_core::LlmError;
    use aegi_core::ids::AssertionUid;
    use aegi_core::ids::EntityIdentityActionUid;
    use aegi_core::ids::EntityUid;
    use aegi_core::ids::EvidenceAssessmentUid;
    use aegi_core::model::AssertionValue;
    use aegi_core::model::EntityIdentityActionType;
    use async_trait::async_trait;
    use std::time::Duration;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(seconds).expect("valid"))
    }

    fn assertion(uid: &str, has_conflict: bool, claims: &[&str]) -> Assertion {
        Assertion {
            uid: AssertionUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            text: "text".to_string(),
            source_claim_uids: claims.iter().map(|s| SourceClaimUid::new(*s)).collect(),
            value: AssertionValue {
                belief: 0.7,
                plausibility: 0.8,
                uncertainty: 0.1,
                conflict_degree: 0.0,
                source_count: 1,
                has_conflict,
            },
            conflicts: Vec::new(),
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    fn hypothesis(uid: &str, supporting: &[&str]) -> Hypothesis {
        Hypothesis {
            uid: HypothesisUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            label: uid.to_string(),
            statement: "stmt".to_string(),
            prior: 0.5,
            posterior: 0.5,
            supporting_assertion_uids: supporting.iter().map(|s| AssertionUid::new(*s)).collect(),
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    #[test]
    fn quality_report_flags_low_coverage_and_high_conflict_count() {
        let assertions: Vec<Assertion> =
            (0..5).map(|i| assertion(&format!("a{i}"), true, &[])).collect();
        let hypotheses = vec![hypothesis("h1", &["a0"])];
        let report = assess_quality(
            &[],
            &[],
            &[],
            &assertions,
            &hypotheses,
            &[],
            &BTreeMap::new(),
            None,
            &[],
            ts(1000),
        );
        assert!(report.alerts.contains(&QualityAlert::LowEvidenceCoverage { coverage: 0.0 }));
        assert!(
            report.alerts.contains(&QualityAlert::TooManyUnresolvedConflicts { count: 5 })
        );
        assert_eq!(report.unresolved_conflict_count, 5);
    }

    #[test]
    fn entity_resolution_rate_excludes_pending_entities() {
        let entities = vec![
            Entity {
                uid: EntityUid::new("e1"),
                case_uid: CaseUid::new("case_1"),
                entity_type: "person".to_string(),
                canonical_name: "A".to_string(),
                aliases: Vec::new(),
                created_at: ts(0),
                updated_at: ts(0),
            },
            Entity {
                uid: EntityUid::new("e2"),
                case_uid: CaseUid::new("case_1"),
                entity_type: "person".to_string(),
                canonical_name: "B".to_string(),
                aliases: Vec::new(),
                created_at: ts(0),
                updated_at: ts(0),
            },
        ];
        let pending = vec![EntityIdentityAction {
            uid: EntityIdentityActionUid::mint(),
            case_uid: CaseUid::new("case_1"),
            action_type: EntityIdentityActionType::Merge,
            entity_uids: vec![EntityUid::new("e1")],
            confidence: 0.6,
            status: EntityIdentityActionStatus::Pending,
            created_at: ts(0),
        }];
        let report = assess_quality(
            &entities,
            &pending,
            &[],
            &[],
            &[],
            &[],
            &BTreeMap::new(),
            None,
            &[],
            ts(0),
        );
        assert!((report.entity_resolution_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_source_dependency_flag_fires_when_all_claims_share_a_source() {
        let hypotheses = vec![hypothesis("h1", &["a1"])];
        let assertions = vec![assertion("a1", false, &["sc1", "sc2"])];
        let mut provenance = BTreeMap::new();
        provenance.insert(
            SourceClaimUid::new("sc1"),
            ClaimProvenance {
                source_claim_uid: SourceClaimUid::new("sc1"),
                source_id: "outlet.example".to_string(),
                attributed_to: Some("staff writer".to_string()),
            },
        );
        provenance.insert(
            SourceClaimUid::new("sc2"),
            ClaimProvenance {
                source_claim_uid: SourceClaimUid::new("sc2"),
                source_id: "outlet.example".to_string(),
                attributed_to: Some("staff writer".to_string()),
            },
        );
        let flags = detect_bias(&hypotheses, &assertions, &[], &provenance);
        assert!(flags.iter().any(|f| matches!(f, BiasFlag::SingleSourceDependency { .. })));
        assert!(flags.iter().any(|f| matches!(f, BiasFlag::SingleStanceBias { .. })));
    }

    #[test]
    fn confirmation_bias_flag_fires_when_only_supporting_evidence_exists() {
        let hypotheses = vec![hypothesis("h1", &[])];
        let assessments = vec![EvidenceAssessment {
            uid: EvidenceAssessmentUid::mint(),
            hypothesis_uid: HypothesisUid::new("h1"),
            assertion_uid: AssertionUid::new("a1"),
            relation: EvidenceRelation::Support,
            likelihood: 0.8,
            created_at: ts(0),
        }];
        let flags = detect_bias(&hypotheses, &[], &assessments, &BTreeMap::new());
        assert_eq!(flags, vec![BiasFlag::ConfirmationBias { hypothesis_uid: HypothesisUid::new("h1") }]);
    }

    #[test]
    fn source_homogeneity_requires_minimum_claim_count() {
        let provenance = vec![
            ClaimProvenance {
                source_claim_uid: SourceClaimUid::new("sc1"),
                source_id: "a.example".to_string(),
                attributed_to: None,
            },
            ClaimProvenance {
                source_claim_uid: SourceClaimUid::new("sc2"),
                source_id: "a.example".to_string(),
                attributed_to: None,
            },
        ];
        assert_eq!(source_homogeneity(&provenance), None);
    }

    #[test]
    fn source_homogeneity_flags_low_unique_fraction_at_minimum_count() {
        let provenance: Vec<ClaimProvenance> = (0..4)
            .map(|i| ClaimProvenance {
                source_claim_uid: SourceClaimUid::new(&format!("sc{i}")),
                source_id: "a.example".to_string(),
                attributed_to: None,
            })
            .collect();
        let flag = source_homogeneity(&provenance);
        assert!(matches!(flag, Some(BiasFlag::SourceHomogeneity { .. })));
    }

    #[test]
    fn missing_assertion_blindspot_fires_for_dangling_citation() {
        let hypotheses = vec![hypothesis("h1", &["a_missing"])];
        let known: BTreeSet<AssertionUid> = BTreeSet::new();
        let blindspots = missing_assertion_blindspots(&hypotheses, &known);
        assert_eq!(blindspots.len(), 1);
        assert_eq!(blindspots[0].severity, BlindspotSeverity::High);
    }

    #[test]
    fn narrow_temporal_spread_is_flagged() {
        let assertions =
            vec![assertion("a1", false, &[]), assertion("a2", false, &[])];
        let blindspot = temporal_spread_blindspot(&assertions, 48.0);
        assert!(blindspot.is_some());
        assert_eq!(blindspot.expect("some").severity, BlindspotSeverity::Medium);
    }

    #[test]
    fn periodic_gap_is_low_severity() {
        let timestamps = vec![ts(0), ts(24 * 3600 * 2)];
        let blindspots = periodic_gap_blindspots(&timestamps, 24.0);
        assert_eq!(blindspots.len(), 1);
        assert_eq!(blindspots[0].severity, BlindspotSeverity::Low);
    }

    #[test]
    fn pattern_statistics_averages_by_tag() {
        let mut record_a = AnalysisMemoryRecord {
            uid: AnalysisMemoryUid::new("mem_1"),
            case_uid: CaseUid::new("case_1"),
            scenario: "scenario a".to_string(),
            conclusion: "conclusion a".to_string(),
            pattern_tags: vec!["coordinated_campaign".to_string()],
            hypothesis_uids: Vec::new(),
            favored_hypothesis_uid: None,
            historical_accuracy: Some(0.8),
            lessons_learned: None,
            created_at: ts(0),
        };
        let mut record_b = record_a.clone();
        record_b.uid = AnalysisMemoryUid::new("mem_2");
        record_b.historical_accuracy = Some(0.4);
        let stats = pattern_statistics(&[record_a.clone(), record_b.clone()]);
        let tag_stats = stats.get("coordinated_campaign").expect("present");
        assert_eq!(tag_stats.sample_count, 2);
        assert!((tag_stats.average_accuracy - 0.6).abs() < 1e-9);

        record_a.historical_accuracy = None;
        let stats_without_outcome = pattern_statistics(&[record_a, record_b]);
        assert_eq!(stats_without_outcome["coordinated_campaign"].sample_count, 1);
    }

    struct StubLlm {
        text: String,
        embedding: Vec<f32>,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(
            &self,
            _request: &LlmInvocationRequest,
            _budget: BudgetContext,
        ) -> Result<Result<String, DegradedOutput>, LlmError> {
            Ok(Ok(self.text.clone()))
        }

        async fn invoke_structured(
            &self,
            _request: &LlmInvocationRequest,
            _schema: &serde_json::Value,
            _budget: BudgetContext,
        ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
            Ok(Ok(serde_json::json!({})))
        }

        async fn embed(
            &self,
            _text: &str,
            _budget: BudgetContext,
        ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
            Ok(Ok(self.embedding.clone()))
        }
    }

    struct StubVectorStore;

    #[async_trait]
    impl VectorStore for StubVectorStore {
        async fn upsert(&self, _item_id: &str, _embedding: &[f32]) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn search(
            &self,
            _embedding: &[f32],
            _limit: usize,
        ) -> Result<Vec<VectorMatch>, VectorStoreError> {
            Ok(vec![VectorMatch { item_id: "mem_1".to_string(), score: 0.9 }])
        }
    }

    fn budget() -> BudgetContext {
        BudgetContext { deadline: Duration::from_secs(5), max_output_tokens: 128 }
    }

    #[tokio::test]
    async fn record_scenario_falls_back_to_scenario_text_on_degraded_llm() {
        struct DegradingLlm;
        #[async_trait]
        impl LlmClient for DegradingLlm {
            async fn invoke(
                &self,
                _request: &LlmInvocationRequest,
                _budget: BudgetContext,
            ) -> Result<Result<String, DegradedOutput>, LlmError> {
                Ok(Err(DegradedOutput { partial_text: None, reason: DegradedReason::ProviderUnavailable }))
            }

            async fn invoke_structured(
                &self,
                _request: &LlmInvocationRequest,
                _schema: &serde_json::Value,
                _budget: BudgetContext,
            ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
                Ok(Err(DegradedOutput { partial_text: None, reason: DegradedReason::ProviderUnavailable }))
            }

            async fn embed(
                &self,
                _text: &str,
                _budget: BudgetContext,
            ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
                Ok(Err(DegradedOutput { partial_text: None, reason: DegradedReason::ProviderUnavailable }))
            }
        }

        let record = record_scenario(
            &DegradingLlm,
            &StubVectorStore,
            &CaseUid::new("case_1"),
            "a coordinated messaging scenario".to_string(),
            vec!["coordinated_campaign".to_string()],
            Vec::new(),
            None,
            budget(),
            ts(0),
        )
        .await
        .expect("ok");
        assert_eq!(record.conclusion, "a coordinated messaging scenario");
    }

    #[tokio::test]
    async fn record_scenario_uses_llm_conclusion_and_embeds() {
        let llm = StubLlm { text: "summary\nlikely coordinated".to_string(), embedding: vec![0.1, 0.2] };
        let record = record_scenario(
            &llm,
            &StubVectorStore,
            &CaseUid::new("case_1"),
            "scenario text".to_string(),
            Vec::new(),
            Vec::new(),
            None,
            budget(),
            ts(0),
        )
        .await
        .expect("ok");
        assert_eq!(record.conclusion, "likely coordinated");
    }

    #[tokio::test]
    async fn recall_scenarios_returns_vector_matches() {
        let llm = StubLlm { text: String::new(), embedding: vec![0.1, 0.2] };
        let matches = recall_scenarios(&llm, &StubVectorStore, "query", 5, budget()).await.expect("ok");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].item_id, "mem_1");
    }

    #[test]
    fn update_outcome_clamps_accuracy() {
        let record = AnalysisMemoryRecord {
            uid: AnalysisMemoryUid::new("mem_1"),
            case_uid: CaseUid::new("case_1"),
            scenario: "scenario".to_string(),
            conclusion: "conclusion".to_string(),
            pattern_tags: Vec::new(),
            hypothesis_uids: Vec::new(),
            favored_hypothesis_uid: None,
            historical_accuracy: None,
            lessons_learned: None,
            created_at: ts(0),
        };
        let updated = update_outcome(record, 1.4, "overconfident".to_string());
        assert_eq!(updated.historical_accuracy, Some(1.0));
        assert_eq!(updated.lessons_learned, Some("overconfident".to_string()));
    }
}
