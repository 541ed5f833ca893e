// aegi-orchestrator/src/pipeline.rs
// ============================================================================
// Module: Pipeline DAG
// Description: Fixed 13-stage case analysis pipeline and the state it
//              accumulates into (§4.12).
// Purpose: Turn aegi-analysis's stateless functions into one ordered,
//          failure-isolated run over a case, emitting a domain event per
//          stage and folding every intermediate into one in-memory
//          CaseState a caller can snapshot or persist.
// Dependencies: aegi-core, aegi-analysis, aegi-bus, aegi-ontology
// ============================================================================

//! ## Overview
//! [`StageName`] lists the DAG in its fixed order. [`PipelineRunner::run`]
//! walks it once, calling [`should_skip`] before each stage and isolating
//! any error behind a [`StageResult`] rather than aborting the run — only
//! a small, explicit set of stages is allowed to actually halt it. State
//! lives in [`CaseState`], guarded by a `Mutex` rather than threaded
//! through every stage function's return type, since stages run strictly
//! in order (§5) and never hold the lock across an `.await`.

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use aegi_analysis::ach;
use aegi_analysis::causal;
use aegi_analysis::claims;
use aegi_analysis::fusion;
use aegi_analysis::graph;
use aegi_analysis::narrative;
use aegi_analysis::quality;
use aegi_analysis::reporting;
use aegi_bus::EventBus;
use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::grounding::grounding_gate;
use aegi_core::ids::CaseUid;
use aegi_core::ids::SourceClaimUid;
use aegi_core::interfaces::EvidenceStore;
use aegi_core::interfaces::GraphStore;
use aegi_core::interfaces::VectorStore;
use aegi_core::model::AegiEvent;
use aegi_core::model::AnalysisMemoryRecord;
use aegi_core::model::Assertion;
use aegi_core::model::Chunk;
use aegi_core::model::Entity;
use aegi_core::model::EntityIdentityAction;
use aegi_core::model::EvidenceAssessment;
use aegi_core::model::EventSeverity;
use aegi_core::model::Forecast;
use aegi_core::model::GraphEvent;
use aegi_core::model::Hypothesis;
use aegi_core::model::Narrative;
use aegi_core::model::RelationFact;
use aegi_core::model::Report;
use aegi_core::model::ReportSection;
use aegi_core::interfaces::AuditSink;
use ach::HypothesisSeed;
use causal::CausalLink;
use causal::Indicator;
use narrative::CoordinationConfig;
use narrative::CoordinationSignal;
use narrative::NarrativeConfig;
use quality::QualityReport;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

fn now() -> aegi_core::time::Timestamp {
    aegi_core::time::Timestamp::new(time::OffsetDateTime::now_utc())
}

// ============================================================================
// SECTION: Stage Identity
// ============================================================================

/// The pipeline's fixed stage order (§4.12). Declaration order here *is*
/// run order; [`PipelineRunner::run`] iterates [`StageName::ALL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    OsintCollect,
    ClaimExtract,
    AssertionFuse,
    KgBuild,
    HypothesisGenerate,
    BayesianAchAssess,
    CausalAnalyze,
    ForecastGenerate,
    NarrativeBuild,
    CoordinationDetect,
    QualityScore,
    MemoryRecord,
    ReportGenerate,
}

impl StageName {
    /// The full DAG, in run order.
    pub const ALL: [StageName; 13] = [
        StageName::OsintCollect,
        StageName::ClaimExtract,
        StageName::AssertionFuse,
        StageName::KgBuild,
        StageName::HypothesisGenerate,
        StageName::BayesianAchAssess,
        StageName::CausalAnalyze,
        StageName::ForecastGenerate,
        StageName::NarrativeBuild,
        StageName::CoordinationDetect,
        StageName::QualityScore,
        StageName::MemoryRecord,
        StageName::ReportGenerate,
    ];

    /// Dotted name used in audit operations and bus payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::OsintCollect => "osint_collect",
            StageName::ClaimExtract => "claim_extract",
            StageName::AssertionFuse => "assertion_fuse",
            StageName::KgBuild => "kg_build",
            StageName::HypothesisGenerate => "hypothesis_generate",
            StageName::BayesianAchAssess => "bayesian_ach_assess",
            StageName::CausalAnalyze => "causal_analyze",
            StageName::ForecastGenerate => "forecast_generate",
            StageName::NarrativeBuild => "narrative_build",
            StageName::CoordinationDetect => "coordination_detect",
            StageName::QualityScore => "quality_score",
            StageName::MemoryRecord => "memory_record",
            StageName::ReportGenerate => "report_generate",
        }
    }
}

/// Outcome of a single stage's attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Skipped,
    Error,
}

/// What one stage run produced, regardless of outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: StageName,
    pub status: StageStatus,
    pub duration_ms: u64,
    pub output: serde_json::Value,
    pub error: Option<String>,
}

/// Orchestrator-level failure. Distinct from a [`StageResult`] with
/// `status: Error`: this only fires for a stage explicitly marked fatal,
/// or a precondition of the run itself (an empty DAG is not possible here,
/// but a future caller-supplied subset could produce one).
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("stage {0} failed fatally: {1}")]
    FatalStage(&'static str, String),
}

// ============================================================================
// SECTION: Case State
// ============================================================================

/// Everything the pipeline accumulates over one run, guarded by a single
/// mutex since stages execute strictly in order and release it before any
/// `.await` (§5's single-coroutine-per-request ordering, adapted to one
/// run instead of one request).
#[derive(Debug, Default)]
pub struct CaseState {
    pub pending_chunks: VecDeque<Chunk>,
    pub chunks: Vec<Chunk>,
    pub source_claims: Vec<SourceClaim>,
    pub embeddings: BTreeMap<SourceClaimUid, Vec<f32>>,
    pub assertions: Vec<Assertion>,
    pub entities: Vec<Entity>,
    pub relations: Vec<RelationFact>,
    pub graph_events: Vec<GraphEvent>,
    pub pending_entity_actions: Vec<EntityIdentityAction>,
    pub hypotheses: Vec<Hypothesis>,
    pub assessments: Vec<EvidenceAssessment>,
    pub causal_links: Vec<CausalLink>,
    pub forecasts: Vec<Forecast>,
    pub narratives: Vec<Narrative>,
    pub coordination_signals: Vec<CoordinationSignal>,
    pub quality_report: Option<QualityReport>,
    pub memory_records: Vec<AnalysisMemoryRecord>,
    pub report: Option<Report>,
}

use aegi_core::model::SourceClaim;

impl CaseState {
    /// Builds state seeded with chunks already collected from an
    /// upstream source (an ingested document, a GDELT anomaly, an
    /// investigation round's fetch). The pipeline has no generic external
    /// fetch capability of its own; `osint_collect` only drains this queue.
    #[must_use]
    pub fn with_pending_chunks(chunks: Vec<Chunk>) -> Self {
        Self { pending_chunks: chunks.into_iter().collect(), ..Self::default() }
    }
}

// ============================================================================
// SECTION: Stage Context
// ============================================================================

/// Tunable, caller-supplied parameters for one pipeline run that aren't
/// part of the accumulated [`CaseState`] itself.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub hypothesis_seeds: Vec<HypothesisSeed>,
    pub user_priors: Option<BTreeMap<String, f64>>,
    pub indicators: Vec<Indicator>,
    pub narrative_config: NarrativeConfig,
    pub coordination_config: CoordinationConfig,
    pub historical_accuracy: Option<f64>,
    pub default_credibility: f64,
    pub include_degraded_in_report: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            hypothesis_seeds: Vec::new(),
            user_priors: None,
            indicators: Vec::new(),
            narrative_config: NarrativeConfig::default(),
            coordination_config: CoordinationConfig::default(),
            historical_accuracy: None,
            default_credibility: 0.6,
            include_degraded_in_report: false,
        }
    }
}

/// Shared, read-mostly context every stage consults: the case, its
/// capability handles, its active ontology version, and the mutable
/// [`CaseState`] the stages accumulate into.
pub struct StageContext {
    pub case_uid: CaseUid,
    pub llm: Arc<dyn LlmClient>,
    pub evidence_store: Arc<dyn EvidenceStore>,
    pub graph_store: Arc<dyn GraphStore>,
    pub vector_store: Arc<dyn VectorStore>,
    pub audit: Arc<dyn AuditSink>,
    pub bus: Arc<EventBus>,
    pub ontology: aegi_core::model::OntologyVersion,
    pub budget: BudgetContext,
    pub config: PipelineConfig,
    pub state: Mutex<CaseState>,
}

impl StageContext {
    #[must_use]
    pub fn new(
        case_uid: CaseUid,
        llm: Arc<dyn LlmClient>,
        evidence_store: Arc<dyn EvidenceStore>,
        graph_store: Arc<dyn GraphStore>,
        vector_store: Arc<dyn VectorStore>,
        audit: Arc<dyn AuditSink>,
        bus: Arc<EventBus>,
        ontology: aegi_core::model::OntologyVersion,
        budget: BudgetContext,
        config: PipelineConfig,
        initial_state: CaseState,
    ) -> Self {
        Self {
            case_uid,
            llm,
            evidence_store,
            graph_store,
            vector_store,
            audit,
            bus,
            ontology,
            budget,
            config,
            state: Mutex::new(initial_state),
        }
    }

    fn emit(&self, topic: &str, severity: EventSeverity, payload: serde_json::Value) {
        self.bus.emit(AegiEvent::new(topic, Some(self.case_uid.clone()), severity, payload, now()));
    }

    pub(crate) fn lock_state(&self) -> std::sync::MutexGuard<'_, CaseState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Whether a stage has nothing to do given the state accumulated so far.
/// Checked before every stage so downstream stages with no upstream input
/// record `skipped` rather than running against an empty slice.
#[must_use]
pub fn should_skip(stage: StageName, state: &CaseState) -> Option<String> {
    match stage {
        StageName::OsintCollect => state.pending_chunks.is_empty().then(|| "no pending chunks".to_string()),
        StageName::ClaimExtract => state.chunks.is_empty().then(|| "no collected chunks".to_string()),
        StageName::AssertionFuse => state.source_claims.is_empty().then(|| "no source claims".to_string()),
        StageName::KgBuild => state.assertions.is_empty().then(|| "no assertions".to_string()),
        StageName::HypothesisGenerate => None,
        StageName::BayesianAchAssess => {
            (state.hypotheses.is_empty() || state.assertions.is_empty()).then(|| "no hypotheses or assertions".to_string())
        }
        StageName::CausalAnalyze => (state.assertions.len() < 2).then(|| "fewer than two assertions".to_string()),
        StageName::ForecastGenerate => state.hypotheses.is_empty().then(|| "no hypotheses".to_string()),
        StageName::NarrativeBuild => state.source_claims.is_empty().then(|| "no source claims".to_string()),
        StageName::CoordinationDetect => state.narratives.is_empty().then(|| "no narratives".to_string()),
        StageName::QualityScore => None,
        StageName::MemoryRecord => state.quality_report.is_none().then(|| "no quality report yet".to_string()),
        StageName::ReportGenerate => None,
    }
}

// ============================================================================
// SECTION: Stage Implementations
// ============================================================================

async fn run_osint_collect(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let drained: Vec<Chunk> = {
        let mut state = ctx.lock_state();
        state.pending_chunks.drain(..).collect()
    };
    let mut stored = 0usize;
    for chunk in &drained {
        ctx.evidence_store.put_chunk(chunk).await.map_err(|err| err.to_string())?;
        stored += 1;
    }
    {
        let mut state = ctx.lock_state();
        state.chunks.extend(drained);
    }
    ctx.emit(
        "osint.collected",
        EventSeverity::Info,
        serde_json::json!({ "query": null, "urls_ingested": 0, "claims_extracted": 0, "chunks_collected": stored }),
    );
    Ok(serde_json::json!({ "chunks_collected": stored }))
}

async fn run_claim_extract(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let chunks: Vec<Chunk> = ctx.lock_state().chunks.clone();
    let mut claim_count = 0usize;
    for chunk in &chunks {
        let result = claims::extract_claims(ctx.llm.as_ref(), chunk, ctx.budget, now()).await;
        ctx.audit.record_tool_trace(&result.trace);
        let mut embeddings = Vec::new();
        for claim in &result.claims {
            ctx.evidence_store.put_source_claim(claim).await.map_err(|err| err.to_string())?;
            if let Ok(Ok(embedding)) = ctx.llm.embed(&claim.text, ctx.budget).await {
                embeddings.push((claim.uid.clone(), embedding));
            }
        }
        claim_count += result.claims.len();
        {
            let mut state = ctx.lock_state();
            state.source_claims.extend(result.claims);
            state.embeddings.extend(embeddings);
        }
        if let Some(event) = result.event {
            ctx.bus.emit(event);
        }
    }
    Ok(serde_json::json!({ "claims_extracted": claim_count }))
}

async fn run_assertion_fuse(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (claims_batch, credibility_floor) = {
        let state = ctx.lock_state();
        (state.source_claims.clone(), ctx.config.default_credibility)
    };
    let credibility = |_claim: &SourceClaim| credibility_floor;
    let result = fusion::fuse_claim_groups(&ctx.case_uid, &[claims_batch], credibility, now());
    for assertion in &result.assertions {
        ctx.evidence_store.put_assertion(assertion).await.map_err(|err| err.to_string())?;
    }
    let fused = result.assertions.len();
    {
        let mut state = ctx.lock_state();
        state.assertions.extend(result.assertions);
    }
    Ok(serde_json::json!({ "assertions_fused": fused }))
}

async fn run_kg_build(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let assertions = ctx.lock_state().assertions.clone();
    let result = graph::build_graph(ctx.llm.as_ref(), &ctx.ontology, &ctx.case_uid, &assertions, ctx.budget, now()).await;
    ctx.audit.record_action(&result.action);
    for trace in &result.traces {
        ctx.audit.record_tool_trace(trace);
    }
    for entity in &result.entities {
        ctx.graph_store.put_entity(entity).await.map_err(|err| err.to_string())?;
    }
    for relation in &result.relations {
        ctx.graph_store.put_relation_fact(relation).await.map_err(|err| err.to_string())?;
    }
    let entity_count = result.entities.len();
    let relation_count = result.relations.len();
    let problem_count = result.problems.len();
    {
        let mut state = ctx.lock_state();
        state.entities.extend(result.entities);
        state.relations.extend(result.relations);
        state.graph_events.extend(result.events);
    }
    Ok(serde_json::json!({
        "entities": entity_count,
        "relations": relation_count,
        "ontology_problems": problem_count,
    }))
}

async fn run_hypothesis_generate(ctx: &StageContext) -> Result<serde_json::Value, String> {
    if !ctx.lock_state().hypotheses.is_empty() || ctx.config.hypothesis_seeds.is_empty() {
        return Ok(serde_json::json!({ "hypotheses_created": 0 }));
    }
    let hypotheses = ach::initialize_priors(
        &ctx.case_uid,
        &ctx.config.hypothesis_seeds,
        ctx.config.user_priors.as_ref(),
        now(),
    )
    .map_err(|err| err.to_string())?;
    for hypothesis in &hypotheses {
        ctx.evidence_store.put_hypothesis(hypothesis).await.map_err(|err| err.to_string())?;
    }
    let created = hypotheses.len();
    ctx.lock_state().hypotheses.extend(hypotheses);
    Ok(serde_json::json!({ "hypotheses_created": created }))
}

async fn run_bayesian_ach_assess(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (hypotheses, assertions, existing) = {
        let state = ctx.lock_state();
        (state.hypotheses.clone(), state.assertions.clone(), state.assessments.clone())
    };
    let mut all_new = Vec::new();
    for assertion in &assertions {
        let new_assessments =
            ach::assess_evidence(ctx.llm.as_ref(), &hypotheses, assertion, &existing, ctx.budget, now()).await;
        all_new.extend(new_assessments);
    }
    if all_new.is_empty() {
        return Ok(serde_json::json!({ "assessments_added": 0 }));
    }
    let outcome = ach::apply_update_summarized(&hypotheses, &all_new, now());
    for hypothesis in &outcome.hypotheses {
        ctx.evidence_store.put_hypothesis(hypothesis).await.map_err(|err| err.to_string())?;
    }
    let added = all_new.len();
    let max_change = outcome.max_change;
    {
        let mut state = ctx.lock_state();
        state.assessments.extend(all_new);
        state.hypotheses = outcome.hypotheses;
    }
    ctx.emit(
        "hypothesis.updated",
        EventSeverity::Notable,
        serde_json::json!({ "assessments_added": added, "max_change": max_change }),
    );
    Ok(serde_json::json!({ "assessments_added": added, "max_change": max_change }))
}

async fn run_causal_analyze(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let assertions = ctx.lock_state().assertions.clone();
    let links = causal::build_causal_links(&assertions);
    let count = links.len();
    ctx.lock_state().causal_links = links;
    Ok(serde_json::json!({ "causal_links": count }))
}

async fn run_forecast_generate(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (hypotheses, assertions, causal_links) = {
        let state = ctx.lock_state();
        (state.hypotheses.clone(), state.assertions.clone(), state.causal_links.clone())
    };
    let labels: Vec<String> = hypotheses.iter().map(|h| h.label.clone()).collect();
    let mut forecasts = Vec::new();
    for hypothesis in &hypotheses {
        let supporting: Vec<Assertion> = assertions
            .iter()
            .filter(|assertion| hypothesis.supporting_assertion_uids.contains(&assertion.uid))
            .cloned()
            .collect();
        let others: Vec<String> = labels.iter().filter(|label| *label != &hypothesis.label).cloned().collect();
        forecasts.push(causal::generate_forecast(
            hypothesis,
            &supporting,
            &causal_links,
            &others,
            &ctx.config.indicators,
            hypotheses.len(),
            now(),
        ));
    }
    let count = forecasts.len();
    ctx.lock_state().forecasts = forecasts;
    Ok(serde_json::json!({ "forecasts_generated": count }))
}

async fn run_narrative_build(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (claims, embeddings) = {
        let state = ctx.lock_state();
        (state.source_claims.clone(), state.embeddings.clone())
    };
    let narratives =
        narrative::build_narratives(&ctx.case_uid, &claims, &embeddings, ctx.config.narrative_config, now());
    let count = narratives.len();
    ctx.lock_state().narratives = narratives;
    Ok(serde_json::json!({ "narratives_built": count }))
}

async fn run_coordination_detect(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (narratives, claims, embeddings) = {
        let state = ctx.lock_state();
        (state.narratives.clone(), state.source_claims.clone(), state.embeddings.clone())
    };
    let claims_by_uid: BTreeMap<&SourceClaimUid, &SourceClaim> =
        claims.iter().map(|claim| (&claim.uid, claim)).collect();
    let signals =
        narrative::detect_coordination(&narratives, &claims_by_uid, &embeddings, ctx.config.coordination_config);
    let count = signals.len();
    ctx.lock_state().coordination_signals = signals;
    Ok(serde_json::json!({ "coordination_signals": count }))
}

async fn run_quality_score(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (entities, pending_actions, relations, assertions, hypotheses, assessments, claims) = {
        let state = ctx.lock_state();
        (
            state.entities.clone(),
            state.pending_entity_actions.clone(),
            state.relations.clone(),
            state.assertions.clone(),
            state.hypotheses.clone(),
            state.assessments.clone(),
            state.source_claims.clone(),
        )
    };
    let diagnosticity_scores = ach::diagnosticity(&hypotheses, &assessments);
    let report = quality::assess_quality(
        &entities,
        &pending_actions,
        &relations,
        &assertions,
        &hypotheses,
        &assessments,
        &diagnosticity_scores,
        ctx.config.historical_accuracy,
        &claims,
        now(),
    );
    let alert_count = report.alerts.len();
    ctx.lock_state().quality_report = Some(report);
    Ok(serde_json::json!({ "alerts": alert_count }))
}

async fn run_memory_record(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (hypotheses, report) = {
        let state = ctx.lock_state();
        (state.hypotheses.clone(), state.quality_report.clone())
    };
    let Some(report) = report else {
        return Ok(serde_json::json!({ "recorded": false }));
    };
    let favored = hypotheses.iter().max_by(|a, b| a.posterior.total_cmp(&b.posterior)).map(|h| h.uid.clone());
    let scenario = format!(
        "{} hypotheses assessed, evidence coverage {:.2}, {} unresolved conflicts",
        hypotheses.len(),
        report.evidence_coverage,
        report.unresolved_conflict_count,
    );
    let hypothesis_uids: Vec<_> = hypotheses.iter().map(|h| h.uid.clone()).collect();
    let record = quality::record_scenario(
        ctx.llm.as_ref(),
        ctx.vector_store.as_ref(),
        &ctx.case_uid,
        scenario,
        Vec::new(),
        hypothesis_uids,
        favored,
        ctx.budget,
        now(),
    )
    .await
    .map_err(|err| err.to_string())?;
    ctx.lock_state().memory_records.push(record);
    Ok(serde_json::json!({ "recorded": true }))
}

async fn run_report_generate(ctx: &StageContext) -> Result<serde_json::Value, String> {
    let (assertions, forecasts, quality_report, hypotheses) = {
        let state = ctx.lock_state();
        (state.assertions.clone(), state.forecasts.clone(), state.quality_report.clone(), state.hypotheses.clone())
    };
    let mut sections = Vec::new();
    for hypothesis in &hypotheses {
        let has_citation = !hypothesis.supporting_assertion_uids.is_empty();
        sections.push(ReportSection {
            heading: hypothesis.label.clone(),
            body: hypothesis.statement.clone(),
            grounding_level: grounding_gate(has_citation),
            cited_assertion_uids: hypothesis.supporting_assertion_uids.clone(),
            cited_evidence_uids: Vec::new(),
        });
    }
    for forecast in &forecasts {
        sections.push(ReportSection {
            heading: "Forecast".to_string(),
            body: forecast.trigger_conditions.join("; "),
            grounding_level: grounding_gate(!forecast.evidence_citations.is_empty()),
            cited_assertion_uids: Vec::new(),
            cited_evidence_uids: Vec::new(),
        });
    }
    if let Some(report) = &quality_report {
        sections.push(ReportSection {
            heading: "Quality".to_string(),
            body: format!(
                "evidence coverage {:.2}, average diagnosticity {:.2}, {} unresolved conflicts",
                report.evidence_coverage, report.average_diagnosticity, report.unresolved_conflict_count,
            ),
            grounding_level: grounding_gate(!assertions.is_empty()),
            cited_assertion_uids: assertions.iter().map(|a| a.uid.clone()).collect(),
            cited_evidence_uids: Vec::new(),
        });
    }
    let report = reporting::generate_report(
        &ctx.case_uid,
        format!("Case {} analysis report", ctx.case_uid.as_str()),
        sections,
        ctx.config.include_degraded_in_report,
        now(),
    );
    let section_count = report.sections.len();
    ctx.lock_state().report = Some(report);
    Ok(serde_json::json!({ "sections": section_count }))
}

async fn dispatch(stage: StageName, ctx: &StageContext) -> Result<serde_json::Value, String> {
    match stage {
        StageName::OsintCollect => run_osint_collect(ctx).await,
        StageName::ClaimExtract => run_claim_extract(ctx).await,
        StageName::AssertionFuse => run_assertion_fuse(ctx).await,
        StageName::KgBuild => run_kg_build(ctx).await,
        StageName::HypothesisGenerate => run_hypothesis_generate(ctx).await,
        StageName::BayesianAchAssess => run_bayesian_ach_assess(ctx).await,
        StageName::CausalAnalyze => run_causal_analyze(ctx).await,
        StageName::ForecastGenerate => run_forecast_generate(ctx).await,
        StageName::NarrativeBuild => run_narrative_build(ctx).await,
        StageName::CoordinationDetect => run_coordination_detect(ctx).await,
        StageName::QualityScore => run_quality_score(ctx).await,
        StageName::MemoryRecord => run_memory_record(ctx).await,
        StageName::ReportGenerate => run_report_generate(ctx).await,
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Walks [`StageName::ALL`] once against a [`StageContext`], in order,
/// isolating each stage's error behind its [`StageResult`]. No stage in
/// this DAG is marked fatal: a quiet report with fewer sections than
/// expected is always preferable to an aborted run, consistent with the
/// grounding gate's own "degrade, never fabricate" posture.
pub struct PipelineRunner;

impl PipelineRunner {
    /// Runs every stage in order, returning one [`StageResult`] per stage.
    ///
    /// # Errors
    ///
    /// Never returns [`OrchestratorError`]: no stage in the fixed DAG is
    /// marked fatal. The signature stays fallible so a future caller that
    /// assembles a custom stage subset can introduce one without breaking
    /// callers of this function.
    pub async fn run(ctx: &StageContext) -> Result<Vec<StageResult>, OrchestratorError> {
        let mut results = Vec::with_capacity(StageName::ALL.len());
        for stage in StageName::ALL {
            let skip_reason = should_skip(stage, &ctx.lock_state());
            let started = std::time::Instant::now();
            let result = if let Some(reason) = skip_reason {
                StageResult {
                    stage,
                    status: StageStatus::Skipped,
                    duration_ms: 0,
                    output: serde_json::json!({ "reason": reason }),
                    error: None,
                }
            } else {
                match dispatch(stage, ctx).await {
                    Ok(output) => StageResult {
                        stage,
                        status: StageStatus::Success,
                        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        output,
                        error: None,
                    },
                    Err(error) => StageResult {
                        stage,
                        status: StageStatus::Error,
                        duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                        output: serde_json::Value::Null,
                        error: Some(error),
                    },
                }
            };
            ctx.audit.record_action(&aegi_core::model::Action {
                uid: aegi_core::ids::ActionUid::mint(),
                case_uid: Some(ctx.case_uid.clone()),
                operation: format!("pipeline.{}", stage.as_str()),
                actor: "pipeline".to_string(),
                detail: serde_json::to_value(&result).unwrap_or(serde_json::Value::Null),
                created_at: now(),
            });
            results.push(result);
        }
        let summary: Vec<&str> = results.iter().map(|r| r.stage.as_str()).collect();
        ctx.emit(
            "pipeline.completed",
            EventSeverity::Info,
            serde_json::json!({ "stage_count": results.len(), "summary": summary }),
        );
        Ok(results)
    }
}
