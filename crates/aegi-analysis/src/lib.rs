// aegi-analysis/src/lib.rs
// ============================================================================
// Module: AEGI Analysis
// Description: Claim extraction, entity disambiguation, Dempster-Shafer
//              fusion, knowledge-graph construction, narrative/coordination
//              detection, Bayesian ACH, causal reasoning and forecasting,
//              quality/bias/blindspot scoring, and report/chat generation.
// Purpose: Expose the §4.4-§4.11 analysis pipeline stages to the
//          orchestrator crate without coupling it to their internals.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! Each module here is one analysis stage in the pipeline described by the
//! engine: claims are extracted from chunks, entities are disambiguated,
//! claims are fused into assertions, assertions build a knowledge graph and
//! narratives, hypotheses are scored with Bayesian ACH, causal links feed
//! forecasts, and the whole case is scored for quality, bias, and blindspots
//! before a report or chat answer is produced. Stages are independent
//! functions and structs rather than a single façade type; the orchestrator
//! sequences them.

pub mod ach;
pub mod causal;
pub mod claims;
pub mod disambiguation;
pub mod fusion;
pub mod graph;
pub mod narrative;
pub mod quality;
pub mod reporting;

pub use ach::AchError;
pub use ach::BayesianUpdateOutcome;
pub use ach::HypothesisSeed;
pub use ach::MARGINAL_EPSILON;
pub use ach::PRIOR_SUM_TOLERANCE;
pub use ach::RecalculateOutcome;
pub use ach::apply_update;
pub use ach::apply_update_summarized;
pub use ach::assess_evidence;
pub use ach::diagnosticity;
pub use ach::diagnosticity_ranking;
pub use ach::initialize_priors;
pub use ach::override_assessment;
pub use ach::recalculate;
pub use ach::recalculate_with_evidence_count;
pub use ach::relation_to_likelihood;

pub use causal::Indicator;
pub use causal::augment_causal_link;
pub use causal::backtest;
pub use causal::build_causal_links;
pub use causal::consistency_score;
pub use causal::generate_forecast;

pub use claims::ClaimExtractionResult;
pub use claims::anchor_for;
pub use claims::extract_claims;

pub use disambiguation::LAYER1_MERGE_CONFIDENCE;
pub use disambiguation::LAYER2_CONFIDENT_THRESHOLD;
pub use disambiguation::UNCERTAINTY_THRESHOLD;
pub use disambiguation::apply_merge;
pub use disambiguation::is_uncertain;
pub use disambiguation::layer1_exact_match_merges;
pub use disambiguation::layer2_embedding_merges;
pub use disambiguation::normalize_name;
pub use disambiguation::resolve_action;

pub use fusion::FusionResult;
pub use fusion::fuse_claim_groups;
pub use fusion::fuse_claims;
pub use fusion::pignistic_confidence;

pub use graph::GapReport;
pub use graph::KgBuildResult;
pub use graph::betweenness_centrality;
pub use graph::build_graph;
pub use graph::degree_centrality;
pub use graph::event_timeline;
pub use graph::gap_report;
pub use graph::label_propagation_communities;
pub use graph::multi_hop_paths;
pub use graph::pagerank;

pub use narrative::CoordinationConfig;
pub use narrative::CoordinationSignal;
pub use narrative::NarrativeConfig;
pub use narrative::build_narratives;
pub use narrative::build_with_embedding_client;
pub use narrative::cosine_similarity;
pub use narrative::detect_coordination;
pub use narrative::token_overlap_similarity;
pub use narrative::trace_narrative;

pub use quality::BiasFlag;
pub use quality::Blindspot;
pub use quality::BlindspotKind;
pub use quality::BlindspotSeverity;
pub use quality::ClaimProvenance;
pub use quality::DIAGNOSTICITY_ALERT_THRESHOLD;
pub use quality::EVIDENCE_COVERAGE_ALERT_THRESHOLD;
pub use quality::PatternStats;
pub use quality::QualityAlert;
pub use quality::QualityReport;
pub use quality::SOURCE_HOMOGENEITY_FRACTION_THRESHOLD;
pub use quality::SOURCE_HOMOGENEITY_MIN_CLAIMS;
pub use quality::UNRESOLVED_CONFLICT_ALERT_THRESHOLD;
pub use quality::assess_quality;
pub use quality::detect_bias;
pub use quality::missing_assertion_blindspots;
pub use quality::pattern_statistics;
pub use quality::periodic_gap_blindspots;
pub use quality::recall_scenarios;
pub use quality::record_scenario;
pub use quality::source_homogeneity;
pub use quality::temporal_spread_blindspot;
pub use quality::update_outcome;

pub use reporting::ChatAnswer;
pub use reporting::EvidenceCitation;
pub use reporting::PlanStep;
pub use reporting::RETRIEVAL_SCORE_THRESHOLD;
pub use reporting::RetrievedAssertion;
pub use reporting::RiskFlag;
pub use reporting::answer_question;
pub use reporting::find_trace;
pub use reporting::generate_report;
pub use reporting::persist_trace;
pub use reporting::plan_query;
pub use reporting::render_markdown;
pub use reporting::retrieve_assertions;
