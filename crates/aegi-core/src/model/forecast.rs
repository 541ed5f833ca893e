// aegi-core/src/model/forecast.rs
// ============================================================================
// Module: Forecast
// Description: Per-hypothesis scenario forecast produced by the causal
//              reasoner and scenario generator (§4.9).
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::ids::AssertionUid;
use crate::ids::CaseUid;
use crate::ids::ForecastUid;
use crate::ids::HypothesisUid;
use crate::ids::SourceClaimUid;
use crate::time::Timestamp;

/// Review status of a generated forecast, driven by its probability and the
/// number of live hypotheses in the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    /// Could not be grounded at FACT level; held back from analyst view.
    Degraded,
    /// High-confidence or contested; requires analyst sign-off before publication.
    PendingReview,
    /// Cleared for analyst consumption.
    Published,
}

/// Directed causal link between two temporally adjacent assertions
/// supporting the same hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    /// Earlier assertion in the pair.
    pub source_assertion_uid: AssertionUid,
    /// Later assertion in the pair.
    pub target_assertion_uid: AssertionUid,
    /// Whether `source`'s timestamp precedes or equals `target`'s.
    pub temporal_consistent: bool,
    /// Mean of the two assertions' Pignistic confidences.
    pub strength: f64,
    /// LLM-augmented counterfactual score, `None` when the LLM path did not run.
    pub counterfactual_score: Option<f64>,
    /// LLM-augmented confounder descriptions, empty when the LLM path did not run.
    pub confounders: Vec<String>,
}

/// One hypothesis's forward-looking scenario forecast (§4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Globally unique identifier.
    pub uid: ForecastUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Hypothesis this forecast is about.
    pub hypothesis_uid: HypothesisUid,
    /// Probability of the scenario, present only when the grounding gate
    /// allows FACT (at least one citation and at least one supporting
    /// assertion); otherwise withheld rather than published ungrounded.
    pub probability: Option<f64>,
    /// Conditions under which the forecast scenario is expected to unfold.
    pub trigger_conditions: Vec<String>,
    /// Union of source claims behind the hypothesis's supporting assertions.
    pub evidence_citations: Vec<SourceClaimUid>,
    /// Labels of the other hypotheses considered alongside this one. Always
    /// non-empty: a single-chain forecast is forbidden, so an empty
    /// alternative set is replaced with the literal placeholder string.
    pub alternatives: Vec<String>,
    /// Review status.
    pub status: ForecastStatus,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Result of backtesting a set of historical forecasts against recorded outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Fraction of predicted-positive forecasts that were actually correct.
    pub precision: f64,
    /// Fraction of predicted-positive forecasts that were actually wrong.
    pub false_alarm_rate: f64,
    /// Fraction of actually-correct outcomes that were not predicted positive.
    pub missed_alert_rate: f64,
}
