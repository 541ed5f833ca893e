// aegi-analysis/src/causal.rs
// ============================================================================
// Module: Causal Reasoner and Scenario Generator
// Description: Adjacent-pair causal links over a hypothesis's assertions,
//              optional LLM-augmented counterfactuals, per-hypothesis
//              forecasts, and historical backtesting.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! [`build_causal_links`] is a pure, rule-based baseline: assertions
//! supporting a hypothesis are sorted by time and chained into adjacent
//! pairs, each flagged for temporal consistency. [`augment_causal_link`]
//! may layer an LLM-derived counterfactual score and confounder list on
//! top; a provider failure leaves the rule-based link untouched rather than
//! failing the stage. [`generate_forecast`] turns a hypothesis's links and
//! optional indicator trends into one [`Forecast`], gated by
//! [`grounding_gate`] so a probability is only ever published with
//! citations behind it.

use std::collections::BTreeSet;

use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::LlmInvocationRequest;
use aegi_core::grounding::grounding_gate;
use aegi_core::grounding::GroundingLevel;
use aegi_core::ids::ForecastUid;
use aegi_core::ids::SourceClaimUid;
use aegi_core::model::Assertion;
use aegi_core::model::BacktestResult;
use aegi_core::model::CausalLink;
use aegi_core::model::Forecast;
use aegi_core::model::ForecastStatus;
use aegi_core::model::Hypothesis;
use aegi_core::time::Timestamp;
use serde::Deserialize;

use crate::fusion::pignistic_confidence;

/// Builds the rule-based causal link chain over `assertions`, sorted by
/// `created_at`. Returns one link per adjacent pair (n-1 links for n
/// assertions), empty for fewer than two assertions.
#[must_use]
pub fn build_causal_links(assertions: &[Assertion]) -> Vec<CausalLink> {
    if assertions.len() < 2 {
        return Vec::new();
    }
    let mut ordered: Vec<&Assertion> = assertions.iter().collect();
    ordered.sort_by_key(|a| a.created_at);

    ordered
        .windows(2)
        .map(|pair| {
            let (source, target) = (pair[0], pair[1]);
            let temporal_consistent = source.created_at <= target.created_at;
            let strength =
                (pignistic_confidence(&source.value) + pignistic_confidence(&target.value)) / 2.0;
            CausalLink {
                source_assertion_uid: source.uid.clone(),
                target_assertion_uid: target.uid.clone(),
                temporal_consistent,
                strength,
                counterfactual_score: None,
                confounders: Vec::new(),
            }
        })
        .collect()
}

/// Consistency score over a causal chain: the fraction of adjacent pairs
/// that are temporally consistent. A single-assertion chain (zero links)
/// has no contradictions to report and scores 1.0.
#[must_use]
pub fn consistency_score(links: &[CausalLink]) -> f64 {
    if links.is_empty() {
        return 1.0;
    }
    let consistent = links.iter().filter(|link| link.temporal_consistent).count();
    consistent as f64 / links.len() as f64
}

const COUNTERFACTUAL_SYSTEM_PROMPT: &str = concat!(
    "Given two causally linked statements, estimate a counterfactual score ",
    "in [0, 1] (how much the outcome depends on the cause) and list any ",
    "plausible confounders. Respond as JSON."
);

#[derive(Debug, Clone, Deserialize, Default)]
struct RawCounterfactual {
    counterfactual_score: Option<f64>,
    #[serde(default)]
    confounders: Vec<String>,
}

fn counterfactual_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "counterfactual_score": {"type": "number"},
            "confounders": {"type": "array", "items": {"type": "string"}}
        }
    })
}

/// Augments one causal link with an LLM-derived counterfactual score and
/// confounder list. On provider failure or an unparsable response the
/// rule-based link is returned unchanged.
pub async fn augment_causal_link(
    llm: &dyn LlmClient,
    link: CausalLink,
    source_text: &str,
    target_text: &str,
    budget: BudgetContext,
) -> CausalLink {
    let request = LlmInvocationRequest {
        system_prompt: COUNTERFACTUAL_SYSTEM_PROMPT.to_string(),
        user_prompt: format!("Cause: {source_text}\nEffect: {target_text}"),
    };
    let Ok(Ok(value)) = llm.invoke_structured(&request, &counterfactual_schema(), budget).await else {
        return link;
    };
    let Ok(raw) = serde_json::from_value::<RawCounterfactual>(value) else {
        return link;
    };
    CausalLink { counterfactual_score: raw.counterfactual_score, confounders: raw.confounders, ..link }
}

const NO_ALTERNATIVES_PLACEHOLDER: &str = "No alternative hypotheses available";

/// Indicator time series consulted for rising-trend trigger conditions.
#[derive(Debug, Clone)]
pub struct Indicator {
    /// Human-readable name of the indicator.
    pub name: String,
    /// Time-ordered `(timestamp, value)` samples.
    pub samples: Vec<(Timestamp, f64)>,
}

fn rising_trend_conditions(indicators: &[Indicator]) -> Vec<String> {
    indicators
        .iter()
        .filter_map(|indicator| {
            let first = indicator.samples.first()?.1;
            let last = indicator.samples.last()?.1;
            (last > first).then(|| format!("{} is trending upward", indicator.name))
        })
        .collect()
}

/// Generates one [`Forecast`] for `hypothesis`, given the assertions
/// supporting it, its causal links, the labels of every other hypothesis
/// in the case (for `alternatives`), and any optional indicator trends.
#[must_use]
pub fn generate_forecast(
    hypothesis: &Hypothesis,
    supporting_assertions: &[Assertion],
    causal_links: &[CausalLink],
    other_hypothesis_labels: &[String],
    indicators: &[Indicator],
    hypothesis_count_in_case: usize,
    now: Timestamp,
) -> Forecast {
    let evidence_citations: Vec<SourceClaimUid> = supporting_assertions
        .iter()
        .flat_map(|assertion| assertion.source_claim_uids.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let has_valid_citation = !evidence_citations.is_empty() && !supporting_assertions.is_empty();
    let grounding = grounding_gate(has_valid_citation);

    let probability = (grounding == GroundingLevel::Fact).then_some(hypothesis.posterior);

    let mut trigger_conditions: Vec<String> = causal_links
        .iter()
        .filter(|link| link.temporal_consistent)
        .map(|link| format!("{} precedes {}", link.source_assertion_uid, link.target_assertion_uid))
        .collect();
    trigger_conditions.extend(rising_trend_conditions(indicators));

    let alternatives = if other_hypothesis_labels.is_empty() {
        vec![NO_ALTERNATIVES_PLACEHOLDER.to_string()]
    } else {
        other_hypothesis_labels.to_vec()
    };

    let status = if grounding != GroundingLevel::Fact {
        ForecastStatus::Degraded
    } else if probability.is_some_and(|p| p >= 0.8) || hypothesis_count_in_case > 1 {
        ForecastStatus::PendingReview
    } else {
        ForecastStatus::Published
    };

    Forecast {
        uid: ForecastUid::mint(),
        case_uid: hypothesis.case_uid.clone(),
        hypothesis_uid: hypothesis.uid.clone(),
        probability,
        trigger_conditions,
        evidence_citations,
        alternatives,
        status,
        created_at: now,
    }
}

/// Backtests a set of `(forecast, actually_occurred)` pairs under the
/// `predicted_positive = probability > 0.5` rule. A forecast with no
/// probability (degraded) is never predicted positive. Any rate with a
/// zero denominator is reported as 0.0 rather than `NaN`.
#[must_use]
pub fn backtest(outcomes: &[(Forecast, bool)]) -> BacktestResult {
    let predicted_positive = |forecast: &Forecast| forecast.probability.is_some_and(|p| p > 0.5);

    let true_positives = outcomes.iter().filter(|(f, actual)| predicted_positive(f) && *actual).count();
    let false_positives = outcomes.iter().filter(|(f, actual)| predicted_positive(f) && !*actual).count();
    let false_negatives = outcomes.iter().filter(|(f, actual)| !predicted_positive(f) && *actual).count();
    let predicted_positive_count = true_positives + false_positives;
    let actual_positive_count = true_positives + false_negatives;

    let precision = if predicted_positive_count == 0 {
        0.0
    } else {
        true_positives as f64 / predicted_positive_count as f64
    };
    let false_alarm_rate = if predicted_positive_count == 0 {
        0.0
    } else {
        false_positives as f64 / predicted_positive_count as f64
    };
    let missed_alert_rate = if actual_positive_count == 0 {
        0.0
    } else {
        false_negatives as f64 / actual_positive_count as f64
    };

    BacktestResult { precision, false_alarm_rate, missed_alert_rate }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::ids::AssertionUid;
    use aegi_core::ids::CaseUid;
    use aegi_core::ids::HypothesisUid;
    use aegi_core::ids::SourceClaimUid;
    use aegi_core::model::AssertionValue;
    use async_trait::async_trait;
    use aegi_core::DegradedOutput;
    use aegi_core::DegradedReason;
    use aegi_core::LlmError;
    use std::time::Duration;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(seconds).expect("valid"))
    }

    fn assertion(uid: &str, created_at_secs: i64, belief: f64, source_claims: &[&str]) -> Assertion {
        Assertion {
            uid: AssertionUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            text: format!("assertion {uid}"),
            source_claim_uids: source_claims.iter().map(|s| SourceClaimUid::new(*s)).collect(),
            value: AssertionValue {
                belief,
                plausibility: belief + 0.05,
                uncertainty: 0.05,
                conflict_degree: 0.0,
                source_count: 1,
                has_conflict: false,
            },
            conflicts: Vec::new(),
            created_at: ts(created_at_secs),
            updated_at: ts(created_at_secs),
        }
    }

    fn hypothesis(posterior: f64, supporting: &[&str]) -> Hypothesis {
        Hypothesis {
            uid: HypothesisUid::new("hyp_1"),
            case_uid: CaseUid::new("case_1"),
            label: "h_a".to_string(),
            statement: "A did it".to_string(),
            prior: 0.5,
            posterior,
            supporting_assertion_uids: supporting.iter().map(|s| AssertionUid::new(*s)).collect(),
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    #[test]
    fn single_assertion_chain_has_no_links_and_perfect_consistency() {
        let assertions = vec![assertion("a1", 100, 0.8, &["sc1"])];
        let links = build_causal_links(&assertions);
        assert!(links.is_empty());
        assert_eq!(consistency_score(&links), 1.0);
    }

    #[test]
    fn adjacent_pairs_are_flagged_by_temporal_order() {
        let assertions =
            vec![assertion("a1", 100, 0.8, &["sc1"]), assertion("a2", 200, 0.6, &["sc2"])];
        let links = build_causal_links(&assertions);
        assert_eq!(links.len(), 1);
        assert!(links[0].temporal_consistent);
        assert!((links[0].strength - (0.8 + 0.5 * 0.05 + 0.6 + 0.5 * 0.05) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn forecast_withholds_probability_without_citations() {
        let hyp = hypothesis(0.6, &[]);
        let forecast = generate_forecast(&hyp, &[], &[], &[], &[], 1, ts(0));
        assert_eq!(forecast.probability, None);
        assert_eq!(forecast.status, ForecastStatus::Degraded);
    }

    #[test]
    fn forecast_publishes_with_grounded_single_hypothesis() {
        let hyp = hypothesis(0.6, &["a1"]);
        let assertions = vec![assertion("a1", 100, 0.8, &["sc1"])];
        let forecast = generate_forecast(&hyp, &assertions, &[], &[], &[], 1, ts(0));
        assert_eq!(forecast.probability, Some(0.6));
        assert_eq!(forecast.status, ForecastStatus::Published);
        assert_eq!(forecast.evidence_citations, vec![SourceClaimUid::new("sc1")]);
    }

    #[test]
    fn forecast_alternatives_never_empty() {
        let hyp = hypothesis(0.6, &["a1"]);
        let assertions = vec![assertion("a1", 100, 0.8, &["sc1"])];
        let forecast = generate_forecast(&hyp, &assertions, &[], &[], &[], 1, ts(0));
        assert_eq!(forecast.alternatives, vec![NO_ALTERNATIVES_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn forecast_pending_review_above_high_confidence_threshold() {
        let hyp = hypothesis(0.85, &["a1"]);
        let assertions = vec![assertion("a1", 100, 0.8, &["sc1"])];
        let forecast = generate_forecast(&hyp, &assertions, &[], &[], &[], 1, ts(0));
        assert_eq!(forecast.status, ForecastStatus::PendingReview);
    }

    #[test]
    fn forecast_pending_review_when_multiple_hypotheses_contest() {
        let hyp = hypothesis(0.4, &["a1"]);
        let assertions = vec![assertion("a1", 100, 0.8, &["sc1"])];
        let forecast = generate_forecast(
            &hyp,
            &assertions,
            &[],
            &["h_b".to_string()],
            &[],
            2,
            ts(0),
        );
        assert_eq!(forecast.status, ForecastStatus::PendingReview);
        assert_eq!(forecast.alternatives, vec!["h_b".to_string()]);
    }

    #[test]
    fn backtest_reports_zero_rates_with_no_positive_predictions() {
        let forecast = generate_forecast(&hypothesis(0.1, &[]), &[], &[], &[], &[], 1, ts(0));
        let result = backtest(&[(forecast, false)]);
        assert_eq!(result.precision, 0.0);
        assert_eq!(result.false_alarm_rate, 0.0);
    }

    #[test]
    fn backtest_computes_precision_and_false_alarm() {
        let mut correct = generate_forecast(&hypothesis(0.7, &["a1"]), &[assertion("a1", 0, 0.9, &["sc1"])], &[], &[], &[], 1, ts(0));
        correct.probability = Some(0.9);
        let mut wrong = generate_forecast(&hypothesis(0.6, &["a2"]), &[assertion("a2", 0, 0.9, &["sc2"])], &[], &[], &[], 1, ts(0));
        wrong.probability = Some(0.6);
        let result = backtest(&[(correct, true), (wrong, false)]);
        assert!((result.precision - 0.5).abs() < 1e-9);
        assert!((result.false_alarm_rate - 0.5).abs() < 1e-9);
        assert_eq!(result.missed_alert_rate, 0.0);
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

    fn budget() -> BudgetContext {
        BudgetContext { deadline: Duration::from_secs(5), max_output_tokens: 128 }
    }

    #[tokio::test]
    async fn augment_adds_counterfactual_and_confounders() {
        let assertions =
            vec![assertion("a1", 100, 0.8, &["sc1"]), assertion("a2", 200, 0.6, &["sc2"])];
        let link = build_causal_links(&assertions).remove(0);
        let llm = StubLlm {
            response: serde_json::json!({
                "counterfactual_score": 0.7,
                "confounders": ["shared upstream cause"]
            }),
        };
        let augmented = augment_causal_link(&llm, link, "cause text", "effect text", budget()).await;
        assert_eq!(augmented.counterfactual_score, Some(0.7));
        assert_eq!(augmented.confounders, vec!["shared upstream cause".to_string()]);
    }

    #[tokio::test]
    async fn augment_leaves_link_unchanged_on_provider_failure() {
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

        let assertions =
            vec![assertion("a1", 100, 0.8, &["sc1"]), assertion("a2", 200, 0.6, &["sc2"])];
        let link = build_causal_links(&assertions).remove(0);
        let original = link.clone();
        let augmented = augment_causal_link(&DegradingLlm, link, "cause text", "effect text", budget()).await;
        assert_eq!(augmented, original);
    }

    #[test]
    fn rising_indicator_adds_trigger_condition() {
        let indicators = vec![Indicator {
            name: "chatter_volume".to_string(),
            samples: vec![(ts(0), 1.0), (ts(100), 5.0)],
        }];
        let hyp = hypothesis(0.3, &["a1"]);
        let assertions = vec![assertion("a1", 0, 0.8, &["sc1"])];
        let forecast = generate_forecast(&hyp, &assertions, &[], &[], &indicators, 1, ts(0));
        assert!(forecast.trigger_conditions.iter().any(|c| c.contains("chatter_volume")));
    }
}
