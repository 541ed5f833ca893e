// aegi-analysis/src/reporting.rs
// ============================================================================
// Module: Report Generator and Chat Q&A
// Description: Structured report assembly and markdown rendering, plus the
//              query-plan / retrieve / cite / render chat answer pipeline.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! [`generate_report`]/[`render_markdown`] assemble and render a [`Report`]
//! from already-built [`ReportSection`]s. [`answer_question`] is the chat
//! path: [`plan_query`] produces a rule-based plan (always ≥ 2 steps, with
//! a knowledge-graph step appended for graph-flavored questions),
//! [`retrieve_assertions`] embeds the question and searches the vector
//! store, falling back to [`keyword_filter`] when retrieval comes up
//! empty, citations are built and risk-flagged, and the final answer is
//! rendered through [`grounding_gate`] so an ungrounded answer is reported
//! as `cannot_answer_reason`, not a confident guess. [`persist_trace`]
//! writes the full plan/citations/answer into one [`Action`] keyed by
//! `trace_id` in its `detail` (the model has no separate `outputs` field,
//! so `detail` carries it, the same role it plays for `graph.rs`'s
//! `kg.build` action); [`find_trace`] is the GET-replay lookup.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use aegi_core::BudgetContext;
use aegi_core::GroundingLevel;
use aegi_core::LlmClient;
use aegi_core::LlmInvocationRequest;
use aegi_core::VectorStore;
use aegi_core::grounding_gate;
use aegi_core::ids::ActionUid;
use aegi_core::ids::AssertionUid;
use aegi_core::ids::CaseUid;
use aegi_core::ids::SourceClaimUid;
use aegi_core::model::Action;
use aegi_core::model::Assertion;
use aegi_core::ids::ReportUid;
use aegi_core::model::Report;
use aegi_core::model::ReportSection;
use aegi_core::time::Timestamp;

/// Minimum cosine similarity a vector search hit must clear to be retained.
pub const RETRIEVAL_SCORE_THRESHOLD: f64 = 0.3;

/// Assembles a [`Report`] from already-built sections. `include_degraded`
/// controls whether sections clamped to [`GroundingLevel::Hypothesis`] are
/// kept or dropped.
#[must_use]
pub fn generate_report(
    case_uid: &CaseUid,
    title: String,
    sections: Vec<ReportSection>,
    include_degraded: bool,
    now: Timestamp,
) -> Report {
    let sections = if include_degraded {
        sections
    } else {
        sections.into_iter().filter(|s| s.grounding_level != GroundingLevel::Hypothesis).collect()
    };
    Report { uid: ReportUid::mint(), case_uid: case_uid.clone(), title, sections, created_at: now }
}

/// Renders a report to markdown: one `##` heading per section, the body,
/// and a citation footer when a section cites anything.
#[must_use]
pub fn render_markdown(report: &Report) -> String {
    let mut out = format!("# {}\n\n", report.title);
    for section in &report.sections {
        out.push_str(&format!("## {}\n\n{}\n\n", section.heading, section.body));
        if !section.cited_assertion_uids.is_empty() {
            let cited = section
                .cited_assertion_uids
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!("_Assertions cited: {cited}_\n\n"));
        }
    }
    out
}

/// One step of a chat query plan.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// Human-readable description of the step.
    pub description: String,
}

const GRAPH_KEYWORDS: &[&str] =
    &["graph", "network", "connection", "connected", "relationship", "related", "linked", "entity", "entities"];

fn mentions_graph(question: &str) -> bool {
    let lowered = question.to_lowercase();
    GRAPH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

/// Rule-based query plan: retrieve evidence, then synthesize an answer,
/// always at least two steps, with a knowledge-graph step appended when
/// `question` contains a graph-related keyword.
#[must_use]
pub fn plan_query(question: &str) -> Vec<PlanStep> {
    let mut steps = vec![
        PlanStep { description: "retrieve evidence relevant to the question".to_string() },
        PlanStep { description: "synthesize an answer from the retrieved evidence".to_string() },
    ];
    if mentions_graph(question) {
        steps.push(PlanStep { description: "query the knowledge graph for related entities".to_string() });
    }
    steps
}

/// One assertion surfaced by retrieval, with its match score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedAssertion {
    /// The retrieved assertion.
    pub assertion_uid: AssertionUid,
    /// Cosine similarity score from the vector search, or 0.0 for a
    /// keyword-filter fallback hit.
    pub score: f64,
}

fn keyword_filter(assertions: &[Assertion], question: &str) -> Vec<RetrievedAssertion> {
    let query_tokens: BTreeSet<String> =
        question.to_lowercase().split_whitespace().map(str::to_string).collect();
    assertions
        .iter()
        .filter(|assertion| {
            let text_tokens: BTreeSet<String> =
                assertion.text.to_lowercase().split_whitespace().map(str::to_string).collect();
            query_tokens.intersection(&text_tokens).next().is_some()
        })
        .map(|assertion| RetrievedAssertion { assertion_uid: assertion.uid.clone(), score: 0.0 })
        .collect()
}

/// Embeds `question` and searches `vector_store` for assertions scoring at
/// least [`RETRIEVAL_SCORE_THRESHOLD`]. Falls back to [`keyword_filter`]
/// when embedding fails, the search fails, or it returns nothing above
/// the threshold.
pub async fn retrieve_assertions(
    llm: &dyn LlmClient,
    vector_store: &dyn VectorStore,
    assertions: &[Assertion],
    question: &str,
    limit: usize,
    budget: BudgetContext,
) -> Vec<RetrievedAssertion> {
    let by_item_id: BTreeMap<&str, &Assertion> =
        assertions.iter().map(|assertion| (assertion.uid.as_str(), assertion)).collect();

    if let Ok(Ok(embedding)) = llm.embed(question, budget).await {
        if !embedding.is_empty() {
            if let Ok(matches) = vector_store.search(&embedding, limit).await {
                let retrieved: Vec<RetrievedAssertion> = matches
                    .into_iter()
                    .filter(|hit| hit.score >= RETRIEVAL_SCORE_THRESHOLD)
                    .filter_map(|hit| {
                        by_item_id.get(hit.item_id.as_str()).map(|assertion| RetrievedAssertion {
                            assertion_uid: assertion.uid.clone(),
                            score: hit.score,
                        })
                    })
                    .collect();
                if !retrieved.is_empty() {
                    return retrieved;
                }
            }
        }
    }
    keyword_filter(assertions, question)
}

/// One numbered citation in a rendered chat answer.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceCitation {
    /// The `[N]` index referenced in the answer text.
    pub index: usize,
    /// Assertion this citation points to.
    pub assertion_uid: AssertionUid,
    /// Source claims behind that assertion.
    pub source_claim_uids: Vec<SourceClaimUid>,
}

fn build_citations(
    retrieved: &[RetrievedAssertion],
    assertions_by_uid: &BTreeMap<&AssertionUid, &Assertion>,
) -> Vec<EvidenceCitation> {
    retrieved
        .iter()
        .enumerate()
        .filter_map(|(position, hit)| {
            assertions_by_uid.get(&hit.assertion_uid).map(|assertion| EvidenceCitation {
                index: position + 1,
                assertion_uid: assertion.uid.clone(),
                source_claim_uids: assertion.source_claim_uids.clone(),
            })
        })
        .collect()
}

/// A risk condition flagged on a chat answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFlag {
    /// No citation survived to support the answer.
    EvidenceInsufficient,
    /// Citations trace back to fewer independent sources than required.
    SourcesInsufficient,
    /// Cited assertions disagree, so the answer spans a contested timeline.
    TimeRangeConflict,
}

fn risk_flags(
    citations: &[EvidenceCitation],
    assertions_by_uid: &BTreeMap<&AssertionUid, &Assertion>,
    min_sources: usize,
) -> Vec<RiskFlag> {
    let mut flags = Vec::new();
    if citations.is_empty() {
        flags.push(RiskFlag::EvidenceInsufficient);
    }
    let unique_sources: BTreeSet<&SourceClaimUid> =
        citations.iter().flat_map(|citation| citation.source_claim_uids.iter()).collect();
    if unique_sources.len() < min_sources {
        flags.push(RiskFlag::SourcesInsufficient);
    }
    let has_conflict = citations
        .iter()
        .filter_map(|citation| assertions_by_uid.get(&citation.assertion_uid))
        .any(|assertion| assertion.value.has_conflict);
    if has_conflict {
        flags.push(RiskFlag::TimeRangeConflict);
    }
    flags
}

fn extract_cited_indices(text: &str) -> BTreeSet<usize> {
    let mut indices = BTreeSet::new();
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find(']') else { break };
        if let Ok(index) = after_open[..close].parse::<usize>() {
            indices.insert(index);
        }
        rest = &after_open[close + 1..];
    }
    indices
}

const CHAT_SYSTEM_PROMPT: &str = concat!(
    "Answer the question using only the numbered evidence snippets below. ",
    "Cite every fact you use with its bracketed index, e.g. [1]. If the ",
    "evidence does not support an answer, say so plainly."
);

/// A rendered chat answer with its grounding level, surviving citations,
/// and risk flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatAnswer {
    /// Rendered answer text, empty when the answer could not be grounded.
    pub answer_text: String,
    /// Grounding level the answer was clamped to.
    pub grounding_level: GroundingLevel,
    /// Citations actually referenced by `[N]` indices in the answer.
    pub citations: Vec<EvidenceCitation>,
    /// Risk flags raised while building the answer.
    pub risk_flags: Vec<RiskFlag>,
    /// Reason the question could not be answered, set only when
    /// `answer_text` is empty.
    pub cannot_answer_reason: Option<RiskFlag>,
}

/// Runs the full chat pipeline: plan, retrieve, cite, flag, and render
/// through the grounding gate.
pub async fn answer_question(
    llm: &dyn LlmClient,
    vector_store: &dyn VectorStore,
    assertions: &[Assertion],
    question: &str,
    min_sources: usize,
    budget: BudgetContext,
) -> ChatAnswer {
    let retrieved = retrieve_assertions(llm, vector_store, assertions, question, 10, budget).await;
    let assertions_by_uid: BTreeMap<&AssertionUid, &Assertion> =
        assertions.iter().map(|assertion| (&assertion.uid, assertion)).collect();
    let citations = build_citations(&retrieved, &assertions_by_uid);
    let risk_flags_before_answer = risk_flags(&citations, &assertions_by_uid, min_sources);

    if citations.is_empty() {
        return ChatAnswer {
            answer_text: String::new(),
            grounding_level: GroundingLevel::Hypothesis,
            citations: Vec::new(),
            risk_flags: risk_flags_before_answer,
            cannot_answer_reason: Some(RiskFlag::EvidenceInsufficient),
        };
    }

    let evidence_block = citations
        .iter()
        .filter_map(|citation| {
            assertions_by_uid
                .get(&citation.assertion_uid)
                .map(|assertion| format!("[{}] {}", citation.index, assertion.text))
        })
        .collect::<Vec<_>>()
        .join("\n");
    let request = LlmInvocationRequest {
        system_prompt: CHAT_SYSTEM_PROMPT.to_string(),
        user_prompt: format!("Question: {question}\n\nEvidence:\n{evidence_block}"),
    };
    let raw_answer = match llm.invoke(&request, budget).await {
        Ok(Ok(text)) => text,
        _ => String::new(),
    };

    let referenced = extract_cited_indices(&raw_answer);
    let kept_citations: Vec<EvidenceCitation> =
        citations.into_iter().filter(|citation| referenced.contains(&citation.index)).collect();

    if kept_citations.is_empty() {
        return ChatAnswer {
            answer_text: String::new(),
            grounding_level: GroundingLevel::Hypothesis,
            citations: Vec::new(),
            risk_flags: risk_flags_before_answer,
            cannot_answer_reason: Some(RiskFlag::EvidenceInsufficient),
        };
    }

    ChatAnswer {
        answer_text: raw_answer,
        grounding_level: grounding_gate(true),
        citations: kept_citations,
        risk_flags: risk_flags_before_answer,
        cannot_answer_reason: None,
    }
}

/// Persists one chat pipeline's full plan/citations/answer into an
/// [`Action`]'s `detail`, keyed by `trace_id` so [`find_trace`] can replay it.
#[must_use]
pub fn persist_trace(
    case_uid: &CaseUid,
    trace_id: String,
    plan: &[PlanStep],
    answer: &ChatAnswer,
    now: Timestamp,
) -> Action {
    let detail = serde_json::json!({
        "trace_id": trace_id,
        "plan": plan.iter().map(|step| step.description.clone()).collect::<Vec<_>>(),
        "citations": answer.citations.iter().map(|citation| serde_json::json!({
            "index": citation.index,
            "assertion_uid": citation.assertion_uid.as_str(),
        })).collect::<Vec<_>>(),
        "answer_text": answer.answer_text,
        "risk_flags": answer.risk_flags.iter().map(|flag| format!("{flag:?}")).collect::<Vec<_>>(),
    });
    Action {
        uid: ActionUid::mint(),
        case_uid: Some(case_uid.clone()),
        operation: "chat.answer_question".to_string(),
        actor: "chat".to_string(),
        detail,
        created_at: now,
    }
}

/// Finds a previously persisted chat trace by its `trace_id`.
#[must_use]
pub fn find_trace<'a>(actions: &'a [Action], trace_id: &str) -> Option<&'a Action> {
    actions
        .iter()
        .filter(|action| action.operation == "chat.answer_question")
        .find(|action| action.detail.get("trace_id").and_then(|v| v.as_str()) == Some(trace_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::DegradedOutput;
    use aegi_core::DegradedReason;
    use aegi_core::LlmError;
    use aegi_core::grounding::GroundingLevel as GL;
    use aegi_core::ids::EvidenceUid;
    use aegi_core::interfaces::VectorMatch;
    use aegi_core::interfaces::VectorStoreError;
    use aegi_core::model::AssertionValue;
    use async_trait::async_trait;
    use std::time::Duration;

    fn ts(seconds: i64) -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(seconds).expect("valid"))
    }

    fn assertion(uid: &str, text: &str, has_conflict: bool, claims: &[&str]) -> Assertion {
        Assertion {
            uid: AssertionUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            text: text.to_string(),
            source_claim_uids: claims.iter().map(|s| SourceClaimUid::new(*s)).collect(),
            value: AssertionValue {
                belief: 0.8,
                plausibility: 0.9,
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

    #[test]
    fn plan_query_always_has_at_least_two_steps() {
        assert!(plan_query("what happened").len() >= 2);
    }

    #[test]
    fn plan_query_appends_kg_step_for_graph_keywords() {
        let plan = plan_query("who is connected to this entity?");
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn keyword_filter_matches_on_shared_tokens() {
        let assertions = vec![assertion("a1", "the convoy crossed the border", false, &["sc1"])];
        let retrieved = keyword_filter(&assertions, "did the convoy move?");
        assert_eq!(retrieved.len(), 1);
    }

    #[test]
    fn extract_cited_indices_parses_bracketed_numbers() {
        let indices = extract_cited_indices("As shown in [1] and [3], this holds.");
        assert_eq!(indices, BTreeSet::from([1, 3]));
    }

    #[test]
    fn report_drops_degraded_sections_when_excluded() {
        let sections = vec![
            ReportSection {
                heading: "Fact".to_string(),
                body: "body".to_string(),
                grounding_level: GL::Fact,
                cited_assertion_uids: vec![AssertionUid::new("a1")],
                cited_evidence_uids: vec![EvidenceUid::new("ev1")],
            },
            ReportSection {
                heading: "Guess".to_string(),
                body: "body".to_string(),
                grounding_level: GL::Hypothesis,
                cited_assertion_uids: Vec::new(),
                cited_evidence_uids: Vec::new(),
            },
        ];
        let report = generate_report(&CaseUid::new("case_1"), "Title".to_string(), sections, false, ts(0));
        assert_eq!(report.sections.len(), 1);
        let markdown = render_markdown(&report);
        assert!(markdown.contains("Fact"));
        assert!(!markdown.contains("Guess"));
    }

    struct StubLlm {
        embedding: Vec<f32>,
        answer: String,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(
            &self,
            _request: &LlmInvocationRequest,
            _budget: BudgetContext,
        ) -> Result<Result<String, DegradedOutput>, LlmError> {
            Ok(Ok(self.answer.clone()))
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

    struct StubVectorStore {
        matches: Vec<VectorMatch>,
    }

    #[async_trait]
    impl VectorStore for StubVectorStore {
        async fn upsert(&self, _item_id: &str, _embedding: &[f32]) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn search(&self, _embedding: &[f32], _limit: usize) -> Result<Vec<VectorMatch>, VectorStoreError> {
            Ok(self.matches.clone())
        }
    }

    fn budget() -> BudgetContext {
        BudgetContext { deadline: Duration::from_secs(5), max_output_tokens: 256 }
    }

    #[tokio::test]
    async fn answer_question_cannot_answer_without_citations() {
        let llm = StubLlm { embedding: Vec::new(), answer: String::new() };
        let store = StubVectorStore { matches: Vec::new() };
        let answer = answer_question(&llm, &store, &[], "what happened?", 1, budget()).await;
        assert_eq!(answer.cannot_answer_reason, Some(RiskFlag::EvidenceInsufficient));
        assert_eq!(answer.answer_text, "");
        assert_eq!(answer.grounding_level, GL::Hypothesis);
    }

    #[tokio::test]
    async fn answer_question_keeps_only_referenced_citations() {
        let assertions = vec![
            assertion("a1", "the convoy moved south", false, &["sc1"]),
            assertion("a2", "unrelated weather report", false, &["sc2"]),
        ];
        let llm =
            StubLlm { embedding: vec![0.1, 0.2], answer: "The convoy moved south [1].".to_string() };
        let store = StubVectorStore {
            matches: vec![
                VectorMatch { item_id: "a1".to_string(), score: 0.9 },
                VectorMatch { item_id: "a2".to_string(), score: 0.4 },
            ],
        };
        let answer = answer_question(&llm, &store, &assertions, "did the convoy move?", 1, budget()).await;
        assert_eq!(answer.citations.len(), 1);
        assert_eq!(answer.citations[0].assertion_uid, AssertionUid::new("a1"));
        assert_eq!(answer.grounding_level, GL::Fact);
        assert_eq!(answer.cannot_answer_reason, None);
    }

    #[tokio::test]
    async fn answer_question_falls_back_to_keyword_filter_below_score_threshold() {
        let assertions = vec![assertion("a1", "the convoy moved south", false, &["sc1"])];
        let llm = StubLlm { embedding: vec![0.1], answer: "The convoy moved south [1].".to_string() };
        let store =
            StubVectorStore { matches: vec![VectorMatch { item_id: "a1".to_string(), score: 0.1 }] };
        let answer = answer_question(&llm, &store, &assertions, "did the convoy move?", 1, budget()).await;
        assert_eq!(answer.citations.len(), 1);
    }

    #[test]
    fn persist_and_find_trace_round_trips_by_trace_id() {
        let answer = ChatAnswer {
            answer_text: "answer".to_string(),
            grounding_level: GL::Fact,
            citations: Vec::new(),
            risk_flags: Vec::new(),
            cannot_answer_reason: None,
        };
        let action = persist_trace(&CaseUid::new("case_1"), "trace_abc".to_string(), &[], &answer, ts(0));
        let actions = vec![action];
        let found = find_trace(&actions, "trace_abc");
        assert!(found.is_some());
        assert!(find_trace(&actions, "trace_other").is_none());
    }
}
