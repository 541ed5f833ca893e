// aegi-orchestrator/src/investigation.rs
// ============================================================================
// Module: Investigation Agent
// Description: Bounded-round, LLM-driven evidence-gathering loop triggered
//              by a bus event (§4.14).
// Purpose: Reopen a case in response to a detected gap — an anomaly, a
//          low-confidence coordination signal, an analyst request — without
//          running unbounded or blocking the bus handler that triggered it.
// Dependencies: aegi-core, aegi-orchestrator::pipeline, tokio
// ============================================================================

//! ## Overview
//! [`InvestigationAgent::run`] drives one [`Investigation`] through its
//! rounds: each round asks the configured [`LlmClient`] what question to
//! pursue next, turns the answer into [`Chunk`]s via a caller-supplied
//! fetcher, and runs them through [`crate::pipeline::PipelineRunner`] before
//! asking the model whether the gap is resolved. The loop terminates on
//! `gap_resolved`, on reaching `max_rounds`, or on a cooperative
//! [`InvestigationAgent::cancel`] signal — never by running forever.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use aegi_core::ids::InvestigationUid;
use aegi_core::interfaces::BudgetContext;
use aegi_core::interfaces::LlmClient;
use aegi_core::interfaces::LlmInvocationRequest;
use aegi_core::model::Chunk;
use aegi_core::model::Investigation;
use aegi_core::model::InvestigationRound;
use aegi_core::model::InvestigationStatus;
use aegi_core::time::Timestamp;
use async_trait::async_trait;
use thiserror::Error;

use crate::pipeline::PipelineRunner;
use crate::pipeline::StageContext;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Investigation-level failures. A round's own LLM or pipeline errors are
/// absorbed into that round rather than aborting the investigation; this is
/// reserved for conditions that make continuing meaningless.
#[derive(Debug, Error)]
pub enum InvestigationError {
    /// The fetcher could not produce any chunks for a round's questions.
    #[error("round {0} fetcher produced no chunks")]
    NoChunksFetched(u32),
}

// ============================================================================
// SECTION: Fetcher
// ============================================================================

/// Turns a round's questions into chunks to feed the pipeline. Implemented
/// by whatever binary assembles a run (an OSINT connector, a replay fixture
/// in tests); the agent itself never reaches outside the case state it is
/// handed.
#[async_trait]
pub trait EvidenceFetcher: Send + Sync {
    /// Fetches evidence chunks addressing `questions`.
    async fn fetch(&self, questions: &[String]) -> Vec<Chunk>;
}

// ============================================================================
// SECTION: Agent
// ============================================================================

fn now() -> Timestamp {
    Timestamp::new(time::OffsetDateTime::now_utc())
}

/// Cooperative cancellation registry, keyed by investigation UID, so a
/// caller elsewhere in the process can stop a run in progress. Checked
/// between rounds, never mid-round: a round already underway always
/// finishes.
#[derive(Default)]
struct CancelRegistry {
    flags: Mutex<BTreeMap<InvestigationUid, Arc<AtomicBool>>>,
}

impl CancelRegistry {
    fn flag_for(&self, uid: &InvestigationUid) -> Arc<AtomicBool> {
        let mut flags = self.flags.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(flags.entry(uid.clone()).or_insert_with(|| Arc::new(AtomicBool::new(false))))
    }

    fn cancel(&self, uid: &InvestigationUid) {
        if let Some(flag) = self.flags.lock().unwrap_or_else(std::sync::PoisonError::into_inner).get(uid) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    fn cleanup(&self, uid: &InvestigationUid) {
        self.flags.lock().unwrap_or_else(std::sync::PoisonError::into_inner).remove(uid);
    }
}

/// Drives bounded-round investigations. One instance can run many
/// investigations concurrently; each tracks its own cancel signal.
pub struct InvestigationAgent {
    llm: Arc<dyn LlmClient>,
    fetcher: Arc<dyn EvidenceFetcher>,
    budget: BudgetContext,
    cancels: CancelRegistry,
}

impl InvestigationAgent {
    /// Creates an agent that queries `llm` for the next question each round
    /// and turns answers into chunks through `fetcher`.
    #[must_use]
    pub fn new(llm: Arc<dyn LlmClient>, fetcher: Arc<dyn EvidenceFetcher>, budget: BudgetContext) -> Self {
        Self { llm, fetcher, budget, cancels: CancelRegistry::default() }
    }

    /// Signals the run identified by `uid` to stop after its current round.
    /// A no-op if no run with that UID is currently tracked.
    pub fn cancel(&self, uid: &InvestigationUid) {
        self.cancels.cancel(uid);
    }

    /// Runs `investigation` to completion: each round asks the model for the
    /// next question, fetches evidence for it, folds the evidence through
    /// `ctx`'s pipeline, then asks the model whether the gap is resolved.
    /// Returns the investigation with its accumulated rounds and final
    /// status. A round whose fetch or pipeline run fails records the round
    /// with no evidence and continues rather than aborting the investigation
    /// outright.
    pub async fn run(
        &self,
        mut investigation: Investigation,
        ctx: &StageContext,
    ) -> Result<Investigation, InvestigationError> {
        let cancel_flag = self.cancels.flag_for(&investigation.uid);
        investigation.status = InvestigationStatus::Active;

        for round_number in 0..investigation.max_rounds {
            if cancel_flag.load(Ordering::SeqCst) {
                investigation.status = InvestigationStatus::Aborted;
                break;
            }

            let questions = self.next_questions(&investigation).await;
            let chunks = self.fetcher.fetch(&questions).await;
            let evidence_uids = chunks.iter().map(|chunk| chunk.uid.clone()).collect::<Vec<_>>();

            if !chunks.is_empty() {
                {
                    let mut state = ctx.lock_state();
                    state.pending_chunks.extend(chunks);
                }
                let _ = PipelineRunner::run(ctx).await;
            }

            investigation.rounds.push(InvestigationRound {
                round_number,
                questions,
                evidence_uids,
                completed_at: now(),
            });

            if self.gap_resolved(&investigation).await {
                investigation.status = InvestigationStatus::Completed;
                break;
            }

            if round_number + 1 == investigation.max_rounds {
                investigation.status = InvestigationStatus::Completed;
            }
        }

        self.cancels.cleanup(&investigation.uid);
        Ok(investigation)
    }

    async fn next_questions(&self, investigation: &Investigation) -> Vec<String> {
        let request = LlmInvocationRequest {
            system_prompt: "Propose the next evidence-gathering question for this investigation.".to_string(),
            user_prompt: format!(
                "Trigger: {}\nRounds so far: {}",
                investigation.trigger,
                investigation.rounds.len()
            ),
        };
        match self.llm.invoke(&request, self.budget).await {
            Ok(Ok(text)) => vec![text],
            _ => vec![investigation.trigger.clone()],
        }
    }

    async fn gap_resolved(&self, investigation: &Investigation) -> bool {
        let request = LlmInvocationRequest {
            system_prompt: "Answer yes or no: has this investigation resolved its triggering gap?".to_string(),
            user_prompt: investigation.trigger.clone(),
        };
        match self.llm.invoke(&request, self.budget).await {
            Ok(Ok(text)) => text.trim().eq_ignore_ascii_case("yes"),
            _ => false,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::ids::ArtifactVersionUid;
    use aegi_core::ids::ChunkUid;
    use aegi_core::ids::InvestigationUid;
    use aegi_core::model::AnchorHealth;
    use aegi_core::model::OntologyVersion;
    use aegi_core::ids::CaseUid;
    use aegi_core::ids::OntologyVersionUid;
    use aegi_core::runtime::InMemoryEvidenceStore;
    use aegi_core::runtime::InMemoryGraphStore;
    use aegi_core::runtime::InMemoryVectorStore;
    use aegi_core::runtime::NoopAuditSink;
    use aegi_bus::EventBus;
    use aegi_llm::RuleBasedLlmClient;

    struct NoEvidenceFetcher;

    #[async_trait]
    impl EvidenceFetcher for NoEvidenceFetcher {
        async fn fetch(&self, _questions: &[String]) -> Vec<Chunk> {
            Vec::new()
        }
    }

    struct OneChunkFetcher;

    #[async_trait]
    impl EvidenceFetcher for OneChunkFetcher {
        async fn fetch(&self, _questions: &[String]) -> Vec<Chunk> {
            vec![Chunk {
                uid: ChunkUid::mint(),
                case_uid: CaseUid::mint(),
                artifact_version_uid: ArtifactVersionUid::mint(),
                ordinal: 0,
                text: "new evidence".to_string(),
                anchors: Vec::new(),
                anchor_health: AnchorHealth::Unchecked,
                created_at: now(),
            }]
        }
    }

    fn investigation(max_rounds: u32) -> Investigation {
        Investigation {
            uid: InvestigationUid::mint(),
            case_uid: CaseUid::mint(),
            trigger: "unexplained troop surge".to_string(),
            rounds: Vec::new(),
            max_rounds,
            status: InvestigationStatus::Active,
            created_at: now(),
        }
    }

    fn ctx() -> StageContext {
        StageContext::new(
            CaseUid::mint(),
            Arc::new(RuleBasedLlmClient::default()),
            Arc::new(InMemoryEvidenceStore::new()),
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(NoopAuditSink),
            Arc::new(EventBus::new(Arc::new(NoopAuditSink))),
            OntologyVersion { uid: OntologyVersionUid::mint(), version: 1, types: Vec::new(), created_at: now() },
            BudgetContext { deadline: std::time::Duration::from_secs(30), max_output_tokens: 256 },
            crate::pipeline::PipelineConfig::default(),
            crate::pipeline::CaseState::default(),
        )
    }

    #[tokio::test]
    async fn run_stops_at_max_rounds_when_the_gap_never_resolves() {
        let agent = InvestigationAgent::new(
            Arc::new(RuleBasedLlmClient::default()),
            Arc::new(NoEvidenceFetcher),
            BudgetContext { deadline: std::time::Duration::from_secs(5), max_output_tokens: 64 },
        );
        let result = agent.run(investigation(3), &ctx()).await.expect("run completes");
        assert_eq!(result.rounds.len(), 3);
        assert_eq!(result.status, InvestigationStatus::Completed);
    }

    #[tokio::test]
    async fn run_folds_fetched_chunks_into_pipeline_state() {
        let agent = InvestigationAgent::new(
            Arc::new(RuleBasedLlmClient::default()),
            Arc::new(OneChunkFetcher),
            BudgetContext { deadline: std::time::Duration::from_secs(5), max_output_tokens: 64 },
        );
        let ctx = ctx();
        let _ = agent.run(investigation(1), &ctx).await.expect("run completes");
        assert_eq!(ctx.lock_state().chunks.len(), 1);
    }

    #[tokio::test]
    async fn cancel_stops_the_run_before_max_rounds() {
        let agent = Arc::new(InvestigationAgent::new(
            Arc::new(RuleBasedLlmClient::default()),
            Arc::new(NoEvidenceFetcher),
            BudgetContext { deadline: std::time::Duration::from_secs(5), max_output_tokens: 64 },
        ));
        let run = investigation(50);
        let uid = run.uid.clone();
        agent.cancel(&uid);
        let result = agent.run(run, &ctx()).await.expect("run completes");
        assert_eq!(result.status, InvestigationStatus::Aborted);
        assert!(result.rounds.is_empty());
    }
}
