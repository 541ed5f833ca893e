// aegi-orchestrator/src/lib.rs
// ============================================================================
// Module: AEGI Orchestrator
// Description: Pipeline DAG runner, run tracker, GDELT monitor and
//              scheduler, investigation agent, and retention sweep
//              (§4.12-§4.15).
// Purpose: Wire aegi-analysis's stateless analytic functions into a
//          stateful per-case run, publish progress over aegi-bus, and
//          drive the two background loops (GDELT polling, retention) that
//          keep a long-lived case current without an analyst's attention.
// Dependencies: aegi-core, aegi-analysis, aegi-bus, aegi-llm, aegi-ontology
// ============================================================================

//! ## Overview
//! [`pipeline`] defines the fixed 13-stage DAG and the [`pipeline::CaseState`]
//! it accumulates into. [`tracker`] publishes per-run progress so a caller
//! can poll or subscribe without holding a lock on the run itself.
//! [`gdelt`] holds the three anomaly detectors run over [`aegi_llm::gdelt`]
//! events; [`scheduler`] is the generic cooperative periodic task that
//! drives them (and the retention sweep) on a timer. [`investigation`] is
//! the bounded-round LLM-driven loop that reopens a case in response to a
//! bus event. None of these modules touch a network or a disk directly;
//! they are handed already-constructed `Arc<dyn ...>` capabilities from
//! `aegi-core::interfaces` by whatever binary assembles a case's run.

pub mod gdelt;
pub mod investigation;
pub mod pipeline;
pub mod retention;
pub mod scheduler;
pub mod tracker;

pub use gdelt::AnomalyKind;
pub use gdelt::GdeltAnomaly;
pub use gdelt::GdeltMonitor;
pub use gdelt::GdeltMonitorConfig;

pub use investigation::InvestigationAgent;
pub use investigation::InvestigationError;

pub use pipeline::CaseState;
pub use pipeline::OrchestratorError;
pub use pipeline::PipelineRunner;
pub use pipeline::StageContext;
pub use pipeline::StageName;
pub use pipeline::StageResult;
pub use pipeline::StageStatus;

pub use retention::RetentionConfig;
pub use retention::RetentionSweep;
pub use retention::RetentionSweepResult;

pub use scheduler::GdeltScheduler;
pub use scheduler::GdeltSchedulerConfig;
pub use scheduler::Scheduler;
pub use scheduler::SchedulerError;
pub use scheduler::SchedulerHandle;

pub use tracker::RunStatus;
pub use tracker::RunTracker;
pub use tracker::TrackerSnapshot;
