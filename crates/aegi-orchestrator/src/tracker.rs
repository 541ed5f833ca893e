// aegi-orchestrator/src/tracker.rs
// ============================================================================
// Module: Run Tracker
// Description: Per-run progress state for a pipeline run (§4.12).
// Purpose: Let a caller poll or subscribe to a run's progress without
//          holding a lock on the run itself, and without the pipeline
//          threading progress callbacks through every stage function.
// Dependencies: aegi-core, aegi-orchestrator::pipeline, tokio
// ============================================================================

//! ## Overview
//! [`RunTracker`] is a process-wide registry keyed by run id. A caller
//! registers a run with [`RunTracker::start`], updates it as
//! [`crate::pipeline::PipelineRunner::run`] progresses, and removes it with
//! [`RunTracker::cleanup`] once the caller has observed completion.
//! [`RunTracker::subscribe`] hands back a [`tokio::sync::Notify`] that is
//! notified on every update, so a watcher can `await` instead of poll.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use aegi_core::ids::CaseUid;
use aegi_core::time::Timestamp;
use serde::Deserialize;
use serde::Serialize;
use tokio::sync::Notify;

use crate::pipeline::StageName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Lifecycle state of one tracked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Point-in-time snapshot of one run's progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub run_id: String,
    pub case_uid: CaseUid,
    pub playbook: String,
    pub status: RunStatus,
    pub current_stage: Option<StageName>,
    pub progress_pct: f64,
    pub stages_total: usize,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub error: Option<String>,
}

struct TrackedRun {
    snapshot: TrackerSnapshot,
    notify: Arc<Notify>,
}

// ============================================================================
// SECTION: Run Tracker
// ============================================================================

/// Registry of in-flight and recently finished pipeline runs.
#[derive(Default)]
pub struct RunTracker {
    runs: Mutex<BTreeMap<String, TrackedRun>>,
}

impl RunTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self { runs: Mutex::new(BTreeMap::new()) }
    }

    /// Registers a new run as [`RunStatus::Running`] with no stage yet
    /// underway. Overwrites any prior snapshot at the same `run_id`.
    pub fn start(&self, run_id: impl Into<String>, case_uid: CaseUid, playbook: impl Into<String>, stages_total: usize, now: Timestamp) {
        let run_id = run_id.into();
        let snapshot = TrackerSnapshot {
            run_id: run_id.clone(),
            case_uid,
            playbook: playbook.into(),
            status: RunStatus::Running,
            current_stage: None,
            progress_pct: 0.0,
            stages_total,
            started_at: now,
            completed_at: None,
            error: None,
        };
        let mut runs = self.lock_runs();
        runs.insert(run_id, TrackedRun { snapshot, notify: Arc::new(Notify::new()) });
    }

    /// Records that `stage` has just started or finished for `run_id`,
    /// updating `progress_pct` from `completed_stages / stages_total`. A
    /// no-op if `run_id` is not registered (the run finished or was never
    /// started through this tracker).
    pub fn advance(&self, run_id: &str, stage: StageName, completed_stages: usize) {
        let mut runs = self.lock_runs();
        let Some(run) = runs.get_mut(run_id) else { return };
        run.snapshot.current_stage = Some(stage);
        #[allow(clippy::cast_precision_loss)]
        let pct = if run.snapshot.stages_total == 0 {
            100.0
        } else {
            (completed_stages as f64 / run.snapshot.stages_total as f64) * 100.0
        };
        run.snapshot.progress_pct = pct.min(100.0);
        run.notify.notify_waiters();
    }

    /// Marks `run_id` as [`RunStatus::Completed`].
    pub fn complete(&self, run_id: &str, now: Timestamp) {
        self.finish(run_id, RunStatus::Completed, now, None);
    }

    /// Marks `run_id` as [`RunStatus::Failed`] with `error` attached.
    pub fn fail(&self, run_id: &str, now: Timestamp, error: impl Into<String>) {
        self.finish(run_id, RunStatus::Failed, now, Some(error.into()));
    }

    /// Marks `run_id` as [`RunStatus::Cancelled`].
    pub fn cancel(&self, run_id: &str, now: Timestamp) {
        self.finish(run_id, RunStatus::Cancelled, now, None);
    }

    fn finish(&self, run_id: &str, status: RunStatus, now: Timestamp, error: Option<String>) {
        let mut runs = self.lock_runs();
        let Some(run) = runs.get_mut(run_id) else { return };
        run.snapshot.status = status;
        run.snapshot.completed_at = Some(now);
        run.snapshot.error = error;
        if status == RunStatus::Completed {
            run.snapshot.progress_pct = 100.0;
        }
        run.notify.notify_waiters();
    }

    /// Returns the current snapshot for `run_id`, if it is still tracked.
    #[must_use]
    pub fn snapshot(&self, run_id: &str) -> Option<TrackerSnapshot> {
        self.lock_runs().get(run_id).map(|run| run.snapshot.clone())
    }

    /// Returns a handle a caller can `.notified().await` to learn about the
    /// next update to `run_id`. Returns `None` if the run is not tracked.
    #[must_use]
    pub fn subscribe(&self, run_id: &str) -> Option<Arc<Notify>> {
        self.lock_runs().get(run_id).map(|run| Arc::clone(&run.notify))
    }

    /// Removes `run_id` from the registry. Safe to call on an already-absent
    /// or already-cleaned-up run.
    pub fn cleanup(&self, run_id: &str) {
        self.lock_runs().remove(run_id);
    }

    fn lock_runs(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, TrackedRun>> {
        self.runs.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
