// aegi-orchestrator/src/scheduler.rs
// ============================================================================
// Module: Scheduler
// Description: Generic cooperative periodic-task scheduler, and the GDELT
//              dual-poll tick built on top of it (§4.14).
// Purpose: Give every background loop (GDELT polling, retention sweeps) the
//          same start/stop/observe surface, so a caller only has to learn
//          it once.
// Dependencies: aegi-core, aegi-bus, aegi-llm, tokio
// ============================================================================

//! ## Overview
//! [`Scheduler`] wraps one `tokio::task::JoinHandle` behind a cooperative
//! stop signal (`tokio::sync::Notify`) and tracks the last/next poll time.
//! [`GdeltScheduler`] is the concrete instance that drives
//! [`aegi_llm::gdelt::GdeltHttpProvider::poll`] and
//! [`aegi_llm::gdelt::GdeltHttpProvider::poll_events`] on a timer, running
//! [`crate::gdelt::GdeltMonitor::scan`] over whatever the primary poll
//! returns. The secondary poll's failure is logged and never aborts the
//! primary tick — the two feeds are independent and one's absence
//! shouldn't silence anomaly detection from the other.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use aegi_core::model::Action;
use aegi_core::interfaces::AuditSink;
use aegi_core::ids::ActionUid;
use aegi_llm::GdeltHttpProvider;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::gdelt::GdeltAnomaly;
use crate::gdelt::GdeltMonitor;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Scheduler-level failures. A poll's own errors never surface here — they
/// are caught and audited so the loop itself never throws.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` was called on a scheduler that is already running.
    #[error("scheduler is already running")]
    AlreadyRunning,
}

// ============================================================================
// SECTION: Generic Scheduler
// ============================================================================

/// Shared timing state, read by [`SchedulerHandle`] and written by the
/// spawned loop.
#[derive(Debug, Default)]
struct Timing {
    last_poll_time: Option<Duration>,
    last_successful_poll_time: Option<Duration>,
    next_poll_time: Option<Duration>,
}

/// A handle to a running scheduled task: lets a caller observe timing and
/// ask the loop to stop without owning the `JoinHandle` directly.
pub struct SchedulerHandle {
    stop: Arc<Notify>,
    timing: Arc<Mutex<Timing>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SchedulerHandle {
    /// Whether the underlying task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.lock().unwrap_or_else(std::sync::PoisonError::into_inner).as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Monotonic-clock offset of the most recent poll attempt, successful or not.
    #[must_use]
    pub fn last_poll_time(&self) -> Option<Duration> {
        self.lock_timing().last_poll_time
    }

    /// Monotonic-clock offset of the most recent poll that completed without error.
    #[must_use]
    pub fn last_successful_poll_time(&self) -> Option<Duration> {
        self.lock_timing().last_successful_poll_time
    }

    /// Monotonic-clock offset of the next scheduled poll.
    #[must_use]
    pub fn next_poll_time(&self) -> Option<Duration> {
        self.lock_timing().next_poll_time
    }

    /// Signals the loop to stop after its current tick and awaits its exit.
    pub async fn stop(&self) {
        self.stop.notify_waiters();
        let task = self.task.lock().unwrap_or_else(std::sync::PoisonError::into_inner).take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    fn lock_timing(&self) -> std::sync::MutexGuard<'_, Timing> {
        self.timing.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Drives an async tick function on a fixed interval, with an initial delay
/// before the first tick and a cooperative stop signal checked between
/// ticks. The tick function itself is responsible for not panicking; a
/// panic inside it aborts the task like any other Tokio task panic, since
/// isolating it would hide a programming error rather than an expected
/// transient failure.
pub struct Scheduler;

impl Scheduler {
    /// Spawns a periodic task that calls `tick` every `interval`, waiting
    /// `initial_delay` before the first call. Returns immediately with a
    /// [`SchedulerHandle`]; the loop runs on the current Tokio runtime.
    pub fn spawn<F, Fut>(interval: Duration, initial_delay: Duration, mut tick: F) -> SchedulerHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let stop = Arc::new(Notify::new());
        let timing = Arc::new(Mutex::new(Timing::default()));
        let loop_stop = Arc::clone(&stop);
        let loop_timing = Arc::clone(&timing);
        let start = tokio::time::Instant::now();

        let task = tokio::spawn(async move {
            let mut next_at = start + initial_delay;
            loop {
                {
                    let mut timing = loop_timing.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    timing.next_poll_time = Some(next_at.duration_since(start));
                }
                tokio::select! {
                    () = tokio::time::sleep_until(next_at) => {}
                    () = loop_stop.notified() => break,
                }
                {
                    let mut timing = loop_timing.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    timing.last_poll_time = Some(tokio::time::Instant::now().duration_since(start));
                }
                tick().await;
                {
                    let mut timing = loop_timing.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                    timing.last_successful_poll_time = Some(tokio::time::Instant::now().duration_since(start));
                }
                next_at = tokio::time::Instant::now() + interval;
            }
        });

        SchedulerHandle { stop, timing, task: Mutex::new(Some(task)) }
    }
}

// ============================================================================
// SECTION: GDELT Scheduler
// ============================================================================

/// Configuration for [`GdeltScheduler::start`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GdeltSchedulerConfig {
    pub interval: Duration,
    pub initial_delay: Duration,
}

impl Default for GdeltSchedulerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(15 * 60), initial_delay: Duration::from_secs(60) }
    }
}

/// Drives [`GdeltHttpProvider`] and [`GdeltMonitor`] on a timer.
pub struct GdeltScheduler {
    provider: Arc<GdeltHttpProvider>,
    monitor: Arc<GdeltMonitor>,
    audit: Arc<dyn AuditSink>,
}

impl GdeltScheduler {
    /// Creates a scheduler over an already-constructed provider and monitor.
    #[must_use]
    pub fn new(provider: Arc<GdeltHttpProvider>, monitor: Arc<GdeltMonitor>, audit: Arc<dyn AuditSink>) -> Self {
        Self { provider, monitor, audit }
    }

    /// Starts the periodic dual-poll tick, returning a handle to observe or
    /// stop it. The primary poll's events are always scanned for anomalies;
    /// the secondary poll (the raw Events table) only contributes an audit
    /// action today — its events are not yet folded into the primary feed,
    /// since the monitor has no way to distinguish a duplicate event seen
    /// through both feeds.
    pub fn start(self: Arc<Self>, config: GdeltSchedulerConfig) -> SchedulerHandle {
        let scheduler = Arc::clone(&self);
        Scheduler::spawn(config.interval, config.initial_delay, move || {
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.tick().await }
        })
    }

    async fn tick(&self) {
        let anomalies = match self.provider.poll().await {
            Ok(result) => {
                self.record(
                    "gdelt.poll",
                    serde_json::json!({ "events": result.events.len(), "dropped": result.dropped }),
                );
                self.monitor.scan(&result.events)
            }
            Err(err) => {
                self.record("gdelt.poll_failed", serde_json::json!({ "error": err.to_string() }));
                Vec::new()
            }
        };

        match self.provider.poll_events().await {
            Ok(result) => self.record(
                "gdelt.poll_events",
                serde_json::json!({ "events": result.events.len(), "dropped": result.dropped }),
            ),
            Err(err) => self.record("gdelt.poll_events_failed", serde_json::json!({ "error": err.to_string() })),
        }

        self.record("gdelt.scan", serde_json::json!({ "anomalies": anomalies.len() }));
    }

    fn record(&self, operation: &str, detail: serde_json::Value) {
        self.audit.record_action(&Action {
            uid: ActionUid::mint(),
            case_uid: None,
            operation: operation.to_string(),
            actor: "gdelt_scheduler".to_string(),
            detail,
            created_at: aegi_core::time::Timestamp::new(time::OffsetDateTime::now_utc()),
        });
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
