// aegi-bus/src/bus.rs
// ============================================================================
// Module: AEGI Event Bus
// Description: In-process publish/subscribe bus keyed by dotted topic, plus
//              a `"*"` wildcard handler list.
// Purpose: Decouple pipeline stages and the push engine from direct calls
//          into one another.
// Dependencies: aegi-core, tokio
// ============================================================================

//! ## Overview
//! Handlers register against an exact topic or the `"*"` wildcard.
//! [`EventBus::emit_and_wait`] runs every matching handler to completion
//! before returning; [`EventBus::emit`] schedules them on the Tokio runtime
//! without waiting, and [`EventBus::drain`] awaits every outstanding
//! scheduled call. A handler that panics is caught and recorded through the
//! bus's [`AuditSink`] rather than unwinding into its siblings or the
//! caller. A single process-wide instance is obtained through [`get_bus`];
//! [`reset_bus`] clears it, for test isolation.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::OnceLock;

use aegi_core::Action;
use aegi_core::AegiEvent;
use aegi_core::AuditSink;
use aegi_core::NoopAuditSink;
use aegi_core::Timestamp;
use aegi_core::ids::ActionUid;
use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;

/// Errors surfaced by bus operations. Handler failures never reach here —
/// they are caught and audited — this is reserved for bus-level misuse.
#[derive(Debug, Error)]
pub enum BusError {
    /// A topic subscription was registered with an empty topic string.
    #[error("topic must be non-empty; use subscribe_wildcard for a catch-all handler")]
    EmptyTopic,
}

/// Handles one bus event. Implementations must not assume ordering between
/// concurrently emitted events or between sibling handlers on the same
/// event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Reacts to one emitted event. A panic inside this call is caught by
    /// the bus and logged; it never propagates to other handlers.
    async fn handle(&self, event: &AegiEvent);
}

struct Registry {
    by_topic: BTreeMap<String, Vec<Arc<dyn EventHandler>>>,
    wildcard: Vec<Arc<dyn EventHandler>>,
}

impl Registry {
    fn new() -> Self {
        Self { by_topic: BTreeMap::new(), wildcard: Vec::new() }
    }

    fn matching(&self, topic: &str) -> Vec<Arc<dyn EventHandler>> {
        let mut handlers = self.by_topic.get(topic).cloned().unwrap_or_default();
        handlers.extend(self.wildcard.iter().cloned());
        handlers
    }
}

/// In-process event bus with topic and wildcard subscriptions.
pub struct EventBus {
    registry: Mutex<Registry>,
    outstanding: Mutex<JoinSet<()>>,
    audit: Arc<dyn AuditSink>,
}

impl EventBus {
    /// Creates a bus that records handler panics through `audit`.
    #[must_use]
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self { registry: Mutex::new(Registry::new()), outstanding: Mutex::new(JoinSet::new()), audit }
    }

    /// Registers a handler for an exact topic.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::EmptyTopic`] when `topic` is empty.
    pub fn subscribe(
        &self,
        topic: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), BusError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(BusError::EmptyTopic);
        }
        let mut registry = self.lock_registry();
        registry.by_topic.entry(topic).or_default().push(handler);
        Ok(())
    }

    /// Registers a handler invoked for every event regardless of topic.
    pub fn subscribe_wildcard(&self, handler: Arc<dyn EventHandler>) {
        self.lock_registry().wildcard.push(handler);
    }

    /// Runs every handler matching `event.topic` to completion before
    /// returning. A handler panic is caught and audited; it does not stop
    /// sibling handlers from running.
    pub async fn emit_and_wait(&self, event: AegiEvent) {
        let handlers = self.lock_registry().matching(&event.topic);
        let event = Arc::new(event);
        let mut set = JoinSet::new();
        for handler in handlers {
            let event = Arc::clone(&event);
            set.spawn(async move { handler.handle(&event).await });
        }
        while let Some(result) = set.join_next().await {
            self.audit_handler_result(&event.topic, result);
        }
    }

    /// Schedules every handler matching `event.topic` without waiting for
    /// them to complete. Call [`EventBus::drain`] to await them.
    pub fn emit(&self, event: AegiEvent) {
        let handlers = self.lock_registry().matching(&event.topic);
        let event = Arc::new(event);
        let mut outstanding = self.lock_outstanding();
        for handler in handlers {
            let event = Arc::clone(&event);
            outstanding.spawn(async move { handler.handle(&event).await });
        }
    }

    /// Awaits every handler call scheduled by a prior [`EventBus::emit`]
    /// that has not yet completed.
    pub async fn drain(&self) {
        let mut taken = {
            let mut outstanding = self.lock_outstanding();
            std::mem::take(&mut *outstanding)
        };
        while let Some(result) = taken.join_next().await {
            self.audit_handler_result("*", result);
        }
    }

    fn audit_handler_result(&self, topic: &str, result: Result<(), tokio::task::JoinError>) {
        if let Err(join_error) = result {
            self.audit.record_action(&Action {
                uid: ActionUid::mint(),
                case_uid: None,
                operation: "bus.handler_panicked".to_string(),
                actor: "event_bus".to_string(),
                detail: serde_json::json!({"topic": topic, "error": join_error.to_string()}),
                created_at: Timestamp::new(time::OffsetDateTime::now_utc()),
            });
        }
    }

    fn lock_registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_outstanding(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.outstanding.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

static INSTANCE: OnceLock<Mutex<Option<Arc<EventBus>>>> = OnceLock::new();

fn cell() -> &'static Mutex<Option<Arc<EventBus>>> {
    INSTANCE.get_or_init(|| Mutex::new(None))
}

/// Returns the process-wide bus instance, creating one backed by
/// [`NoopAuditSink`] on first access.
#[must_use]
pub fn get_bus() -> Arc<EventBus> {
    let mut guard = cell().lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    guard.get_or_insert_with(|| Arc::new(EventBus::new(Arc::new(NoopAuditSink)))).clone()
}

/// Clears the process-wide bus instance. The next [`get_bus`] call creates a
/// fresh one. Intended as a test hook.
pub fn reset_bus() {
    let mut guard = cell().lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    *guard = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::EventSeverity;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    fn event(topic: &str) -> AegiEvent {
        AegiEvent::new(topic, None, EventSeverity::Info, serde_json::json!({}), Timestamp::new(time::OffsetDateTime::now_utc()))
    }

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &AegiEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl EventHandler for PanickingHandler {
        async fn handle(&self, _event: &AegiEvent) {
            panic!("handler exploded");
        }
    }

    #[tokio::test]
    async fn emit_and_wait_runs_topic_and_wildcard_handlers() {
        let bus = EventBus::new(Arc::new(NoopAuditSink));
        let topic_count = Arc::new(AtomicUsize::new(0));
        let wildcard_count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("hypothesis.updated", Arc::new(CountingHandler(Arc::clone(&topic_count)))).unwrap();
        bus.subscribe_wildcard(Arc::new(CountingHandler(Arc::clone(&wildcard_count))));

        bus.emit_and_wait(event("hypothesis.updated")).await;

        assert_eq!(topic_count.load(Ordering::SeqCst), 1);
        assert_eq!(wildcard_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn emit_and_wait_does_not_run_handlers_of_other_topics() {
        let bus = EventBus::new(Arc::new(NoopAuditSink));
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("hypothesis.updated", Arc::new(CountingHandler(Arc::clone(&count)))).unwrap();

        bus.emit_and_wait(event("forecast.published")).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn a_panicking_handler_does_not_block_its_siblings() {
        let bus = EventBus::new(Arc::new(NoopAuditSink));
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe_wildcard(Arc::new(PanickingHandler));
        bus.subscribe_wildcard(Arc::new(CountingHandler(Arc::clone(&count))));

        bus.emit_and_wait(event("gdelt.anomaly_detected")).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn emit_then_drain_runs_scheduled_handlers() {
        let bus = EventBus::new(Arc::new(NoopAuditSink));
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe_wildcard(Arc::new(CountingHandler(Arc::clone(&count))));

        bus.emit(event("quality.scored"));
        bus.drain().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribe_rejects_empty_topic() {
        let bus = EventBus::new(Arc::new(NoopAuditSink));
        let result = bus.subscribe("", Arc::new(PanickingHandler));
        assert!(matches!(result, Err(BusError::EmptyTopic)));
    }

    #[test]
    fn get_bus_returns_the_same_instance_until_reset() {
        reset_bus();
        let first = get_bus();
        let second = get_bus();
        assert!(Arc::ptr_eq(&first, &second));
        reset_bus();
        let third = get_bus();
        assert!(!Arc::ptr_eq(&first, &third));
    }
}
