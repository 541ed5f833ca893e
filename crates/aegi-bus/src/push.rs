// aegi-bus/src/push.rs
// ============================================================================
// Module: Push Notification Engine
// Description: Wildcard bus handler that dedups, matches, throttles, and
//              delivers events to subscribers (§4.13).
// Purpose: Turn bus events into delivered push notifications without the
//          emitting stage needing to know who, if anyone, is listening.
// Dependencies: aegi-core, aegi-bus::bus
// ============================================================================

//! ## Overview
//! [`PushEngine`] is registered on the [`crate::bus::EventBus`] as a
//! wildcard [`crate::bus::EventHandler`]. For each event it runs:
//! 1. dedup against [`EventLog`] by `event.source_event_uid`,
//! 2. rule match (`case_uid` + topic filter + `enabled` + `priority_threshold`
//!    + `event_types`) against `Rule` subscriptions,
//! 3. semantic match (cosine similarity against a stored interest
//!    embedding, gated by the same `enabled`/`priority_threshold`/
//!    `event_types` conditions) against `Semantic` subscriptions,
//! 4. merge, keeping the highest-scoring candidate per user,
//! 5. throttle against each subscription's `rate_limit_per_hour`, bypassed
//!    for [`EventSeverity::Critical`] events,
//! 6. deliver through a [`NotifyCapability`], recording a [`PushLog`] row
//!    regardless of outcome,
//! 7. finalize the [`EventLog`] row to [`EventLogStatus::Done`], with
//!    `push_count` set to the number of deliveries from this call.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use aegi_core::Action;
use aegi_core::AegiEvent;
use aegi_core::AuditSink;
use aegi_core::EventLog;
use aegi_core::EventLogStatus;
use aegi_core::EventSeverity;
use aegi_core::NotifyCapability;
use aegi_core::PushLog;
use aegi_core::PushLogStatus;
use aegi_core::Subscription;
use aegi_core::SubscriptionType;
use aegi_core::Timestamp;
use aegi_core::ToolTrace;
use aegi_core::ToolTraceStatus;
use aegi_core::ids::BusEventUid;
use aegi_core::ids::EventLogUid;
use aegi_core::ids::PushLogUid;
use aegi_core::ids::SubscriptionUid;
use aegi_core::ids::ToolTraceUid;
use aegi_core::ids::UserId;
use async_trait::async_trait;

use crate::bus::EventHandler;

/// Minimum cosine similarity between an event's embedding and a semantic
/// subscription's stored interest embedding for the subscription to match.
pub const SEMANTIC_MATCH_THRESHOLD: f64 = 0.5;

/// Supplies an embedding for an event's payload, used for semantic
/// subscription matching. Colocated here rather than depending on an LLM
/// crate directly, so the bus stays usable without one.
#[async_trait]
pub trait EventEmbedder: Send + Sync {
    /// Returns an embedding for `event`, or `None` if one could not be
    /// produced (e.g. the provider degraded). A `None` result excludes the
    /// event from semantic matching for this call; it is not an error.
    async fn embed_event(&self, event: &AegiEvent) -> Option<Vec<f32>>;
}

/// How a [`MatchCandidate`] came to match an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// Matched by exact topic filter (or the `"*"` wildcard filter).
    Rule,
    /// Matched by interest-embedding cosine similarity.
    Semantic,
}

/// One subscription that matched an event, before throttling.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// Subscription that matched.
    pub subscription_uid: SubscriptionUid,
    /// Subscriber.
    pub user_id: UserId,
    /// Match strength; `1.0` for rule matches, cosine similarity for
    /// semantic matches.
    pub score: f64,
    /// How the match was produced.
    pub method: MatchMethod,
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (mag_a * mag_b))
}

fn now() -> Timestamp {
    Timestamp::new(time::OffsetDateTime::now_utc())
}

/// Step-2 gating shared by rule and semantic matching: the subscription's
/// case target, `enabled` flag, `priority_threshold`, and `event_types`
/// restriction must all clear before its topic/similarity check runs.
fn subscription_targets(subscription: &Subscription, event: &AegiEvent) -> bool {
    subscription.enabled
        && Some(&subscription.case_uid) == event.case_uid.as_ref()
        && subscription.priority_threshold <= event.severity
        && (subscription.event_types.is_empty() || subscription.event_types.contains(&event.topic))
}

struct State {
    subscriptions: BTreeMap<SubscriptionUid, Subscription>,
    interest_embeddings: BTreeMap<SubscriptionUid, Vec<f32>>,
    event_log: BTreeMap<BusEventUid, EventLog>,
    push_log: Vec<PushLog>,
}

impl State {
    fn new() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            interest_embeddings: BTreeMap::new(),
            event_log: BTreeMap::new(),
            push_log: Vec::new(),
        }
    }
}

/// Matches, throttles, and delivers bus events to registered subscribers.
pub struct PushEngine {
    state: Mutex<State>,
    notify: Arc<dyn NotifyCapability>,
    embedder: Option<Arc<dyn EventEmbedder>>,
    audit: Arc<dyn AuditSink>,
}

impl PushEngine {
    /// Creates a push engine delivering through `notify`. `embedder` is
    /// optional; without one, semantic subscriptions never match.
    #[must_use]
    pub fn new(
        notify: Arc<dyn NotifyCapability>,
        embedder: Option<Arc<dyn EventEmbedder>>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { state: Mutex::new(State::new()), notify, embedder, audit }
    }

    /// Registers or replaces a subscription.
    pub fn register_subscription(&self, subscription: Subscription) {
        self.lock_state().subscriptions.insert(subscription.uid.clone(), subscription);
    }

    /// Stores the interest embedding used to match a semantic subscription.
    /// Has no effect on rule subscriptions.
    pub fn register_interest_embedding(&self, subscription_uid: SubscriptionUid, embedding: Vec<f32>) {
        self.lock_state().interest_embeddings.insert(subscription_uid, embedding);
    }

    /// Returns every [`PushLog`] row recorded for `source_event_uid`.
    #[must_use]
    pub fn push_logs_for(&self, source_event_uid: &BusEventUid) -> Vec<PushLog> {
        self.lock_state()
            .push_log
            .iter()
            .filter(|row| &row.source_event_uid == source_event_uid)
            .cloned()
            .collect()
    }

    /// Number of successful deliveries recorded for `source_event_uid`.
    /// Derived from [`PushLog`] rows rather than a counter on [`EventLog`].
    #[must_use]
    pub fn delivered_count(&self, source_event_uid: &BusEventUid) -> usize {
        self.lock_state()
            .push_log
            .iter()
            .filter(|row| {
                &row.source_event_uid == source_event_uid && row.status == PushLogStatus::Delivered
            })
            .count()
    }

    /// Returns the [`EventLog`] row for `source_event_uid`, once [`process`]
    /// has recorded one for it.
    ///
    /// [`process`]: Self::process
    #[must_use]
    pub fn event_log_for(&self, source_event_uid: &BusEventUid) -> Option<EventLog> {
        self.lock_state().event_log.get(source_event_uid).cloned()
    }

    /// Runs the full dedup/match/throttle/deliver pipeline for `event`,
    /// returning every [`PushLog`] row written (empty when the event was a
    /// duplicate or nothing matched).
    pub async fn process(&self, event: &AegiEvent) -> Vec<PushLog> {
        if self.mark_event_seen(event) == EventLogStatus::Duplicate {
            return Vec::new();
        }

        let mut candidates = self.rule_matches(event);
        candidates.extend(self.semantic_matches(event).await);
        let merged = merge_by_user(candidates);

        let mut rows = Vec::with_capacity(merged.len());
        for candidate in merged {
            let Some(subscription) = self.lock_state().subscriptions.get(&candidate.subscription_uid).cloned()
            else {
                continue;
            };
            rows.push(self.deliver_to(&subscription, event).await);
        }

        let delivered = u32::try_from(rows.iter().filter(|row| row.status == PushLogStatus::Delivered).count())
            .unwrap_or(u32::MAX);
        self.finalize_event_log(&event.source_event_uid, delivered);
        rows
    }

    fn mark_event_seen(&self, event: &AegiEvent) -> EventLogStatus {
        let mut state = self.lock_state();
        if state.event_log.contains_key(&event.source_event_uid) {
            return EventLogStatus::Duplicate;
        }
        state.event_log.insert(
            event.source_event_uid.clone(),
            EventLog {
                uid: EventLogUid::mint(),
                source_event_uid: event.source_event_uid.clone(),
                status: EventLogStatus::New,
                push_count: 0,
                created_at: now(),
            },
        );
        EventLogStatus::New
    }

    fn finalize_event_log(&self, source_event_uid: &BusEventUid, delivered: u32) {
        let mut state = self.lock_state();
        if let Some(row) = state.event_log.get_mut(source_event_uid) {
            row.status = EventLogStatus::Done;
            row.push_count += delivered;
        }
    }

    fn rule_matches(&self, event: &AegiEvent) -> Vec<MatchCandidate> {
        self.lock_state()
            .subscriptions
            .values()
            .filter(|subscription| subscription.subscription_type == SubscriptionType::Rule)
            .filter(|subscription| subscription_targets(subscription, event))
            .filter(|subscription| subscription.filter == "*" || subscription.filter == event.topic)
            .map(|subscription| MatchCandidate {
                subscription_uid: subscription.uid.clone(),
                user_id: subscription.user_id.clone(),
                score: 1.0,
                method: MatchMethod::Rule,
            })
            .collect()
    }

    async fn semantic_matches(&self, event: &AegiEvent) -> Vec<MatchCandidate> {
        let Some(embedder) = self.embedder.as_ref() else {
            return Vec::new();
        };
        let Some(event_embedding) = embedder.embed_event(event).await else {
            return Vec::new();
        };

        let semantic_subscriptions: Vec<(SubscriptionUid, UserId)> = self
            .lock_state()
            .subscriptions
            .values()
            .filter(|subscription| subscription.subscription_type == SubscriptionType::Semantic)
            .filter(|subscription| subscription_targets(subscription, event))
            .map(|subscription| (subscription.uid.clone(), subscription.user_id.clone()))
            .collect();

        let mut candidates = Vec::new();
        for (subscription_uid, user_id) in semantic_subscriptions {
            let interest = self.lock_state().interest_embeddings.get(&subscription_uid).cloned();
            let Some(interest) = interest else {
                continue;
            };
            let score = cosine_similarity(&event_embedding, &interest);
            if score >= SEMANTIC_MATCH_THRESHOLD {
                candidates.push(MatchCandidate {
                    subscription_uid,
                    user_id,
                    score,
                    method: MatchMethod::Semantic,
                });
            }
        }
        candidates
    }

    async fn deliver_to(&self, subscription: &Subscription, event: &AegiEvent) -> PushLog {
        if event.severity != EventSeverity::Critical && self.rate_limited(subscription) {
            let row = PushLog {
                uid: PushLogUid::mint(),
                subscription_uid: subscription.uid.clone(),
                source_event_uid: event.source_event_uid.clone(),
                status: PushLogStatus::RateLimited,
                created_at: now(),
            };
            self.lock_state().push_log.push(row.clone());
            return row;
        }

        let start = std::time::Instant::now();
        let outcome = self.notify.deliver(subscription, &event.uid, &event.payload).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = match &outcome {
            Ok(()) => PushLogStatus::Delivered,
            Err(_) => PushLogStatus::Failed,
        };
        self.audit.record_tool_trace(&ToolTrace {
            uid: ToolTraceUid::mint(),
            capability: "notify.deliver".to_string(),
            status: if outcome.is_ok() { ToolTraceStatus::Ok } else { ToolTraceStatus::Failed },
            duration_ms,
            detail: serde_json::json!({
                "subscription_uid": subscription.uid,
                "event_uid": event.uid,
                "error": outcome.as_ref().err().map(std::string::ToString::to_string),
            }),
            created_at: now(),
        });
        self.audit.record_action(&Action {
            uid: aegi_core::ids::ActionUid::mint(),
            case_uid: event.case_uid.clone(),
            operation: "push.delivery_attempted".to_string(),
            actor: "push_engine".to_string(),
            detail: serde_json::json!({"subscription_uid": subscription.uid, "status": status}),
            created_at: now(),
        });

        let row = PushLog {
            uid: PushLogUid::mint(),
            subscription_uid: subscription.uid.clone(),
            source_event_uid: event.source_event_uid.clone(),
            status,
            created_at: now(),
        };
        self.lock_state().push_log.push(row.clone());
        row
    }

    fn rate_limited(&self, subscription: &Subscription) -> bool {
        let deadline = now();
        let recent_deliveries = self
            .lock_state()
            .push_log
            .iter()
            .filter(|row| {
                row.subscription_uid == subscription.uid
                    && row.status == PushLogStatus::Delivered
                    && deadline.hours_since(row.created_at) <= 1.0
            })
            .count();
        u32::try_from(recent_deliveries).unwrap_or(u32::MAX) >= subscription.rate_limit_per_hour
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn merge_by_user(candidates: Vec<MatchCandidate>) -> Vec<MatchCandidate> {
    let mut best: BTreeMap<UserId, MatchCandidate> = BTreeMap::new();
    for candidate in candidates {
        best.entry(candidate.user_id.clone())
            .and_modify(|existing| {
                if candidate.score > existing.score {
                    *existing = candidate.clone();
                }
            })
            .or_insert(candidate);
    }
    best.into_values().collect()
}

#[async_trait]
impl EventHandler for PushEngine {
    async fn handle(&self, event: &AegiEvent) {
        self.process(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::NotifyError;
    use aegi_core::ids::CaseUid;

    struct RecordingNotifier {
        calls: std::sync::Mutex<Vec<SubscriptionUid>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn new(fail: bool) -> Self {
            Self { calls: std::sync::Mutex::new(Vec::new()), fail }
        }
    }

    #[async_trait]
    impl NotifyCapability for RecordingNotifier {
        async fn deliver(
            &self,
            subscription: &Subscription,
            _event_uid: &BusEventUid,
            _payload: &serde_json::Value,
        ) -> Result<(), NotifyError> {
            self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner).push(subscription.uid.clone());
            if self.fail {
                return Err(NotifyError::Unreachable("offline".to_string()));
            }
            Ok(())
        }
    }

    struct StubEmbedder;

    #[async_trait]
    impl EventEmbedder for StubEmbedder {
        async fn embed_event(&self, event: &AegiEvent) -> Option<Vec<f32>> {
            if event.topic.contains("unrelated") {
                Some(vec![0.0, 1.0])
            } else {
                Some(vec![1.0, 0.0])
            }
        }
    }

    fn event(case_uid: CaseUid, topic: &str, severity: EventSeverity) -> AegiEvent {
        AegiEvent::new(topic, Some(case_uid), severity, serde_json::json!({"detail": "x"}), now())
    }

    fn rule_subscription(case_uid: CaseUid, filter: &str, rate_limit_per_hour: u32) -> Subscription {
        Subscription {
            uid: SubscriptionUid::mint(),
            case_uid,
            user_id: UserId::mint(),
            subscription_type: SubscriptionType::Rule,
            filter: filter.to_string(),
            rate_limit_per_hour,
            enabled: true,
            priority_threshold: EventSeverity::Info,
            event_types: Vec::new(),
            created_at: now(),
        }
    }

    #[tokio::test]
    async fn a_matching_rule_subscription_is_delivered() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        let subscription = rule_subscription(case_uid.clone(), "hypothesis.posterior_updated", 10);
        engine.register_subscription(subscription.clone());

        let event = event(case_uid, "hypothesis.posterior_updated", EventSeverity::Notable);
        let rows = engine.process(&event).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PushLogStatus::Delivered);
        assert_eq!(engine.delivered_count(&event.uid), 1);
    }

    #[tokio::test]
    async fn a_non_matching_topic_filter_does_not_deliver() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        engine.register_subscription(rule_subscription(case_uid.clone(), "forecast.published", 10));

        let event = event(case_uid, "hypothesis.posterior_updated", EventSeverity::Notable);
        let rows = engine.process(&event).await;

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn a_duplicate_event_is_processed_only_once() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        engine.register_subscription(rule_subscription(case_uid.clone(), "*", 10));

        let event = event(case_uid, "gdelt.anomaly_detected", EventSeverity::Notable);
        let first = engine.process(&event).await;
        let second = engine.process(&event).await;

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(engine.delivered_count(&event.uid), 1);
    }

    #[tokio::test]
    async fn rate_limit_suppresses_delivery_past_the_per_hour_cap() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        let subscription = rule_subscription(case_uid.clone(), "*", 1);
        engine.register_subscription(subscription);

        let first = event(case_uid.clone(), "quality.scored", EventSeverity::Notable);
        let second = event(case_uid, "quality.scored", EventSeverity::Notable);
        let first_rows = engine.process(&first).await;
        let second_rows = engine.process(&second).await;

        assert_eq!(first_rows[0].status, PushLogStatus::Delivered);
        assert_eq!(second_rows[0].status, PushLogStatus::RateLimited);
    }

    #[tokio::test]
    async fn critical_severity_bypasses_the_rate_limit() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        engine.register_subscription(rule_subscription(case_uid.clone(), "*", 1));

        let first = event(case_uid.clone(), "quality.scored", EventSeverity::Critical);
        let second = event(case_uid, "quality.scored", EventSeverity::Critical);
        let first_rows = engine.process(&first).await;
        let second_rows = engine.process(&second).await;

        assert_eq!(first_rows[0].status, PushLogStatus::Delivered);
        assert_eq!(second_rows[0].status, PushLogStatus::Delivered);
    }

    #[tokio::test]
    async fn semantic_subscription_matches_by_interest_embedding_similarity() {
        let case_uid = CaseUid::mint();
        let engine = PushEngine::new(
            Arc::new(RecordingNotifier::new(false)),
            Some(Arc::new(StubEmbedder)),
            Arc::new(aegi_core::NoopAuditSink),
        );
        let subscription = Subscription {
            uid: SubscriptionUid::mint(),
            case_uid: case_uid.clone(),
            user_id: UserId::mint(),
            subscription_type: SubscriptionType::Semantic,
            filter: "sanctions evasion".to_string(),
            rate_limit_per_hour: 10,
            enabled: true,
            priority_threshold: EventSeverity::Info,
            event_types: Vec::new(),
            created_at: now(),
        };
        engine.register_subscription(subscription.clone());
        engine.register_interest_embedding(subscription.uid.clone(), vec![1.0, 0.0]);

        let related = event(case_uid.clone(), "narrative.built", EventSeverity::Notable);
        let unrelated = event(case_uid, "unrelated.topic", EventSeverity::Notable);

        let related_rows = engine.process(&related).await;
        let unrelated_rows = engine.process(&unrelated).await;

        assert_eq!(related_rows.len(), 1);
        assert!(unrelated_rows.is_empty());
    }

    #[tokio::test]
    async fn a_failed_delivery_is_logged_as_failed_not_dropped() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(true)), None, Arc::new(aegi_core::NoopAuditSink));
        engine.register_subscription(rule_subscription(case_uid.clone(), "*", 10));

        let event = event(case_uid, "quality.scored", EventSeverity::Notable);
        let rows = engine.process(&event).await;

        assert_eq!(rows[0].status, PushLogStatus::Failed);
        assert_eq!(engine.delivered_count(&event.uid), 0);
    }

    #[tokio::test]
    async fn a_disabled_subscription_never_matches() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        let mut subscription = rule_subscription(case_uid.clone(), "*", 10);
        subscription.enabled = false;
        engine.register_subscription(subscription);

        let event = event(case_uid, "quality.scored", EventSeverity::Notable);
        let rows = engine.process(&event).await;

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn priority_threshold_above_event_severity_suppresses_delivery() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        let mut subscription = rule_subscription(case_uid.clone(), "*", 10);
        subscription.priority_threshold = EventSeverity::Critical;
        engine.register_subscription(subscription);

        let event = event(case_uid, "quality.scored", EventSeverity::Notable);
        let rows = engine.process(&event).await;

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn event_types_restriction_excludes_non_listed_topics() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        let mut subscription = rule_subscription(case_uid.clone(), "*", 10);
        subscription.event_types = vec!["forecast.published".to_string()];
        engine.register_subscription(subscription);

        let event = event(case_uid, "quality.scored", EventSeverity::Notable);
        let rows = engine.process(&event).await;

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn two_events_sharing_a_composed_source_event_uid_dedup() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        engine.register_subscription(rule_subscription(case_uid.clone(), "*", 10));

        let shared = BusEventUid::new("claim:case-1:chunk-1:1000");
        let first = event(case_uid.clone(), "claim.extracted", EventSeverity::Info)
            .with_source_event_uid(shared.clone());
        let second =
            event(case_uid, "claim.extracted", EventSeverity::Info).with_source_event_uid(shared.clone());

        let first_rows = engine.process(&first).await;
        let second_rows = engine.process(&second).await;

        assert_eq!(first_rows.len(), 1);
        assert!(second_rows.is_empty());
        assert_eq!(engine.delivered_count(&shared), 1);
    }

    #[tokio::test]
    async fn processing_finalizes_the_event_log_to_done_with_push_count() {
        let case_uid = CaseUid::mint();
        let engine =
            PushEngine::new(Arc::new(RecordingNotifier::new(false)), None, Arc::new(aegi_core::NoopAuditSink));
        engine.register_subscription(rule_subscription(case_uid.clone(), "*", 10));

        let event = event(case_uid, "quality.scored", EventSeverity::Notable);
        engine.process(&event).await;

        let row = engine.event_log_for(&event.source_event_uid).expect("event log row");
        assert_eq!(row.status, EventLogStatus::Done);
        assert_eq!(row.push_count, 1);
    }
}
