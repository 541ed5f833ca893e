// aegi-core/src/model/subscription.rs
// ============================================================================
// Module: Subscription and Delivery Logs
// Description: Push-notification subscriptions and their dedup/delivery logs.
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use super::bus_event::EventSeverity;
use crate::ids::BusEventUid;
use crate::ids::CaseUid;
use crate::ids::EventLogUid;
use crate::ids::PushLogUid;
use crate::ids::SubscriptionUid;
use crate::ids::UserId;
use crate::time::Timestamp;

/// How a subscription selects the events it wants delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    /// Matches events by an explicit topic/rule filter.
    Rule,
    /// Matches events by semantic similarity to a stored query.
    Semantic,
}

/// A user's registration to receive push notifications for matching events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Globally unique identifier.
    pub uid: SubscriptionUid,
    /// Case scope.
    pub case_uid: CaseUid,
    /// Subscribing user.
    pub user_id: UserId,
    /// Matching strategy.
    pub subscription_type: SubscriptionType,
    /// Topic filter (rule subscriptions) or query text (semantic subscriptions).
    pub filter: String,
    /// Maximum deliveries per rolling window, for rate limiting.
    pub rate_limit_per_hour: u32,
    /// Whether the subscription currently receives deliveries. A disabled
    /// subscription is skipped by both the rule and semantic match passes.
    pub enabled: bool,
    /// Minimum event severity this subscription wants delivered; an event
    /// below this threshold is suppressed even on an otherwise matching
    /// subscription.
    pub priority_threshold: EventSeverity,
    /// Topics this subscription restricts itself to. Empty means no
    /// restriction (matches any topic the filter/similarity otherwise
    /// selects).
    pub event_types: Vec<String>,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Dedup status of a processed bus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLogStatus {
    /// Event processed for the first time.
    New,
    /// Event already seen; matching was skipped.
    Duplicate,
    /// Matching and delivery finished; `push_count` on the row is final.
    Done,
}

/// Dedup row keyed by the source event UID, preventing the push engine from
/// re-matching an event it has already processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    /// Globally unique identifier.
    pub uid: EventLogUid,
    /// Source bus event this row dedups.
    pub source_event_uid: BusEventUid,
    /// Dedup status.
    pub status: EventLogStatus,
    /// Number of subscriptions the event was actually delivered to.
    pub push_count: u32,
    /// Time the event was first seen.
    pub created_at: Timestamp,
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PushLogStatus {
    /// Delivered to the subscriber.
    Delivered,
    /// Suppressed by the subscriber's rate limit.
    RateLimited,
    /// Delivery attempt failed.
    Failed,
}

/// One delivery attempt of an event to a subscriber, recorded for audit
/// regardless of outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushLog {
    /// Globally unique identifier.
    pub uid: PushLogUid,
    /// Subscription this delivery was attempted for.
    pub subscription_uid: SubscriptionUid,
    /// Source bus event being delivered.
    pub source_event_uid: BusEventUid,
    /// Outcome of the attempt.
    pub status: PushLogStatus,
    /// Time the attempt was made.
    pub created_at: Timestamp,
}
