// aegi-llm/src/notify.rs
// ============================================================================
// Module: HTTP Notify Capability
// Description: Webhook-based implementation of NotifyCapability.
// Purpose: Deliver bus events to subscribers' configured webhook endpoints
//          (§4.13 push engine "deliver" step).
// Dependencies: aegi-core, reqwest
// ============================================================================

//! ## Overview
//! Each subscriber's `user_id` is resolved to a webhook URL through a static
//! map supplied at construction (loaded from configuration by the
//! orchestrator; see `aegi-config`). A user with no registered webhook is
//! reported as [`NotifyError::Unreachable`] rather than silently dropped, so
//! the push engine's failure bookkeeping (a `PushLog` row with
//! `status = "failed"`) stays accurate.

use std::collections::BTreeMap;
use std::time::Duration;

use aegi_core::NotifyCapability;
use aegi_core::NotifyError;
use aegi_core::ids::BusEventUid;
use aegi_core::model::Subscription;
use async_trait::async_trait;

/// Configuration mapping subscriber user IDs to webhook delivery URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyWebhookConfig {
    /// Webhook URL keyed by `user_id`.
    pub webhooks_by_user: BTreeMap<String, String>,
    /// Request timeout.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for NotifyWebhookConfig {
    fn default() -> Self {
        Self {
            webhooks_by_user: BTreeMap::new(),
            timeout_ms: 5_000,
            user_agent: "aegi-core/0.1".to_string(),
        }
    }
}

/// Webhook-based push notification delivery.
pub struct HttpNotifyCapability {
    config: NotifyWebhookConfig,
    client: reqwest::Client,
}

impl HttpNotifyCapability {
    /// Creates a new HTTP notify capability.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Transport`] when the HTTP client cannot be
    /// built.
    pub fn new(config: NotifyWebhookConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| NotifyError::Transport(err.to_string()))?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl NotifyCapability for HttpNotifyCapability {
    async fn deliver(
        &self,
        subscription: &Subscription,
        event_uid: &BusEventUid,
        payload: &serde_json::Value,
    ) -> Result<(), NotifyError> {
        let user_key = subscription.user_id.as_str();
        let webhook_url = self.config.webhooks_by_user.get(user_key).ok_or_else(|| {
            NotifyError::Unreachable(format!("no webhook registered for user '{user_key}'"))
        })?;

        let body = serde_json::json!({
            "subscription_uid": subscription.uid.as_str(),
            "event_uid": event_uid.as_str(),
            "payload": payload,
        });

        let timeout = Duration::from_millis(self.config.timeout_ms);
        let call = self.client.post(webhook_url).json(&body).send();
        let response = tokio::time::timeout(timeout, call)
            .await
            .map_err(|_| NotifyError::Transport("webhook request timed out".to_string()))?
            .map_err(|err| NotifyError::Transport(err.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Unreachable(format!(
                "webhook responded with status {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_succeeds_with_empty_map() {
        let capability = HttpNotifyCapability::new(NotifyWebhookConfig::default());
        assert!(capability.is_ok());
    }
}
