// aegi-llm/src/lib.rs
// ============================================================================
// Module: AEGI LLM Adapters
// Description: Concrete backends for the LLM invocation, GDELT ingestion, and
//              notification delivery capabilities defined in aegi-core.
// Purpose: Keep every outbound HTTP concern (timeouts, budgets, response
//          parsing) in one crate so the analysis crate never touches reqwest.
// Dependencies: aegi-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! Three capability families live here: [`LlmClient`](aegi_core::LlmClient)
//! adapters ([`mock::RuleBasedLlmClient`] for deterministic baselines,
//! [`http::HttpLlmClient`] for a configured provider endpoint), the
//! [`gdelt::GdeltHttpProvider`] used by the GDELT monitor to poll the GDELT
//! Doc API, and [`notify::HttpNotifyCapability`], the webhook-based
//! implementation of [`NotifyCapability`](aegi_core::NotifyCapability).
//! Every adapter honors the caller's `BudgetContext` deadline and reports a
//! `DegradedOutput` rather than failing outright when a provider call times
//! out or returns something unparsable.

pub mod gdelt;
pub mod http;
pub mod mock;
pub mod notify;

pub use gdelt::GdeltError;
pub use gdelt::GdeltEvent;
pub use gdelt::GdeltHttpProvider;
pub use gdelt::GdeltProviderConfig;
pub use http::HttpLlmClient;
pub use http::HttpLlmClientConfig;
pub use mock::RuleBasedLlmClient;
pub use notify::HttpNotifyCapability;
pub use notify::NotifyWebhookConfig;
