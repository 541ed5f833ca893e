// aegi-llm/src/http.rs
// ============================================================================
// Module: HTTP LLM Client
// Description: LlmClient adapter calling a configured chat-completion style
//              HTTP endpoint, honoring BudgetContext deadlines.
// Purpose: Give the claim extractor, causal reasoner, and report/chat
//          renderers a real model without coupling them to reqwest.
// Dependencies: aegi-core, reqwest, tokio
// ============================================================================

//! ## Overview
//! The HTTP client issues one POST per invocation against a single
//! configured endpoint (`chat/completions`-shaped request/response bodies
//! are assumed; point `endpoint_url` at a provider's compatible route).
//! Every call is wrapped in `tokio::time::timeout` against the caller's
//! `BudgetContext::deadline`; deadline expiry, transport failure, and
//! unparsable responses are all reported as [`DegradedOutput`] rather than
//! as an `LlmError`, so the caller can downgrade a grounding level and
//! continue instead of aborting its stage (§4.3, §4.9, §9).

use aegi_core::BudgetContext;
use aegi_core::DegradedOutput;
use aegi_core::DegradedReason;
use aegi_core::LlmError;
use aegi_core::LlmInvocationRequest;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

/// Configuration for the HTTP LLM client.
///
/// # Invariants
/// - `endpoint_url` must be an `https://` URL unless `allow_http` is set.
/// - `timeout_ms` is a floor applied in addition to the per-call
///   `BudgetContext` deadline; the tighter of the two wins.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpLlmClientConfig {
    /// Endpoint URL receiving the completion request.
    pub endpoint_url: String,
    /// Bearer token sent as `Authorization: Bearer <token>`.
    pub api_key: String,
    /// Model identifier forwarded in the request body.
    pub model: String,
    /// Allow cleartext HTTP (disabled by default).
    pub allow_http: bool,
    /// Floor timeout applied regardless of the caller's budget.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpLlmClientConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            api_key: String::new(),
            model: "aegi-default".to_string(),
            allow_http: false,
            timeout_ms: 30_000,
            user_agent: "aegi-core/0.1".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    system_prompt: &'a str,
    user_prompt: &'a str,
    max_output_tokens: u32,
    response_schema: Option<&'a serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// HTTP-backed LLM invocation capability.
///
/// # Invariants
/// - Requests never follow redirects.
/// - A request that exceeds its deadline or fails transport never
///   propagates as an error; it is reported as [`DegradedOutput`].
pub struct HttpLlmClient {
    config: HttpLlmClientConfig,
    client: reqwest::Client,
}

impl HttpLlmClient {
    /// Creates a new HTTP LLM client.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] when the request is invalid (e.g. an `http://`
    /// endpoint without `allow_http`) or the HTTP client cannot be built.
    pub fn new(config: HttpLlmClientConfig) -> Result<Self, LlmError> {
        if !config.allow_http && !config.endpoint_url.starts_with("https://") {
            return Err(LlmError::InvalidRequest(
                "endpoint_url must use https unless allow_http is set".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|err| LlmError::InvalidRequest(format!("http client build failed: {err}")))?;
        Ok(Self { config, client })
    }

    fn effective_timeout(&self, budget: BudgetContext) -> std::time::Duration {
        let floor = std::time::Duration::from_millis(self.config.timeout_ms);
        budget.deadline.min(floor)
    }

    async fn post_completion(
        &self,
        request: &LlmInvocationRequest,
        schema: Option<&serde_json::Value>,
        budget: BudgetContext,
    ) -> Result<Result<CompletionResponse, DegradedOutput>, LlmError> {
        let body = CompletionRequest {
            model: &self.config.model,
            system_prompt: &request.system_prompt,
            user_prompt: &request.user_prompt,
            max_output_tokens: budget.max_output_tokens,
            response_schema: schema,
        };
        let call = self
            .client
            .post(&self.config.endpoint_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send();

        let response = match tokio::time::timeout(self.effective_timeout(budget), call).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Ok(Err(DegradedOutput {
                    partial_text: None,
                    reason: DegradedReason::ProviderUnavailable,
                }));
            }
            Err(_elapsed) => {
                return Ok(Err(DegradedOutput {
                    partial_text: None,
                    reason: DegradedReason::DeadlineExceeded,
                }));
            }
        };

        if !response.status().is_success() {
            return Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::ProviderUnavailable,
            }));
        }

        match response.json::<CompletionResponse>().await {
            Ok(parsed) => Ok(Ok(parsed)),
            Err(_) => Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::UnparsableResponse,
            })),
        }
    }
}

#[async_trait]
impl aegi_core::LlmClient for HttpLlmClient {
    async fn invoke(
        &self,
        request: &LlmInvocationRequest,
        budget: BudgetContext,
    ) -> Result<Result<String, DegradedOutput>, LlmError> {
        match self.post_completion(request, None, budget).await? {
            Ok(response) => Ok(Ok(response.text)),
            Err(degraded) => Ok(Err(degraded)),
        }
    }

    async fn invoke_structured(
        &self,
        request: &LlmInvocationRequest,
        schema: &serde_json::Value,
        budget: BudgetContext,
    ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
        match self.post_completion(request, Some(schema), budget).await? {
            Ok(response) => match serde_json::from_str::<serde_json::Value>(&response.text) {
                Ok(value) => Ok(Ok(value)),
                Err(_) => Ok(Err(DegradedOutput {
                    partial_text: Some(response.text),
                    reason: DegradedReason::UnparsableResponse,
                })),
            },
            Err(degraded) => Ok(Err(degraded)),
        }
    }

    async fn embed(
        &self,
        text: &str,
        budget: BudgetContext,
    ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
        let call = self
            .client
            .post(format!("{}/embeddings", self.config.endpoint_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({ "model": self.config.model, "input": text }))
            .send();

        let response = match tokio::time::timeout(self.effective_timeout(budget), call).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => {
                return Ok(Err(DegradedOutput {
                    partial_text: None,
                    reason: DegradedReason::ProviderUnavailable,
                }));
            }
            Err(_elapsed) => {
                return Ok(Err(DegradedOutput {
                    partial_text: None,
                    reason: DegradedReason::DeadlineExceeded,
                }));
            }
        };

        if !response.status().is_success() {
            return Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::ProviderUnavailable,
            }));
        }

        match response.json::<EmbeddingResponse>().await {
            Ok(parsed) => Ok(Ok(parsed.embedding)),
            Err(_) => Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::UnparsableResponse,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_plain_http_endpoint_by_default() {
        let config = HttpLlmClientConfig {
            endpoint_url: "http://example.invalid/v1/chat".to_string(),
            ..HttpLlmClientConfig::default()
        };
        let result = HttpLlmClient::new(config);
        assert!(result.is_err());
    }

    #[test]
    fn accepts_https_endpoint() {
        let config = HttpLlmClientConfig {
            endpoint_url: "https://example.invalid/v1/chat".to_string(),
            ..HttpLlmClientConfig::default()
        };
        assert!(HttpLlmClient::new(config).is_ok());
    }
}
