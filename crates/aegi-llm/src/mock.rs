// aegi-llm/src/mock.rs
// ============================================================================
// Module: Rule-Based LLM Client
// Description: Deterministic LlmClient baseline with no external dependency.
// Purpose: Keep the claim extractor, causal reasoner, and report renderer
//          exercisable in tests and CLI demos without a configured provider,
//          and give every other adapter a known-good fallback.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! The rule-based client never calls out. It honors `BudgetContext` the same
//! way a real provider would: a zero deadline degrades immediately, and
//! output is truncated to `max_output_tokens` (measured as whitespace-split
//! words, a deliberately crude stand-in for a tokenizer). This is the
//! baseline the causal reasoner and report generator fall back to when a
//! configured [`crate::http::HttpLlmClient`] is degraded (§4.9, §4.11).

use aegi_core::BudgetContext;
use aegi_core::DegradedOutput;
use aegi_core::DegradedReason;
use aegi_core::LlmError;
use aegi_core::LlmInvocationRequest;
use aegi_core::hashing::hash_bytes;
use async_trait::async_trait;

/// Deterministic `LlmClient` implementation backed by simple text rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedLlmClient;

impl RuleBasedLlmClient {
    /// Creates a new rule-based client.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn truncate_to_budget(text: String, budget: BudgetContext) -> String {
    if budget.max_output_tokens == 0 {
        return String::new();
    }
    let max_output_tokens = budget.max_output_tokens as usize;
    text.split_whitespace()
        .take(max_output_tokens)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derives a deterministic unit-ish embedding from `text`'s SHA-256 digest,
/// so repeated calls with the same text always produce the same vector.
fn deterministic_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let digest = hash_bytes(text.as_bytes());
    let bytes = digest.hex.as_bytes();
    (0..dimension)
        .map(|i| {
            let byte = bytes[(i * 2) % bytes.len()];
            (f32::from(byte) / 255.0).mul_add(2.0, -1.0)
        })
        .collect()
}

#[async_trait]
impl aegi_core::LlmClient for RuleBasedLlmClient {
    async fn invoke(
        &self,
        request: &LlmInvocationRequest,
        budget: BudgetContext,
    ) -> Result<Result<String, DegradedOutput>, LlmError> {
        if budget.deadline.is_zero() {
            return Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::DeadlineExceeded,
            }));
        }
        let text = format!(
            "[rule-based baseline] {}",
            request.user_prompt.lines().next().unwrap_or_default()
        );
        Ok(Ok(truncate_to_budget(text, budget)))
    }

    async fn invoke_structured(
        &self,
        _request: &LlmInvocationRequest,
        schema: &serde_json::Value,
        budget: BudgetContext,
    ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
        if budget.deadline.is_zero() {
            return Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::DeadlineExceeded,
            }));
        }
        let Some(properties) = schema.get("properties").and_then(serde_json::Value::as_object)
        else {
            return Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::UnparsableResponse,
            }));
        };
        let mut out = serde_json::Map::new();
        for key in properties.keys() {
            out.insert(key.clone(), serde_json::Value::Null);
        }
        Ok(Ok(serde_json::Value::Object(out)))
    }

    async fn embed(
        &self,
        text: &str,
        budget: BudgetContext,
    ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
        if budget.deadline.is_zero() {
            return Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::DeadlineExceeded,
            }));
        }
        Ok(Ok(deterministic_embedding(text, 16)))
    }
}
