// aegi-analysis/src/claims.rs
// ============================================================================
// Module: Claim Extractor
// Description: Per-chunk LLM-backed extraction of verbatim, anchored source
//              claims.
// Purpose: Turn a chunk's raw text into zero or more SourceClaim rows, never
//          raising on LLM failure.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! Issues a single LLM call per chunk under an explicit
//! [`LlmInvocationRequest`] and budget. Any extracted item whose anchor set
//! is empty is rejected outright: a source claim with no anchors would
//! violate its own invariant. LLM failure never propagates as an error; it
//! degrades to an empty claim set and a failing [`ToolTrace`].

use aegi_core::BudgetContext;
use aegi_core::LlmClient;
use aegi_core::LlmInvocationRequest;
use aegi_core::ToolTraceStatus;
use aegi_core::ids::ChunkUid;
use aegi_core::model::AegiEvent;
use aegi_core::model::Chunk;
use aegi_core::model::EventSeverity;
use aegi_core::model::Modality;
use aegi_core::model::SourceClaim;
use aegi_core::model::TextQuoteSelector;
use aegi_core::model::ToolTrace;
use aegi_core::time::Timestamp;
use serde::Deserialize;

const EXTRACTOR_SYSTEM_PROMPT: &str = concat!(
    "Extract verbatim quotations from the supplied text as a JSON array. ",
    "Each item MUST include an `exact` quote and a `modality` of ",
    "asserted, reported, speculative, or denied. Quote text only; never ",
    "paraphrase."
);

/// One raw extracted item returned by the LLM before anchor validation.
#[derive(Debug, Clone, Deserialize)]
struct RawExtractedClaim {
    exact: String,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    suffix: Option<String>,
    modality: Modality,
}

/// Result of one claim extraction pass over a chunk.
#[derive(Debug, Clone)]
pub struct ClaimExtractionResult {
    /// Claims that survived anchor validation, in extraction order.
    pub claims: Vec<SourceClaim>,
    /// Audit trace of the underlying LLM call.
    pub trace: ToolTrace,
    /// Bus event to publish, present only when at least one claim survived.
    pub event: Option<AegiEvent>,
}

/// Extracts source claims from a chunk's text via a single LLM call.
///
/// # Errors
///
/// Never returns an error: LLM failure degrades to an empty claim set
/// recorded in the returned trace.
pub async fn extract_claims(
    llm: &dyn LlmClient,
    chunk: &Chunk,
    budget: BudgetContext,
    now: Timestamp,
) -> ClaimExtractionResult {
    let request = LlmInvocationRequest {
        system_prompt: EXTRACTOR_SYSTEM_PROMPT.to_string(),
        user_prompt: chunk.text.clone(),
    };

    let schema = extraction_schema();
    let invocation = llm.invoke_structured(&request, &schema, budget).await;

    let (claims, status, detail) = match invocation {
        Ok(Ok(value)) => match parse_raw_claims(&value) {
            Ok(raw) => {
                let accepted = build_claims(chunk, raw, now);
                (accepted, ToolTraceStatus::Ok, serde_json::json!({"extracted": true}))
            }
            Err(err) => (
                Vec::new(),
                ToolTraceStatus::Degraded,
                serde_json::json!({"reason": "unparsable_response", "detail": err}),
            ),
        },
        Ok(Err(degraded)) => (
            Vec::new(),
            ToolTraceStatus::Degraded,
            serde_json::json!({"reason": format!("{:?}", degraded.reason)}),
        ),
        Err(err) => (
            Vec::new(),
            ToolTraceStatus::Failed,
            serde_json::json!({"reason": err.to_string()}),
        ),
    };

    let event = if claims.is_empty() {
        None
    } else {
        Some(
            AegiEvent::new(
                "claim.extracted",
                Some(chunk.case_uid.clone()),
                EventSeverity::Info,
                serde_json::json!({
                    "chunk_uid": chunk.uid.as_str(),
                    "claim_count": claims.len(),
                }),
                now,
            )
            .with_source_event_uid(aegi_core::ids::BusEventUid::new(dedup_key(
                chunk.case_uid.as_str(),
                &chunk.uid,
                now,
            ))),
        )
    };

    let trace = ToolTrace {
        uid: aegi_core::ids::ToolTraceUid::mint(),
        capability: "llm.invoke_structured.claim_extraction".to_string(),
        status,
        duration_ms: 0,
        detail,
        created_at: now,
    };

    ClaimExtractionResult { claims, trace, event }
}

/// Composes the dedup key used for the `claim.extracted` bus event, letting
/// the bus collapse duplicate extraction events for the same chunk/second.
fn dedup_key(case_uid: &str, chunk_uid: &ChunkUid, now: Timestamp) -> String {
    format!("claim:{case_uid}:{}:{}", chunk_uid.as_str(), now.unix_seconds())
}

fn extraction_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "claims": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "exact": {"type": "string"},
                        "prefix": {"type": "string"},
                        "suffix": {"type": "string"},
                        "modality": {"type": "string"}
                    },
                    "required": ["exact", "modality"]
                }
            }
        },
        "required": ["claims"]
    })
}

fn parse_raw_claims(value: &serde_json::Value) -> Result<Vec<RawExtractedClaim>, String> {
    let claims = value
        .get("claims")
        .ok_or_else(|| "missing claims field".to_string())?;
    serde_json::from_value(claims.clone()).map_err(|err| err.to_string())
}

fn build_claims(chunk: &Chunk, raw: Vec<RawExtractedClaim>, now: Timestamp) -> Vec<SourceClaim> {
    raw.into_iter()
        .filter(|item| !item.exact.trim().is_empty())
        .map(|item| SourceClaim {
            uid: aegi_core::ids::SourceClaimUid::mint(),
            case_uid: chunk.case_uid.clone(),
            chunk_uid: chunk.uid.clone(),
            text: item.exact.clone(),
            modality: item.modality,
            created_at: now,
        })
        .filter(|claim| claim_has_anchor(chunk, claim))
        .collect()
}

/// A claim is only accepted when its text is actually present in the
/// chunk: anchoring is what lets the claim be re-located in the original
/// artifact, and an unanchored claim is a contradiction of its own
/// invariant (§3).
fn claim_has_anchor(chunk: &Chunk, claim: &SourceClaim) -> bool {
    chunk.text.contains(&claim.text)
}

/// Builds the anchor selectors for an accepted claim, for callers that
/// persist [`TextQuoteSelector`]s alongside the claim on the owning chunk.
#[must_use]
pub fn anchor_for(chunk_text: &str, exact: &str) -> Option<TextQuoteSelector> {
    let start = chunk_text.find(exact)?;
    let end = start + exact.len();
    let prefix = chunk_text[..start].chars().rev().take(24).collect::<Vec<_>>();
    let prefix: String = prefix.into_iter().rev().collect();
    let suffix: String = chunk_text[end..].chars().take(24).collect();
    Some(TextQuoteSelector {
        exact: exact.to_string(),
        prefix: if prefix.is_empty() { None } else { Some(prefix) },
        suffix: if suffix.is_empty() { None } else { Some(suffix) },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::DegradedOutput;
    use aegi_core::DegradedReason;
    use aegi_core::LlmError;
    use aegi_core::ids::ArtifactVersionUid;
    use aegi_core::ids::CaseUid;
    use aegi_core::ids::ChunkUid;
    use aegi_core::model::AnchorHealth;
    use async_trait::async_trait;
    use std::time::Duration;

    struct StubLlm {
        response: serde_json::Value,
    }

    #[async_trait]
    impl LlmClient for StubLlm {
        async fn invoke(
            &self,
            _request: &LlmInvocationRequest,
            _budget: BudgetContext,
        ) -> Result<Result<String, DegradedOutput>, LlmError> {
            Ok(Ok(String::new()))
        }

        async fn invoke_structured(
            &self,
            _request: &LlmInvocationRequest,
            _schema: &serde_json::Value,
            _budget: BudgetContext,
        ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
            Ok(Ok(self.response.clone()))
        }

        async fn embed(
            &self,
            _text: &str,
            _budget: BudgetContext,
        ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
            Ok(Ok(vec![0.0]))
        }
    }

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid"))
    }

    fn test_chunk(text: &str) -> Chunk {
        Chunk {
            uid: ChunkUid::new("chunk_1"),
            case_uid: CaseUid::new("case_1"),
            artifact_version_uid: ArtifactVersionUid::new("artv_1"),
            ordinal: 0,
            text: text.to_string(),
            anchors: Vec::new(),
            anchor_health: AnchorHealth::Unchecked,
            created_at: now(),
        }
    }

    fn budget() -> BudgetContext {
        BudgetContext {
            deadline: Duration::from_secs(5),
            max_output_tokens: 256,
        }
    }

    #[tokio::test]
    async fn rejects_claims_with_no_anchor_in_chunk_text() {
        let chunk = test_chunk("Officials confirmed the agreement yesterday.");
        let llm = StubLlm {
            response: serde_json::json!({
                "claims": [
                    {"exact": "a sentence not present in the chunk", "modality": "asserted"},
                    {"exact": "Officials confirmed the agreement", "modality": "asserted"}
                ]
            }),
        };
        let result = extract_claims(&llm, &chunk, budget(), now()).await;
        assert_eq!(result.claims.len(), 1);
        assert_eq!(result.claims[0].text, "Officials confirmed the agreement");
        assert!(result.event.is_some());
    }

    #[tokio::test]
    async fn empty_response_yields_no_event() {
        let chunk = test_chunk("Nothing quotable here.");
        let llm = StubLlm {
            response: serde_json::json!({"claims": []}),
        };
        let result = extract_claims(&llm, &chunk, budget(), now()).await;
        assert!(result.claims.is_empty());
        assert!(result.event.is_none());
        assert_eq!(result.trace.status, ToolTraceStatus::Ok);
    }

    struct DegradingLlm;

    #[async_trait]
    impl LlmClient for DegradingLlm {
        async fn invoke(
            &self,
            _request: &LlmInvocationRequest,
            _budget: BudgetContext,
        ) -> Result<Result<String, DegradedOutput>, LlmError> {
            Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::ProviderUnavailable,
            }))
        }

        async fn invoke_structured(
            &self,
            _request: &LlmInvocationRequest,
            _schema: &serde_json::Value,
            _budget: BudgetContext,
        ) -> Result<Result<serde_json::Value, DegradedOutput>, LlmError> {
            Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::ProviderUnavailable,
            }))
        }

        async fn embed(
            &self,
            _text: &str,
            _budget: BudgetContext,
        ) -> Result<Result<Vec<f32>, DegradedOutput>, LlmError> {
            Ok(Err(DegradedOutput {
                partial_text: None,
                reason: DegradedReason::ProviderUnavailable,
            }))
        }
    }

    #[tokio::test]
    async fn provider_failure_degrades_instead_of_raising() {
        let chunk = test_chunk("Some text.");
        let result = extract_claims(&DegradingLlm, &chunk, budget(), now()).await;
        assert!(result.claims.is_empty());
        assert_eq!(result.trace.status, ToolTraceStatus::Degraded);
        assert!(result.event.is_none());
    }

    #[test]
    fn anchor_for_captures_surrounding_context() {
        let text = "The quick brown fox jumps over the lazy dog.";
        let anchor = anchor_for(text, "fox jumps").expect("anchor");
        assert_eq!(anchor.exact, "fox jumps");
        assert!(anchor.prefix.is_some());
        assert!(anchor.suffix.is_some());
    }
}
