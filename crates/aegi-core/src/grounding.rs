// aegi-core/src/grounding.rs
// ============================================================================
// Module: AEGI Grounding Gate
// Description: Grounding level ordering and the evidence-presence gate function.
// Purpose: Enforce that no analytical output claims more evidential support
//          than its citations justify (§4.1).
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every LLM-facing component (the causal/scenario generator, the chat
//! answer renderer, the report generator) must call [`grounding_gate`]
//! before stamping an output with a [`GroundingLevel`] and downgrade its
//! declared level accordingly. Publishing [`GroundingLevel::Fact`] without
//! at least one valid evidence citation is a programming error, not a
//! runtime condition — callers that skip the gate are the bug.

use serde::Deserialize;
use serde::Serialize;

/// Evidential support level, ordered by increasing strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GroundingLevel {
    /// No supporting citation; speculative.
    Hypothesis,
    /// Plausible given available evidence but not directly cited.
    Inference,
    /// Backed by at least one valid evidence citation.
    Fact,
}

/// Pure function mapping evidence presence to the maximum permitted
/// grounding level. With no valid citation, the ceiling is
/// [`GroundingLevel::Hypothesis`] regardless of how confident the caller is.
#[must_use]
pub fn grounding_gate(has_valid_citation: bool) -> GroundingLevel {
    if has_valid_citation {
        GroundingLevel::Fact
    } else {
        GroundingLevel::Hypothesis
    }
}

/// Clamps a component's declared grounding level to the gate's ceiling for
/// the citations it actually has, downgrading rather than rejecting.
#[must_use]
pub fn clamp_to_gate(declared: GroundingLevel, has_valid_citation: bool) -> GroundingLevel {
    let ceiling = grounding_gate(has_valid_citation);
    declared.min(ceiling)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_citation_caps_at_hypothesis() {
        assert_eq!(grounding_gate(false), GroundingLevel::Hypothesis);
    }

    #[test]
    fn citation_allows_fact() {
        assert_eq!(grounding_gate(true), GroundingLevel::Fact);
    }

    #[test]
    fn clamp_downgrades_fact_without_citation() {
        let clamped = clamp_to_gate(GroundingLevel::Fact, false);
        assert_eq!(clamped, GroundingLevel::Hypothesis);
    }

    #[test]
    fn clamp_preserves_inference_with_citation() {
        let clamped = clamp_to_gate(GroundingLevel::Inference, true);
        assert_eq!(clamped, GroundingLevel::Inference);
    }

    #[test]
    fn ordering_is_increasing() {
        assert!(GroundingLevel::Hypothesis < GroundingLevel::Inference);
        assert!(GroundingLevel::Inference < GroundingLevel::Fact);
    }
}
