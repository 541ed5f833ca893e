// aegi-analysis/src/fusion.rs
// ============================================================================
// Module: Assertion Fuser (Dempster-Shafer)
// Description: Combines source claims bearing on the same fact into one
//              fused assertion using Dempster's combination rule.
// Purpose: Produce belief/plausibility/conflict-tracked assertions instead
//          of naively averaging claim confidences.
// Dependencies: aegi-core
// ============================================================================

//! ## Overview
//! Each [`SourceClaim`] is mapped to a mass triple `(m_true, m_false,
//! m_uncertain)` from its modality and an externally supplied source
//! credibility. Masses combine pairwise with Dempster's rule, accumulating
//! conflict `K ← 1 − (1 − K)(1 − k_i)`. Fusion is deterministic: claims are
//! combined in a fixed order (the order they are supplied in), so the same
//! claim set always yields the same conflict set.

use aegi_core::ids::CaseUid;
use aegi_core::model::Assertion;
use aegi_core::model::AssertionValue;
use aegi_core::model::ConflictKind;
use aegi_core::model::ConflictRecord;
use aegi_core::model::Modality;
use aegi_core::model::SourceClaim;
use aegi_core::time::Timestamp;

/// A claim's mass triple before fusion.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MassTriple {
    m_true: f64,
    m_false: f64,
    m_uncertain: f64,
}

impl MassTriple {
    fn normalize(self) -> Self {
        let sum = self.m_true + self.m_false + self.m_uncertain;
        if sum <= 0.0 {
            return Self { m_true: 0.0, m_false: 0.0, m_uncertain: 1.0 };
        }
        Self {
            m_true: self.m_true / sum,
            m_false: self.m_false / sum,
            m_uncertain: self.m_uncertain / sum,
        }
    }
}

/// Derives a claim's prior mass triple from its modality and the
/// credibility of its attributed source, in `[0, 1]`.
fn mass_from_claim(claim: &SourceClaim, source_credibility: f64) -> MassTriple {
    let credibility = source_credibility.clamp(0.0, 1.0);
    let (base_true, base_false) = match claim.modality {
        Modality::Asserted => (0.9, 0.02),
        Modality::Reported => (0.6, 0.05),
        Modality::Speculative => (0.3, 0.1),
        Modality::Denied => (0.05, 0.85),
    };
    let m_true = base_true * credibility;
    let m_false = base_false * credibility;
    let m_uncertain = (1.0 - m_true - m_false).max(0.0);
    MassTriple { m_true, m_false, m_uncertain }.normalize()
}

/// Combines two mass triples with Dempster's rule, returning the combined
/// triple and this combination's conflict mass `k`.
fn combine(a: MassTriple, b: MassTriple) -> (MassTriple, f64) {
    let raw_true = a.m_true * b.m_true + a.m_true * b.m_uncertain + a.m_uncertain * b.m_true;
    let raw_false = a.m_false * b.m_false + a.m_false * b.m_uncertain + a.m_uncertain * b.m_false;
    let raw_uncertain = a.m_uncertain * b.m_uncertain;
    let k = (a.m_true * b.m_false + a.m_false * b.m_true).clamp(0.0, 1.0);
    let normalizer = (1.0 - k).max(1e-9);
    let combined = MassTriple {
        m_true: raw_true / normalizer,
        m_false: raw_false / normalizer,
        m_uncertain: raw_uncertain / normalizer,
    };
    (combined, k)
}

/// Kind of conflict detected between a pair of claims, used when building
/// [`ConflictRecord`]s.
fn classify_conflict(a: &SourceClaim, b: &SourceClaim, k: f64) -> Option<ConflictKind> {
    if a.modality == Modality::Asserted && b.modality == Modality::Denied
        || a.modality == Modality::Denied && b.modality == Modality::Asserted
    {
        return Some(ConflictKind::Contradiction);
    }
    if k > 0.3 {
        return Some(ConflictKind::HighDsConflict);
    }
    if a.modality != b.modality {
        return Some(ConflictKind::Discrepancy);
    }
    None
}

/// Result of fusing one coherent group of source claims into one assertion.
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// The fused assertions, one per coherent group.
    pub assertions: Vec<Assertion>,
}

/// Fuses a group of source claims believed to bear on the same fact into
/// one [`Assertion`], using an externally supplied per-claim credibility
/// lookup (e.g. attributed speaker reputation).
///
/// Empty input yields an assertion-less, empty fusion; callers should treat
/// an empty `claims` slice as a rejected fusion attempt and record the
/// string `"empty"` in their own action rationale.
#[must_use]
pub fn fuse_claims(
    case_uid: &CaseUid,
    claims: &[SourceClaim],
    credibility: impl Fn(&SourceClaim) -> f64,
    now: Timestamp,
) -> Option<Assertion> {
    let first = claims.first()?;
    let mut combined = mass_from_claim(first, credibility(first));
    let mut aggregate_conflict = 0.0_f64;
    let mut conflicts = Vec::new();

    for window in claims.windows(2) {
        let (prev, curr) = (&window[0], &window[1]);
        let curr_mass = mass_from_claim(curr, credibility(curr));
        let (next_combined, k) = combine(combined, curr_mass);
        aggregate_conflict = 1.0 - (1.0 - aggregate_conflict) * (1.0 - k);
        if let Some(kind) = classify_conflict(prev, curr, k) {
            conflicts.push(ConflictRecord {
                kind,
                source_claim_uids: vec![prev.uid.clone(), curr.uid.clone()],
                description: conflict_rationale(kind, k),
            });
        }
        combined = next_combined;
    }

    let belief = combined.m_true;
    let plausibility = combined.m_true + combined.m_uncertain;

    Some(Assertion {
        uid: aegi_core::ids::AssertionUid::mint(),
        case_uid: case_uid.clone(),
        text: first.text.clone(),
        source_claim_uids: claims.iter().map(|c| c.uid.clone()).collect(),
        value: AssertionValue {
            belief,
            plausibility,
            uncertainty: combined.m_uncertain,
            conflict_degree: aggregate_conflict,
            source_count: u32::try_from(claims.len()).unwrap_or(u32::MAX),
            has_conflict: !conflicts.is_empty(),
        },
        conflicts,
        created_at: now,
        updated_at: now,
    })
}

/// Fuses each pre-grouped cluster of source claims (one group per coherent
/// fact, e.g. from narrative clustering or an analyst's manual grouping)
/// into one assertion apiece. Groups that yield no assertion (an empty
/// group) are simply absent from the result rather than causing the whole
/// batch to fail.
#[must_use]
pub fn fuse_claim_groups(
    case_uid: &CaseUid,
    groups: &[Vec<SourceClaim>],
    credibility: impl Fn(&SourceClaim) -> f64,
    now: Timestamp,
) -> FusionResult {
    let assertions =
        groups.iter().filter_map(|group| fuse_claims(case_uid, group, &credibility, now)).collect();
    FusionResult { assertions }
}

fn conflict_rationale(kind: ConflictKind, k: f64) -> String {
    match kind {
        ConflictKind::Contradiction => {
            "one source claim asserts what another denies".to_string()
        }
        ConflictKind::Discrepancy => "source claims diverge in modality".to_string(),
        ConflictKind::HighDsConflict => {
            format!("dempster-shafer combination produced conflict mass k={k:.3}")
        }
    }
}

/// Pignistic point confidence derived from an assertion's belief state:
/// `belief + uncertainty / 2`.
#[must_use]
pub fn pignistic_confidence(value: &AssertionValue) -> f64 {
    value.belief + 0.5 * value.uncertainty
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegi_core::ids::ChunkUid;
    use aegi_core::ids::SourceClaimUid;

    fn now() -> Timestamp {
        Timestamp::new(time::OffsetDateTime::from_unix_timestamp(0).expect("valid"))
    }

    fn claim(uid: &str, modality: Modality) -> SourceClaim {
        SourceClaim {
            uid: SourceClaimUid::new(uid),
            case_uid: CaseUid::new("case_1"),
            chunk_uid: ChunkUid::new("chunk_1"),
            text: "the bridge was closed".to_string(),
            modality,
            created_at: now(),
        }
    }

    #[test]
    fn empty_input_yields_no_assertion() {
        let result = fuse_claims(&CaseUid::new("case_1"), &[], |_| 0.8, now());
        assert!(result.is_none());
    }

    #[test]
    fn agreeing_asserted_claims_raise_belief() {
        let claims = vec![claim("claim_1", Modality::Asserted), claim("claim_2", Modality::Asserted)];
        let assertion = fuse_claims(&CaseUid::new("case_1"), &claims, |_| 0.9, now()).expect("fused");
        assert!(assertion.value.belief > 0.8);
        assert!(!assertion.value.has_conflict);
    }

    #[test]
    fn contradicting_claims_are_flagged_and_retained() {
        let claims = vec![claim("claim_1", Modality::Asserted), claim("claim_2", Modality::Denied)];
        let assertion = fuse_claims(&CaseUid::new("case_1"), &claims, |_| 0.9, now()).expect("fused");
        assert!(assertion.value.has_conflict);
        assert_eq!(assertion.source_claim_uids.len(), 2);
        assert!(!assertion.conflicts.is_empty());
    }

    #[test]
    fn fusion_is_deterministic_for_the_same_claim_order() {
        let claims = vec![
            claim("claim_1", Modality::Asserted),
            claim("claim_2", Modality::Reported),
            claim("claim_3", Modality::Speculative),
        ];
        let a = fuse_claims(&CaseUid::new("case_1"), &claims, |_| 0.7, now()).expect("fused");
        let b = fuse_claims(&CaseUid::new("case_1"), &claims, |_| 0.7, now()).expect("fused");
        assert_eq!(a.value.belief, b.value.belief);
        assert_eq!(a.conflicts.len(), b.conflicts.len());
    }

    #[test]
    fn fuse_claim_groups_fuses_each_group_independently() {
        let groups = vec![
            vec![claim("claim_1", Modality::Asserted), claim("claim_2", Modality::Asserted)],
            vec![claim("claim_3", Modality::Reported)],
        ];
        let result = fuse_claim_groups(&CaseUid::new("case_1"), &groups, |_| 0.8, now());
        assert_eq!(result.assertions.len(), 2);
    }

    #[test]
    fn fuse_claim_groups_skips_empty_groups() {
        let groups: Vec<Vec<SourceClaim>> = vec![Vec::new(), vec![claim("claim_1", Modality::Asserted)]];
        let result = fuse_claim_groups(&CaseUid::new("case_1"), &groups, |_| 0.8, now());
        assert_eq!(result.assertions.len(), 1);
    }
}
