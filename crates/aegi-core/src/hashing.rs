// aegi-core/src/hashing.rs
// ============================================================================
// Module: AEGI Hashing and UID Minting
// Description: Canonical content hashing and globally unique identifier minting.
// Purpose: Give every persisted entity a stable `<prefix>_<hex>` UID and let
//          content-addressed structures (anchors, dedup keys) hash deterministically.
// Dependencies: serde, serde_json, sha2, uuid
// ============================================================================

//! ## Overview
//! UIDs are minted once, at creation time, and never reused (§3). Minting
//! combines a random UUIDv4 with the entity-kind prefix so UIDs are
//! globally unique without a coordinating authority. Canonical hashing is
//! used for content-addressing (chunk text, evidence payloads) and for
//! deriving dedup keys such as `claim:<case>:<chunk>:<unix_ts>` (§4.3).

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

/// Mints a fresh identifier string of the form `<prefix>_<hex>`.
#[must_use]
pub fn mint_uid(prefix: &str) -> String {
    let raw = uuid::Uuid::new_v4();
    format!("{prefix}_{}", raw.simple())
}

/// Stable hash digest over canonical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashDigest {
    /// Hex-encoded SHA-256 digest.
    pub hex: String,
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.hex.fmt(f)
    }
}

/// Hashes raw bytes with SHA-256.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> HashDigest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    HashDigest {
        hex: format!("{:x}", hasher.finalize()),
    }
}

/// Hashes a JSON value after canonicalizing key order, so the same logical
/// value always hashes to the same digest regardless of field order.
#[must_use]
pub fn hash_canonical_json(value: &serde_json::Value) -> HashDigest {
    let canonical = canonicalize(value);
    hash_bytes(canonical.to_string().as_bytes())
}

fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = serde_json::Map::new();
            for (k, v) in sorted {
                out.insert(k.clone(), canonicalize(v));
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_hash_ignores_key_order() {
        let a = serde_json::json!({"a": 1, "b": 2});
        let b = serde_json::json!({"b": 2, "a": 1});
        assert_eq!(hash_canonical_json(&a), hash_canonical_json(&b));
    }

    #[test]
    fn different_content_hashes_differ() {
        let a = hash_bytes(b"hello");
        let b = hash_bytes(b"world");
        assert_ne!(a, b);
    }
}
