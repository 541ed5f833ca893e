// aegi-core/src/runtime/memory_vector.rs
// ============================================================================
// Module: In-Memory Vector Store
// Description: Brute-force cosine similarity search over in-memory vectors.
// Purpose: Provide a deterministic VectorStore implementation without
//          external dependencies.
// Dependencies: crate::interfaces
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::interfaces::VectorMatch;
use crate::interfaces::VectorStore;
use crate::interfaces::VectorStoreError;

/// Brute-force, in-memory [`VectorStore`]. Dimension is fixed by the first
/// upsert and enforced on every call thereafter.
#[derive(Debug, Default, Clone)]
pub struct InMemoryVectorStore {
    items: Arc<Mutex<BTreeMap<String, Vec<f32>>>>,
}

impl InMemoryVectorStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn dimension(&self, items: &BTreeMap<String, Vec<f32>>) -> Option<usize> {
        items.values().next().map(Vec::len)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, item_id: &str, embedding: &[f32]) -> Result<(), VectorStoreError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| VectorStoreError::Io("vector store mutex poisoned".to_string()))?;
        if let Some(expected) = self.dimension(&items) {
            if expected != embedding.len() {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        items.insert(item_id.to_string(), embedding.to_vec());
        Ok(())
    }

    async fn search(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<VectorMatch>, VectorStoreError> {
        let items = self
            .items
            .lock()
            .map_err(|_| VectorStoreError::Io("vector store mutex poisoned".to_string()))?;
        if let Some(expected) = self.dimension(&items) {
            if expected != embedding.len() {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        let mut matches: Vec<VectorMatch> = items
            .iter()
            .map(|(item_id, vector)| VectorMatch {
                item_id: item_id.clone(),
                score: cosine_similarity(embedding, vector),
            })
            .collect();
        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(limit);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_ranks_identical_vector_first() {
        let store = InMemoryVectorStore::new();
        store.upsert("a", &[1.0, 0.0]).await.expect("upsert a");
        store.upsert("b", &[0.0, 1.0]).await.expect("upsert b");
        let results = store.search(&[1.0, 0.0], 2).await.expect("search");
        assert_eq!(results[0].item_id, "a");
        assert!((results[0].score - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let store = InMemoryVectorStore::new();
        store.upsert("a", &[1.0, 0.0]).await.expect("upsert a");
        let err = store.upsert("b", &[1.0, 0.0, 0.0]).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
    }
}
