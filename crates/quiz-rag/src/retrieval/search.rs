//! Top-k similarity search over a stored collection

use std::sync::Arc;

use crate::error::{Error, Result, UpstreamService};
use crate::providers::EmbeddingProvider;
use crate::storage::CollectionDb;
use crate::types::{CollectionId, ScoredSegment};

/// Brute-force cosine retriever
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    db: CollectionDb,
}

impl Retriever {
    /// Create a new retriever
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, db: CollectionDb) -> Self {
        Self { embedder, db }
    }

    /// The `k` segments most similar to `query`, best first.
    ///
    /// Ties are broken by ascending segment index so results are stable.
    pub async fn retrieve(
        &self,
        collection_id: &CollectionId,
        query: &str,
        k: usize,
    ) -> Result<Vec<ScoredSegment>> {
        if query.trim().is_empty() {
            return Err(Error::invalid_input("retrieval query is empty"));
        }

        let db = self.db.clone();
        let id = collection_id.clone();
        let stored = tokio::task::spawn_blocking(move || db.load_segments(&id))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        if stored.is_empty() {
            return Err(Error::CollectionNotFound(collection_id.to_string()));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let dimensions = stored[0].embedding.len();
        if query_embedding.len() != dimensions {
            return Err(Error::upstream_response(
                UpstreamService::Embedding,
                format!(
                    "query embedding has {} dimensions, collection {} has {}",
                    query_embedding.len(),
                    collection_id,
                    dimensions
                ),
            ));
        }

        let mut results: Vec<ScoredSegment> = stored
            .into_iter()
            .map(|entry| ScoredSegment {
                similarity: cosine_similarity(&query_embedding, &entry.embedding),
                segment: entry.segment,
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.segment.index.cmp(&b.segment.index))
        });
        results.truncate(k);

        tracing::debug!(
            "Retrieved {} segments from {} (best similarity {:.3})",
            results.len(),
            collection_id,
            results.first().map(|r| r.similarity).unwrap_or_default()
        );

        Ok(results)
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
