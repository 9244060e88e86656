//! Embedding and persistence of document segments

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;
use crate::storage::{CollectionDb, StoredSegment};
use crate::types::{CollectionHandle, CollectionId, Segment};

/// Embeds segments and replaces a collection's contents
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    db: CollectionDb,
    /// One write lock per collection id
    write_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl Indexer {
    /// Create a new indexer
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, db: CollectionDb) -> Self {
        Self {
            embedder,
            db,
            write_locks: DashMap::new(),
        }
    }

    /// Embed `segments` and make them the whole content of `collection_id`.
    ///
    /// The previous content of the collection is replaced atomically.
    pub async fn index(
        &self,
        segments: &[Segment],
        collection_id: &CollectionId,
        source_name: Option<&str>,
    ) -> Result<CollectionHandle> {
        if segments.is_empty() {
            return Err(Error::indexing("no segments to index"));
        }

        let lock = self
            .write_locks
            .entry(collection_id.to_string())
            .or_default()
            .value()
            .clone();
        let result = {
            let _guard = lock.lock().await;
            self.write(segments, collection_id, source_name).await
        };

        // Drop the lock entry unless another writer is queued on it
        drop(lock);
        self.write_locks
            .remove_if(collection_id.as_str(), |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn write(
        &self,
        segments: &[Segment],
        collection_id: &CollectionId,
        source_name: Option<&str>,
    ) -> Result<CollectionHandle> {
        let start = Instant::now();
        let texts: Vec<String> = segments.iter().map(|s| s.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            Error::indexing_caused_by(format!("embedding {} segments failed", texts.len()), e)
        })?;
        let dimensions =
            validate_embeddings(&embeddings, segments.len(), self.embedder.dimensions())?;
        let embed_ms = start.elapsed().as_millis();

        let handle = CollectionHandle {
            id: collection_id.clone(),
            dimensions,
            segment_count: segments.len(),
            source_name: source_name.map(str::to_string),
            indexed_at: Utc::now(),
        };
        let entries: Vec<StoredSegment> = segments
            .iter()
            .cloned()
            .zip(embeddings)
            .map(|(segment, embedding)| StoredSegment { segment, embedding })
            .collect();

        let db = self.db.clone();
        let record = handle.clone();
        tokio::task::spawn_blocking(move || db.replace_collection(&record, &entries))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
            .map_err(|e| Error::indexing_caused_by("failed to persist collection", e))?;

        tracing::info!(
            "Indexed {} segments into {} ({} dims, embeddings {}ms, total {}ms)",
            handle.segment_count,
            handle.id,
            dimensions,
            embed_ms,
            start.elapsed().as_millis()
        );

        Ok(handle)
    }
}

/// Check vector count, dimensionality and finiteness; returns the dimensionality
fn validate_embeddings(
    embeddings: &[Vec<f32>],
    expected_count: usize,
    expected_dimensions: Option<usize>,
) -> Result<usize> {
    if embeddings.len() != expected_count {
        return Err(Error::indexing(format!(
            "embedding service returned {} vectors for {} segments",
            embeddings.len(),
            expected_count
        )));
    }

    let dimensions = expected_dimensions
        .or_else(|| embeddings.first().map(Vec::len))
        .unwrap_or_default();
    if dimensions == 0 {
        return Err(Error::indexing("embedding service returned an empty vector"));
    }

    for (i, embedding) in embeddings.iter().enumerate() {
        if embedding.len() != dimensions {
            return Err(Error::indexing(format!(
                "segment {} embedding has {} dimensions, expected {}",
                i,
                embedding.len(),
                dimensions
            )));
        }
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(Error::indexing(format!(
                "segment {} embedding contains a non-finite value",
                i
            )));
        }
    }

    Ok(dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::testing::{FakeEmbedder, FAKE_DIMENSIONS};
    use axum::http::StatusCode;
    use std::time::Duration;

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new(0, "Paris is the capital of France.", 0, 31),
            Segment::new(1, "The Loire is the longest river in France.", 31, 72),
        ]
    }

    #[tokio::test]
    async fn test_index_returns_handle() {
        let db = CollectionDb::in_memory().unwrap();
        let indexer = Indexer::new(Arc::new(FakeEmbedder::new()), db.clone());
        let id = CollectionId::new("geo").unwrap();

        let handle = indexer.index(&segments(), &id, Some("geo.pdf")).await.unwrap();
        assert_eq!(handle.segment_count, 2);
        assert_eq!(handle.dimensions, FAKE_DIMENSIONS);
        assert_eq!(handle.source_name.as_deref(), Some("geo.pdf"));
        assert_eq!(db.load_segments(&id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_segments_rejected() {
        let indexer = Indexer::new(
            Arc::new(FakeEmbedder::new()),
            CollectionDb::in_memory().unwrap(),
        );
        let err = indexer
            .index(&[], &CollectionId::new("geo").unwrap(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Indexing { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_embedder_is_indexing_error_with_cause() {
        let db = CollectionDb::in_memory().unwrap();
        let indexer = Indexer::new(Arc::new(FakeEmbedder::unreachable()), db.clone());
        let id = CollectionId::new("geo").unwrap();

        let err = indexer.index(&segments(), &id, None).await.unwrap_err();
        match &err {
            Error::Indexing { source: Some(cause), .. } => {
                assert!(matches!(**cause, Error::UpstreamUnavailable { .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(db.get_collection(&id).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_wrong_dimensions_rejected() {
        let indexer = Indexer::new(
            Arc::new(FakeEmbedder::with_dimensions(8)),
            CollectionDb::in_memory().unwrap(),
        );
        let err = indexer
            .index(&segments(), &CollectionId::new("geo").unwrap(), None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(&format!("expected {}", FAKE_DIMENSIONS)));
    }

    #[test]
    fn test_validate_embeddings() {
        let good = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        assert_eq!(validate_embeddings(&good, 2, None).unwrap(), 2);
        assert_eq!(validate_embeddings(&good, 2, Some(2)).unwrap(), 2);

        assert!(validate_embeddings(&good, 3, None).is_err());
        assert!(validate_embeddings(&good, 2, Some(384)).is_err());
        assert!(validate_embeddings(&[vec![], vec![]], 2, None).is_err());
        assert!(validate_embeddings(&[vec![0.1, 0.2], vec![0.3]], 2, None).is_err());
        assert!(validate_embeddings(&[vec![0.1, f32::NAN]], 1, None).is_err());
        assert!(validate_embeddings(&[vec![f32::INFINITY, 0.0]], 1, None).is_err());
    }

    #[tokio::test]
    async fn test_same_collection_writes_are_serialized() {
        let db = CollectionDb::in_memory().unwrap();
        let embedder = Arc::new(FakeEmbedder::slow(Duration::from_millis(20)));
        let indexer = Indexer::new(embedder.clone(), db.clone());
        let id = CollectionId::new("geo").unwrap();

        let first = segments();
        let second = vec![
            Segment::new(0, "Rome is the capital of Italy.", 0, 29),
            Segment::new(1, "The Po flows through northern Italy.", 29, 65),
            Segment::new(2, "Sicily is the largest Italian island.", 65, 102),
        ];

        let (a, b) = tokio::join!(
            indexer.index(&first, &id, None),
            indexer.index(&second, &id, None)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(embedder.max_in_flight(), 1);
        let stored: Vec<String> = db
            .load_segments(&id)
            .unwrap()
            .into_iter()
            .map(|s| s.segment.text)
            .collect();
        let texts = |set: &[Segment]| set.iter().map(|s| s.text.clone()).collect::<Vec<_>>();
        assert!(stored == texts(&first) || stored == texts(&second), "{:?}", stored);
        assert!(indexer.write_locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_collections_index_concurrently() {
        let db = CollectionDb::in_memory().unwrap();
        let embedder = Arc::new(FakeEmbedder::slow(Duration::from_millis(20)));
        let indexer = Indexer::new(embedder.clone(), db.clone());
        let geo = CollectionId::new("geo").unwrap();
        let bio = CollectionId::new("bio").unwrap();

        let (geo_segments, bio_segments) = (segments(), segments());
        let (a, b) = tokio::join!(
            indexer.index(&geo_segments, &geo, None),
            indexer.index(&bio_segments, &bio, None)
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(embedder.max_in_flight(), 2);
        assert_eq!(db.load_segments(&geo).unwrap().len(), 2);
        assert_eq!(db.load_segments(&bio).unwrap().len(), 2);
        assert!(indexer.write_locks.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_releases_lock_entry() {
        let indexer = Indexer::new(
            Arc::new(FakeEmbedder::unreachable()),
            CollectionDb::in_memory().unwrap(),
        );
        let id = CollectionId::new("geo").unwrap();

        assert!(indexer.index(&segments(), &id, None).await.is_err());
        assert!(indexer.write_locks.is_empty());
    }
}
