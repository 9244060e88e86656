//! Deterministic providers for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::error::{Error, Result, UpstreamService};

use super::{EmbeddingProvider, LlmProvider};

/// Dimensions of [`FakeEmbedder`] vectors
pub const FAKE_DIMENSIONS: usize = 256;

/// Bag-of-words embedder: each lowercase word bumps one SHA-256 bucket.
/// Texts sharing words end up close in cosine space; texts without words
/// embed to the zero vector.
pub struct FakeEmbedder {
    dimensions: usize,
    failure: Option<fn() -> Error>,
    delay: Option<Duration>,
    calls: Mutex<usize>,
    in_flight: Mutex<(usize, usize)>,
}

impl FakeEmbedder {
    pub fn new() -> Self {
        Self {
            dimensions: FAKE_DIMENSIONS,
            failure: None,
            delay: None,
            calls: Mutex::new(0),
            in_flight: Mutex::new((0, 0)),
        }
    }

    /// Embedder whose every call fails as unreachable
    pub fn unreachable() -> Self {
        Self {
            failure: Some(connection_refused),
            ..Self::new()
        }
    }

    /// Embedder producing vectors of a different length
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::new()
        }
    }

    /// Embedder that sleeps inside every call
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new()
        }
    }

    /// Number of `embed` calls so far
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }

    /// Highest number of `embed` calls that were running at the same time
    pub fn max_in_flight(&self) -> usize {
        self.in_flight.lock().1
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let digest = Sha256::digest(word.to_lowercase().as_bytes());
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&digest[..8]);
            vector[(u64::from_le_bytes(bytes) % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

fn connection_refused() -> Error {
    Error::UpstreamUnavailable {
        service: UpstreamService::Embedding,
        message: "connection refused".to_string(),
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        *self.calls.lock() += 1;
        if let Some(failure) = self.failure {
            return Err(failure());
        }

        if let Some(delay) = self.delay {
            {
                let mut in_flight = self.in_flight.lock();
                in_flight.0 += 1;
                in_flight.1 = in_flight.1.max(in_flight.0);
            }
            tokio::time::sleep(delay).await;
            self.in_flight.lock().0 -= 1;
        }
        Ok(self.vector(text))
    }

    fn dimensions(&self) -> Option<usize> {
        Some(FAKE_DIMENSIONS)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.failure.is_none())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Completion provider returning a canned response and recording prompts
pub struct ScriptedLlm {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.response.clone())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// A well-formed quiz answer: 2 mcq, 1 true/false, 1 short answer
pub const SAMPLE_QUIZ_JSON: &str = r#"{
  "questions": [
    {"type": "mcq", "question": "What is the capital of France?", "options": ["A. Paris", "B. Lyon", "C. Marseille"], "answer": 0, "explanation": "Paris is the capital."},
    {"type": "mcq", "question": "Which organelle produces ATP?", "options": ["A. Nucleus", "B. Mitochondrion"], "answer": 1, "explanation": "Mitochondria produce ATP."},
    {"type": "true_false", "question": "The sun is a star.", "answer": true, "explanation": "The sun is a G-type star."},
    {"type": "short_answer", "question": "Define photosynthesis.", "explanation": "Conversion of light into chemical energy."}
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::cosine_similarity;

    #[test]
    fn test_fake_vectors_share_words_only() {
        let embedder = FakeEmbedder::new();
        assert_eq!(embedder.vector("Photosynthesis"), embedder.vector("photosynthesis"));
        assert!(embedder.vector("...").iter().all(|v| *v == 0.0));

        let query = embedder.vector("photosynthesis light");
        let related = embedder.vector("Chloroplasts capture light during photosynthesis.");
        let unrelated = embedder.vector("of amino acids.");
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }
}
