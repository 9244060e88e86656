//! Application state for the quiz server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::generation::QuizSynthesizer;
use crate::ingestion::TextChunker;
use crate::providers::{EmbeddingProvider, LlmProvider, OllamaProvider};
use crate::retrieval::{Indexer, Retriever};
use crate::storage::CollectionDb;

use super::sessions::QuizSessions;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Persisted collections
    db: CollectionDb,
    /// Embedding provider
    embedding_provider: Arc<dyn EmbeddingProvider>,
    /// Completion provider
    llm_provider: Arc<dyn LlmProvider>,
    /// Text chunker
    chunker: TextChunker,
    /// Segment indexer
    indexer: Indexer,
    /// Similarity retriever
    retriever: Retriever,
    /// Quiz synthesizer
    synthesizer: QuizSynthesizer,
    /// Generated quizzes awaiting submission
    sessions: QuizSessions,
    /// Ready state
    ready: RwLock<bool>,
}

impl AppState {
    /// Create new application state backed by Ollama and the configured store
    pub fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing quiz application state...");

        let db = CollectionDb::new(&config.storage.path)?;
        tracing::info!("Collection store opened at {}", config.storage.path.display());

        let (embedder, llm) =
            OllamaProvider::new(&config.llm, config.embeddings.dimensions)?.split();
        tracing::info!(
            "Ollama providers initialized (embeddings: {}, generation: {})",
            config.llm.embed_model,
            config.llm.generate_model
        );

        Ok(Self::with_providers(
            config,
            db,
            Arc::new(embedder),
            Arc::new(llm),
        ))
    }

    /// Create state from explicit parts
    pub fn with_providers(
        config: RagConfig,
        db: CollectionDb,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let chunker = TextChunker::from_config(&config.chunking);
        let indexer = Indexer::new(Arc::clone(&embedding_provider), db.clone());
        let retriever = Retriever::new(Arc::clone(&embedding_provider), db.clone());
        let synthesizer = QuizSynthesizer::new(Arc::clone(&llm_provider));
        let sessions = QuizSessions::new(config.quiz.max_sessions, config.quiz.session_ttl_secs);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                db,
                embedding_provider,
                llm_provider,
                chunker,
                indexer,
                retriever,
                synthesizer,
                sessions,
                ready: RwLock::new(true),
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Get collection store
    pub fn db(&self) -> &CollectionDb {
        &self.inner.db
    }

    /// Get embedding provider
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedding_provider
    }

    /// Get LLM provider
    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    /// Get chunker
    pub fn chunker(&self) -> &TextChunker {
        &self.inner.chunker
    }

    /// Get indexer
    pub fn indexer(&self) -> &Indexer {
        &self.inner.indexer
    }

    /// Get retriever
    pub fn retriever(&self) -> &Retriever {
        &self.inner.retriever
    }

    /// Get synthesizer
    pub fn synthesizer(&self) -> &QuizSynthesizer {
        &self.inner.synthesizer
    }

    /// Get quiz sessions
    pub fn sessions(&self) -> &QuizSessions {
        &self.inner.sessions
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }
}
