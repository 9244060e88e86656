//! Provider abstractions for embeddings and text completion
//!
//! Trait objects let the pipeline run against the local Ollama server in
//! production and against deterministic fakes in tests.

pub mod embedding;
pub mod llm;
pub mod ollama;

#[cfg(test)]
pub(crate) mod testing;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm, OllamaProvider};
