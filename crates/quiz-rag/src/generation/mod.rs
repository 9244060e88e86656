//! Quiz generation: prompt construction, completion and decoding

pub mod decoder;
pub mod ollama;
pub mod prompt;
pub mod synthesizer;

pub use decoder::{decode_quiz, QuizOutcome};
pub use ollama::OllamaClient;
pub use prompt::PromptBuilder;
pub use synthesizer::QuizSynthesizer;
