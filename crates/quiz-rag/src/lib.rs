//! quiz-rag: Quiz generation from PDF course material
//!
//! Uploaded PDFs are extracted, chunked and embedded into a persistent
//! collection store. A quiz request retrieves the segments most similar to a
//! topic, asks a completion model for a JSON quiz, and validates the answer
//! into typed questions. Submitted answers are graded against the stored quiz.

pub mod config;
pub mod error;
pub mod generation;
pub mod grading;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{QuizOutcome, QuizSynthesizer};
pub use grading::grade;
pub use ingestion::{chunk_text, PdfParser, TextChunker};
pub use retrieval::{Indexer, Retriever};
pub use server::QuizServer;
pub use storage::CollectionDb;
pub use types::{
    AnswerSet, CollectionHandle, CollectionId, Question, Quiz, ScoreReport, ScoredSegment, Segment,
};
