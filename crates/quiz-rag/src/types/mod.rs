//! Core types for the quiz pipeline

pub mod grading;
pub mod quiz;
pub mod request;
pub mod response;
pub mod segment;

pub use grading::{AnswerSet, QuestionResult, ScoreRating, ScoreReport};
pub use quiz::{MultipleChoice, Question, QuestionKind, Quiz, ShortAnswer, TrueFalse};
pub use request::{GenerateQuizRequest, SubmitQuizRequest};
pub use response::{GenerateQuizResponse, GeneratedQuiz, GenerationFailure, UploadResponse};
pub use segment::{CollectionHandle, CollectionId, ScoredSegment, Segment};
