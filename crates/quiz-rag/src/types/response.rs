//! Response payloads

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quiz::Question;
use super::segment::CollectionId;

/// Result of `/upload`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Human readable status
    pub message: String,
    /// Uploaded filename
    pub filename: String,
    /// Collection the document was indexed under
    pub collection_id: CollectionId,
    /// Segments indexed
    pub num_chunks: usize,
    /// Pages in the PDF
    pub pages: usize,
}

/// Result of `/generate_quiz`
///
/// Decode failures are not HTTP errors: the raw model output is returned so
/// the failure can be diagnosed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerateQuizResponse {
    /// A validated quiz
    Quiz(GeneratedQuiz),
    /// The model answer could not be turned into a quiz
    Failure(GenerationFailure),
}

/// A validated quiz ready to be answered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedQuiz {
    /// Id to submit answers against
    pub quiz_id: Uuid,
    /// Source collection
    pub collection_id: CollectionId,
    /// Topic used for retrieval
    pub topic: String,
    /// The questions
    pub questions: Vec<Question>,
}

/// Model output that failed to decode or validate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationFailure {
    /// What went wrong
    pub error: String,
    /// Model output, verbatim
    pub raw_response: String,
    /// Offending question, for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
}
