//! Request payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::quiz::Quiz;
use super::segment::CollectionId;

/// Quiz generation request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateQuizRequest {
    /// Collection to draw from (default: most recently indexed)
    #[serde(default)]
    pub collection_id: Option<CollectionId>,
    /// Topic used as the retrieval query
    #[serde(default)]
    pub topic: Option<String>,
    /// Number of questions to generate
    #[serde(default)]
    pub num_questions: Option<usize>,
}

impl GenerateQuizRequest {
    /// Fill unset fields from `fallback`
    pub fn or(self, fallback: GenerateQuizRequest) -> Self {
        Self {
            collection_id: self.collection_id.or(fallback.collection_id),
            topic: self.topic.or(fallback.topic),
            num_questions: self.num_questions.or(fallback.num_questions),
        }
    }
}

/// Answer submission
///
/// Answers arrive as top-level `question_<i>` fields next to the quiz
/// reference, matching the field names of the quiz form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitQuizRequest {
    /// Quiz returned by `/generate_quiz`
    #[serde(default)]
    pub quiz_id: Option<Uuid>,
    /// Inline quiz, takes precedence over `quiz_id`
    #[serde(default)]
    pub quiz: Option<Quiz>,
    /// Remaining fields, including the answers
    #[serde(flatten)]
    pub fields: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_body_wins_over_query() {
        let body: GenerateQuizRequest =
            serde_json::from_str(r#"{"topic": "cells"}"#).unwrap();
        let query = GenerateQuizRequest {
            collection_id: None,
            topic: Some("general".to_string()),
            num_questions: Some(3),
        };

        let merged = body.or(query);
        assert_eq!(merged.topic.as_deref(), Some("cells"));
        assert_eq!(merged.num_questions, Some(3));
        assert!(merged.collection_id.is_none());
    }

    #[test]
    fn test_submit_request_collects_answer_fields() {
        let request: SubmitQuizRequest = serde_json::from_str(
            r#"{"quiz_id": "67e55044-10b1-426f-9247-bb680e5fe0c8", "question_0": "Paris", "question_1": null}"#,
        )
        .unwrap();

        assert!(request.quiz_id.is_some());
        assert!(request.quiz.is_none());
        assert_eq!(request.fields.len(), 2);
        assert_eq!(request.fields["question_0"], "Paris");
    }
}
