//! Answer and score report types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};

use super::quiz::QuestionKind;

/// Field prefix used by answer forms (`question_0`, `question_1`, ...)
pub const ANSWER_FIELD_PREFIX: &str = "question_";

/// Submitted answers keyed by question index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSet {
    answers: BTreeMap<usize, String>,
}

impl AnswerSet {
    /// Create an empty answer set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer
    pub fn insert(&mut self, index: usize, answer: impl Into<String>) {
        self.answers.insert(index, answer.into());
    }

    /// Builder form of [`AnswerSet::insert`]
    pub fn with(mut self, index: usize, answer: impl Into<String>) -> Self {
        self.insert(index, answer);
        self
    }

    /// The answer for a question; `None` when missing or blank
    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers
            .get(&index)
            .map(String::as_str)
            .filter(|a| !a.trim().is_empty())
    }

    /// Number of recorded (possibly blank) answers
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Build from form fields keyed `question_<i>`.
    ///
    /// Null values mean unanswered. Fields without the prefix are ignored.
    pub fn from_fields(fields: &HashMap<String, Value>) -> Result<Self> {
        let mut set = Self::new();

        for (key, value) in fields {
            let Some(suffix) = key.strip_prefix(ANSWER_FIELD_PREFIX) else {
                continue;
            };
            let index: usize = suffix.parse().map_err(|_| {
                Error::invalid_input(format!("answer field '{}' has no question index", key))
            })?;

            match value {
                Value::Null => {}
                Value::String(s) => set.insert(index, s.clone()),
                Value::Bool(b) => set.insert(index, b.to_string()),
                Value::Number(n) => set.insert(index, n.to_string()),
                other => {
                    return Err(Error::invalid_input(format!(
                        "answer field '{}' must be a string, got {}",
                        key, other
                    )))
                }
            }
        }

        Ok(set)
    }
}

/// Grading result for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    /// Question index
    pub index: usize,
    /// Question kind
    pub kind: QuestionKind,
    /// Question text
    pub question: String,
    /// What the learner submitted (`None` = unanswered)
    pub submitted: Option<String>,
    /// Expected answer text (explanation for short answers)
    pub expected: String,
    /// Explanation supplied with the question
    pub explanation: Option<String>,
    /// Correctness; `None` for questions that are not auto-graded
    pub is_correct: Option<bool>,
}

/// Score band shown with the final score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreRating {
    /// 80% and above
    Excellent,
    /// 60% to 80%
    Good,
    /// Below 60%
    KeepStudying,
}

impl ScoreRating {
    /// Band for a percentage
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 80.0 {
            Self::Excellent
        } else if percentage >= 60.0 {
            Self::Good
        } else {
            Self::KeepStudying
        }
    }
}

/// Aggregate grading result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    /// Correct gradable answers
    pub correct_count: usize,
    /// Questions that can be graded automatically (mcq + true_false)
    pub gradable_count: usize,
    /// All questions, including short answers
    pub total_count: usize,
    /// Score rounded to one decimal; `None` when nothing is gradable
    pub percentage: Option<f64>,
    /// Set when the quiz has no gradable question
    pub no_gradable_questions: bool,
    /// Score band, when a score exists
    pub rating: Option<ScoreRating>,
    /// Per-question results in quiz order
    pub per_question: Vec<QuestionResult>,
}
