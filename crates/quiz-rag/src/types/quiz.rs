//! Quiz document types
//!
//! The serialized form mirrors the schema the completion model is asked to
//! produce: every question carries a `type` tag, its text under `question`
//! and the correct answer under `answer`.

use serde::{Deserialize, Serialize};

/// A generated quiz
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    /// Questions in presentation order
    pub questions: Vec<Question>,
}

impl Quiz {
    /// Number of questions
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the quiz has no questions
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// First structural problem, with the index of the offending question
    pub fn check(&self) -> Result<(), (Option<usize>, String)> {
        if self.questions.is_empty() {
            return Err((None, "the quiz has no questions".to_string()));
        }
        for (index, question) in self.questions.iter().enumerate() {
            question
                .check()
                .map_err(|message| (Some(index), format!("question {}: {}", index, message)))?;
        }
        Ok(())
    }
}

/// Question kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Mcq,
    TrueFalse,
    ShortAnswer,
}

impl QuestionKind {
    /// Whether answers of this kind are checked automatically
    pub fn is_gradable(&self) -> bool {
        !matches!(self, Self::ShortAnswer)
    }
}

/// One quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    /// Multiple choice
    Mcq(MultipleChoice),
    /// True / false statement
    TrueFalse(TrueFalse),
    /// Free text, reviewed by the learner against the explanation
    ShortAnswer(ShortAnswer),
}

impl Question {
    /// Kind of this question
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::Mcq(_) => QuestionKind::Mcq,
            Self::TrueFalse(_) => QuestionKind::TrueFalse,
            Self::ShortAnswer(_) => QuestionKind::ShortAnswer,
        }
    }

    /// Question text
    pub fn prompt(&self) -> &str {
        match self {
            Self::Mcq(q) => &q.prompt,
            Self::TrueFalse(q) => &q.prompt,
            Self::ShortAnswer(q) => &q.prompt,
        }
    }

    /// Explanation, if the model supplied a non-empty one
    pub fn explanation(&self) -> Option<&str> {
        let explanation = match self {
            Self::Mcq(q) => Some(q.explanation.as_str()),
            Self::TrueFalse(q) => q.explanation.as_deref(),
            Self::ShortAnswer(q) => Some(q.explanation.as_str()),
        };
        explanation.filter(|e| !e.trim().is_empty())
    }

    /// Reject questions that cannot be shown or graded
    pub fn check(&self) -> Result<(), String> {
        if self.prompt().trim().is_empty() {
            return Err("question text is blank".to_string());
        }
        if let Self::Mcq(q) = self {
            if q.options.is_empty() {
                return Err("no options".to_string());
            }
            if q.correct_option_index >= q.options.len() {
                return Err(format!(
                    "answer index {} is out of range for {} options",
                    q.correct_option_index,
                    q.options.len()
                ));
            }
        }
        Ok(())
    }

    /// Text of the expected answer, as shown in a review
    pub fn expected_answer(&self) -> String {
        match self {
            Self::Mcq(q) => q.correct_option_text().to_string(),
            Self::TrueFalse(q) => bool_label(q.correct_answer).to_string(),
            Self::ShortAnswer(q) => q.explanation.clone(),
        }
    }
}

/// Multiple choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoice {
    /// Question text
    #[serde(rename = "question")]
    pub prompt: String,
    /// Options, possibly prefixed with a label such as `"A. "`
    pub options: Vec<String>,
    /// Index of the correct option
    #[serde(rename = "answer")]
    pub correct_option_index: usize,
    /// Why the answer is correct
    #[serde(default)]
    pub explanation: String,
}

impl MultipleChoice {
    /// Options with their labels stripped
    pub fn display_options(&self) -> Vec<&str> {
        self.options.iter().map(|o| strip_option_label(o)).collect()
    }

    /// Canonical text of the correct option
    pub fn correct_option_text(&self) -> &str {
        self.options
            .get(self.correct_option_index)
            .map(|o| strip_option_label(o))
            .unwrap_or_default()
    }
}

/// True / false question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrueFalse {
    /// Statement to judge
    #[serde(rename = "question")]
    pub prompt: String,
    /// Whether the statement is true
    #[serde(rename = "answer")]
    pub correct_answer: bool,
    /// Optional explanation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Short answer question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortAnswer {
    /// Question text
    #[serde(rename = "question")]
    pub prompt: String,
    /// Reference answer
    #[serde(default)]
    pub explanation: String,
}

/// Strip a leading option label (`"A. "`, `"b. "`) and surrounding whitespace.
///
/// Used for displayed options, expected answers and MCQ grading alike.
pub fn strip_option_label(option: &str) -> &str {
    let trimmed = option.trim();
    let mut chars = trimmed.char_indices();
    if let (Some((_, letter)), Some((_, '.')), Some((space_at, ' '))) =
        (chars.next(), chars.next(), chars.next())
    {
        if letter.is_alphabetic() {
            return trimmed[space_at + 1..].trim();
        }
    }
    trimmed
}

/// Interpret a submitted true/false answer
pub fn parse_boolean_answer(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "true" | "vrai" | "yes" | "oui" | "t" | "v" | "y" | "1" => Some(true),
        "false" | "faux" | "no" | "non" | "f" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// Display label of a boolean answer
pub fn bool_label(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}
