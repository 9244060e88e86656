//! Decoding of model output into a typed quiz
//!
//! Completion models wrap JSON in prose or code fences often enough that the
//! decoder tries several recoveries before giving up. Whatever happens, the
//! raw text travels with the outcome so a failure can be diagnosed.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::types::quiz::{parse_boolean_answer, strip_option_label};
use crate::types::{MultipleChoice, Question, Quiz, ShortAnswer, TrueFalse};

/// Result of decoding a model answer
#[derive(Debug, Clone, PartialEq)]
pub enum QuizOutcome {
    /// A validated quiz
    Ready(Quiz),
    /// No JSON document could be recovered
    ParseFailure {
        raw_response: String,
        message: String,
    },
    /// JSON was found but does not describe a valid quiz
    ValidationFailure {
        raw_response: String,
        question_index: Option<usize>,
        message: String,
    },
}

impl QuizOutcome {
    /// Whether a quiz was produced
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Raw model output of a failed decode
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::ParseFailure { raw_response, .. }
            | Self::ValidationFailure { raw_response, .. } => Some(raw_response),
        }
    }
}

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```").expect("Invalid regex")
    })
}

/// Decode raw model output into a quiz
pub fn decode_quiz(raw: &str) -> QuizOutcome {
    let Some(document) = recover_json(raw) else {
        return QuizOutcome::ParseFailure {
            raw_response: raw.to_string(),
            message: "model output is not valid JSON".to_string(),
        };
    };

    let items = match document {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => items,
            Some(_) => return validation_failure(raw, None, "'questions' must be an array"),
            None => return validation_failure(raw, None, "missing 'questions' field"),
        },
        _ => return validation_failure(raw, None, "expected a JSON object or array"),
    };

    let mut questions = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match decode_question(item) {
            Ok(question) => questions.push(question),
            Err(message) => {
                let message = format!("question {}: {}", index, message);
                return validation_failure(raw, Some(index), message);
            }
        }
    }

    let quiz = Quiz { questions };
    match quiz.check() {
        Ok(()) => QuizOutcome::Ready(quiz),
        Err((question_index, message)) => validation_failure(raw, question_index, message),
    }
}

fn validation_failure(
    raw: &str,
    question_index: Option<usize>,
    message: impl Into<String>,
) -> QuizOutcome {
    QuizOutcome::ValidationFailure {
        raw_response: raw.to_string(),
        question_index,
        message: message.into(),
    }
}

/// Try the trimmed text, then a fenced block, then the outermost braces
fn recover_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();

    let fenced = fence_pattern()
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim());

    let braced = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    };

    [Some(trimmed), fenced, braced]
        .into_iter()
        .flatten()
        .filter_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
        .find(|value| value.is_object() || value.is_array())
}

fn decode_question(item: Value) -> std::result::Result<Question, String> {
    let Value::Object(fields) = item else {
        return Err("expected a JSON object".to_string());
    };

    let kind = fields
        .get("type")
        .and_then(Value::as_str)
        .ok_or("missing 'type'")?
        .trim()
        .to_lowercase()
        .replace(['-', ' ', '/'], "_");

    let prompt = fields
        .get("question")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .ok_or("missing 'question'")?;
    let explanation = text_field(&fields, "explanation");

    match kind.as_str() {
        "mcq" | "multiple_choice" => {
            let options = decode_options(&fields)?;
            let answer = fields.get("answer").ok_or("missing 'answer'")?;
            let correct_option_index = resolve_option(answer, &options)?;
            Ok(Question::Mcq(MultipleChoice {
                prompt,
                options,
                correct_option_index,
                explanation: explanation.unwrap_or_default(),
            }))
        }
        "true_false" | "truefalse" | "boolean" => {
            let correct_answer = match fields.get("answer") {
                Some(Value::Bool(b)) => *b,
                Some(Value::String(s)) => parse_boolean_answer(s)
                    .ok_or_else(|| format!("'{}' is not a true/false answer", s))?,
                Some(other) => return Err(format!("'{}' is not a true/false answer", other)),
                None => return Err("missing 'answer'".to_string()),
            };
            Ok(Question::TrueFalse(TrueFalse {
                prompt,
                correct_answer,
                explanation,
            }))
        }
        "short_answer" | "short" | "open" => Ok(Question::ShortAnswer(ShortAnswer {
            prompt,
            // Some models put the reference answer under "answer"
            explanation: explanation
                .or_else(|| text_field(&fields, "answer"))
                .unwrap_or_default(),
        })),
        other => Err(format!("unknown question type '{}'", other)),
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn decode_options(fields: &Map<String, Value>) -> std::result::Result<Vec<String>, String> {
    let options = fields
        .get("options")
        .and_then(Value::as_array)
        .ok_or("missing 'options'")?;
    if options.is_empty() {
        return Err("no options".to_string());
    }

    options
        .iter()
        .map(|option| match option {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(format!("option {} is not text", other)),
        })
        .collect()
}

/// Resolve an mcq answer to an option index.
///
/// Accepts an index, a numeric string, the option text itself or, failing
/// that, a label letter (`"B"`).
fn resolve_option(answer: &Value, options: &[String]) -> std::result::Result<usize, String> {
    let in_range = |index: i64| -> std::result::Result<usize, String> {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < options.len())
            .ok_or_else(|| {
                format!(
                    "answer index {} is out of range for {} options",
                    index,
                    options.len()
                )
            })
    };

    match answer {
        Value::Number(n) => {
            let index = n
                .as_i64()
                .ok_or_else(|| format!("answer {} is not an index", n))?;
            in_range(index)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(index) = s.parse::<i64>() {
                return in_range(index);
            }

            let wanted = strip_option_label(s);
            let by_text = options
                .iter()
                .position(|o| o.trim() == s || strip_option_label(o) == wanted)
                .or_else(|| {
                    options
                        .iter()
                        .position(|o| strip_option_label(o).eq_ignore_ascii_case(wanted))
                });
            if let Some(index) = by_text {
                return Ok(index);
            }

            // A bare label letter ("B") when no option reads like that
            let mut chars = s.chars();
            if let (Some(letter), None) = (chars.next(), chars.next()) {
                if letter.is_ascii_alphabetic() {
                    return in_range(i64::from(letter.to_ascii_uppercase() as u8 - b'A'));
                }
            }

            Err(format!("answer '{}' matches no option", s))
        }
        other => Err(format!("answer {} is not an option", other)),
    }
}
