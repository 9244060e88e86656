//! Prompt templates for quiz generation

use crate::types::Segment;

/// Prompt builder for quiz generation
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the context block from retrieved segments, in retrieval order
    pub fn build_context(segments: &[Segment]) -> String {
        segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the quiz prompt with the JSON schema the decoder expects
    pub fn build_quiz_prompt(topic: &str, num_questions: usize, context: &str) -> String {
        format!(
            r#"You are an instructor writing a quiz about "{topic}" for a student.

Using ONLY the course material below, write exactly {num_questions} questions.
Mix the three question types:
- "mcq": a multiple choice question with 4 options, "answer" is the 0-based index of the correct option
- "true_false": a statement, "answer" is true or false
- "short_answer": an open question, "explanation" holds the expected answer

Return a single JSON object and nothing else, following this schema:
{{
  "questions": [
    {{
      "type": "mcq",
      "question": "Which organelle produces most of the cell's ATP?",
      "options": ["A. Nucleus", "B. Mitochondrion", "C. Ribosome", "D. Golgi apparatus"],
      "answer": 1,
      "explanation": "Mitochondria carry out cellular respiration."
    }},
    {{
      "type": "true_false",
      "question": "Ribosomes are surrounded by a membrane.",
      "answer": false,
      "explanation": "Ribosomes have no membrane."
    }},
    {{
      "type": "short_answer",
      "question": "What is the role of the nucleus?",
      "explanation": "It stores the genetic material and controls gene expression."
    }}
  ]
}}

COURSE MATERIAL:
{context}

Respond with only JSON."#,
            topic = topic,
            num_questions = num_questions,
            context = context,
        )
    }
}
