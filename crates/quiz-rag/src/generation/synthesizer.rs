//! Quiz synthesis from retrieved context

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::types::Segment;

use super::decoder::{decode_quiz, QuizOutcome};
use super::prompt::PromptBuilder;

/// Builds the quiz prompt, runs one completion and decodes the answer
pub struct QuizSynthesizer {
    llm: Arc<dyn LlmProvider>,
}

impl QuizSynthesizer {
    /// Create a synthesizer on top of a completion provider
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate a quiz of `num_questions` questions on `topic` from `context`.
    ///
    /// Upstream failures are errors; undecodable output is a [`QuizOutcome`]
    /// failure carrying the raw text.
    pub async fn synthesize(
        &self,
        context: &[Segment],
        topic: &str,
        num_questions: usize,
    ) -> Result<QuizOutcome> {
        if num_questions == 0 {
            return Err(Error::invalid_input("num_questions must be at least 1"));
        }

        let prompt = PromptBuilder::build_quiz_prompt(
            topic,
            num_questions,
            &PromptBuilder::build_context(context),
        );

        let start = Instant::now();
        let raw = self.llm.complete(&prompt).await?;
        tracing::info!(
            "Completion from {} ({}) in {}ms, {} chars",
            self.llm.name(),
            self.llm.model(),
            start.elapsed().as_millis(),
            raw.len()
        );

        let outcome = decode_quiz(&raw);
        match &outcome {
            QuizOutcome::Ready(quiz) if quiz.len() != num_questions => {
                tracing::warn!(
                    "Requested {} questions, model returned {}",
                    num_questions,
                    quiz.len()
                );
            }
            QuizOutcome::Ready(_) => {}
            QuizOutcome::ParseFailure { message, .. }
            | QuizOutcome::ValidationFailure { message, .. } => {
                tracing::warn!("Quiz decoding failed: {}", message);
            }
        }

        Ok(outcome)
    }
}
