//! Quiz generation and submission endpoints

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::generation::QuizOutcome;
use crate::grading::grade;
use crate::server::state::AppState;
use crate::types::{
    AnswerSet, CollectionId, GenerateQuizRequest, GenerateQuizResponse, GeneratedQuiz,
    GenerationFailure, ScoreReport, SubmitQuizRequest,
};

/// POST /generate_quiz - Retrieve context for a topic and generate a quiz
///
/// Parameters come from the JSON body and/or the query string; the body wins.
pub async fn generate_quiz(
    State(state): State<AppState>,
    query: std::result::Result<Query<GenerateQuizRequest>, QueryRejection>,
    body: Bytes,
) -> Result<Json<GenerateQuizResponse>> {
    let start = Instant::now();
    let Query(query) = query.map_err(|rejection| Error::invalid_input(rejection.body_text()))?;
    let request = parse_optional_json::<GenerateQuizRequest>(&body)?.or(query);
    let quiz_config = &state.config().quiz;

    let topic = request
        .topic
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| quiz_config.default_topic.clone());

    let num_questions = request
        .num_questions
        .unwrap_or(quiz_config.default_num_questions);
    if num_questions == 0 || num_questions > quiz_config.max_questions {
        return Err(Error::invalid_input(format!(
            "num_questions must be within 1..={}",
            quiz_config.max_questions
        )));
    }

    let collection_id = match request.collection_id {
        Some(id) => id,
        None => latest_collection(&state).await?,
    };

    let context: Vec<_> = state
        .retriever()
        .retrieve(&collection_id, &topic, state.config().retrieval.top_k)
        .await?
        .into_iter()
        .map(|scored| scored.segment)
        .collect();

    let outcome = state
        .synthesizer()
        .synthesize(&context, &topic, num_questions)
        .await?;

    let response = match outcome {
        QuizOutcome::Ready(quiz) => {
            let quiz_id = state
                .sessions()
                .insert(quiz.clone(), collection_id.clone(), topic.clone());
            tracing::info!(
                "Generated quiz {} ({} questions on '{}' from {}) in {}ms",
                quiz_id,
                quiz.len(),
                topic,
                collection_id,
                start.elapsed().as_millis()
            );
            GenerateQuizResponse::Quiz(GeneratedQuiz {
                quiz_id,
                collection_id,
                topic,
                questions: quiz.questions,
            })
        }
        QuizOutcome::ParseFailure {
            raw_response,
            message,
        } => GenerateQuizResponse::Failure(GenerationFailure {
            error: message,
            raw_response,
            question_index: None,
        }),
        QuizOutcome::ValidationFailure {
            raw_response,
            question_index,
            message,
        } => GenerateQuizResponse::Failure(GenerationFailure {
            error: message,
            raw_response,
            question_index,
        }),
    };

    Ok(Json(response))
}

/// POST /submit_quiz - Grade answers against a generated or inline quiz
pub async fn submit_quiz(State(state): State<AppState>, body: Bytes) -> Result<Json<ScoreReport>> {
    let request: SubmitQuizRequest = serde_json::from_slice(&body)?;
    let answers = AnswerSet::from_fields(&request.fields)?;

    let quiz = match (request.quiz, request.quiz_id) {
        (Some(quiz), _) => {
            if let Err((_, message)) = quiz.check() {
                return Err(Error::invalid_input(format!(
                    "invalid inline quiz: {}",
                    message
                )));
            }
            quiz
        }
        (None, Some(quiz_id)) => {
            state
                .sessions()
                .get(&quiz_id)
                .ok_or(Error::QuizNotFound(quiz_id))?
                .quiz
        }
        (None, None) => {
            return Err(Error::invalid_input(
                "either 'quiz_id' or an inline 'quiz' is required",
            ))
        }
    };

    let report = grade(&quiz, &answers);
    tracing::info!(
        "Graded quiz: {}/{} correct ({} questions, {} answered)",
        report.correct_count,
        report.gradable_count,
        report.total_count,
        report.per_question.iter().filter(|r| r.submitted.is_some()).count()
    );

    Ok(Json(report))
}

/// Most recently indexed collection
async fn latest_collection(state: &AppState) -> Result<CollectionId> {
    let db = state.db().clone();
    let latest = tokio::task::spawn_blocking(move || db.latest_collection())
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

    latest
        .map(|handle| handle.id)
        .ok_or_else(|| Error::CollectionNotFound("no document has been indexed yet".to_string()))
}

/// An empty body means "all defaults"
fn parse_optional_json<T: serde::de::DeserializeOwned + Default>(body: &[u8]) -> Result<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}
