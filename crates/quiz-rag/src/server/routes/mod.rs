//! API routes for the quiz server

pub mod quiz;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Upload - with larger body limit for PDFs
        .route(
            "/upload",
            post(upload::upload_pdf).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/generate_quiz", post(quiz::generate_quiz))
        .route("/submit_quiz", post(quiz::submit_quiz))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let db = state.db().clone();
    let collections = tokio::task::spawn_blocking(move || db.collection_count())
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;
    let config = state.config();

    Ok(Json(serde_json::json!({
        "name": "quiz-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Quiz generation from PDF course material",
        "endpoints": {
            "POST /upload": "Upload a PDF (multipart field 'file') and index it",
            "POST /generate_quiz": "Generate a quiz: {collection_id?, topic?, num_questions?}",
            "POST /submit_quiz": "Grade answers: {quiz_id | quiz, question_<i>: answer}",
            "GET /health": "Liveness",
            "GET /ready": "Readiness"
        },
        "models": {
            "embedding": config.llm.embed_model,
            "generation": config.llm.generate_model
        },
        "quiz": {
            "default_topic": config.quiz.default_topic,
            "default_num_questions": config.quiz.default_num_questions,
            "max_questions": config.quiz.max_questions
        },
        "collections": collections
    })))
}
