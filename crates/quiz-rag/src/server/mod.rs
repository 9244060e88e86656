//! HTTP server for the quiz system

pub mod routes;
pub mod sessions;
pub mod state;

use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Interval between upstream readiness checks
const READINESS_INTERVAL: Duration = Duration::from_secs(30);

/// Quiz HTTP Server
pub struct QuizServer {
    config: RagConfig,
    state: AppState,
}

impl QuizServer {
    /// Create a new quiz server backed by Ollama
    pub fn new(config: RagConfig) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create a server around existing state
    pub fn with_state(state: AppState) -> Self {
        Self {
            config: state.config().clone(),
            state,
        }
    }

    /// Shared state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            // Health check
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .merge(routes::api_routes(self.config.server.max_upload_size))
            .with_state(self.state.clone())
            // Middleware layers (order matters - applied bottom to top)
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();
        tokio::spawn(watch_upstreams(self.state.clone()));

        tracing::info!("Starting quiz server on http://{}", addr);
        tracing::info!("API info: http://{}/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Keep the ready flag in line with upstream reachability
async fn watch_upstreams(state: AppState) {
    let mut interval = tokio::time::interval(READINESS_INTERVAL);
    loop {
        interval.tick().await;

        let embedder_ok = state.embedding_provider().health_check().await.unwrap_or(false);
        let llm_ok = state.llm_provider().health_check().await.unwrap_or(false);
        let ready = embedder_ok && llm_ok;

        if ready != state.is_ready() {
            if ready {
                tracing::info!("Upstream services reachable, marking ready");
            } else {
                tracing::warn!(
                    "Upstream services unreachable (embeddings: {}, completion: {}), marking not ready",
                    embedder_ok,
                    llm_ok
                );
            }
        }
        state.set_ready(ready);
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> axum::http::StatusCode {
    if state.is_ready() {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    }
}
