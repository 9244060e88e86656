//! Quiz server binary
//!
//! Run with: cargo run -p quiz-rag --bin quiz-rag-server -- --config quiz-rag.toml

use std::path::PathBuf;

use clap::Parser;
use quiz_rag::{config::RagConfig, server::QuizServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "quiz-rag-server", version, about = "Generate quizzes from PDF course material")]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "QUIZ_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Ollama base URL
    #[arg(long, env = "OLLAMA_URL")]
    ollama_url: Option<String>,

    /// Collection database path
    #[arg(long)]
    storage: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<RagConfig> {
        let mut config = match &self.config {
            Some(path) => RagConfig::from_file(path)?,
            None => RagConfig::default(),
        };

        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = self.ollama_url {
            config.llm.base_url = url;
        }
        if let Some(path) = self.storage {
            config.storage.path = path;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quiz_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                         Quiz RAG                          ║
║          Quizzes generated from your course PDFs          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = Args::parse().into_config()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Generation model: {}", config.llm.generate_model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );
    tracing::info!("  - Retrieval top_k: {}", config.retrieval.top_k);
    tracing::info!("  - Storage: {}", config.storage.path.display());

    let server = QuizServer::new(config.clone())?;

    // Check Ollama
    tracing::info!("Checking Ollama at {}...", config.llm.base_url);
    let embed_ok = server.state().embedding_provider().health_check().await.unwrap_or(false);
    let llm_ok = server.state().llm_provider().health_check().await.unwrap_or(false);
    if embed_ok && llm_ok {
        tracing::info!("Ollama is running");
    } else {
        tracing::warn!("Ollama not available at {}", config.llm.base_url);
        tracing::warn!("Please start Ollama:");
        tracing::warn!("  1. Start: ollama serve");
        tracing::warn!(
            "  2. Pull models: ollama pull {} && ollama pull {}",
            config.llm.embed_model,
            config.llm.generate_model
        );
    }
    server.state().set_ready(embed_ok && llm_ok);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /upload        - Upload a PDF");
    println!("  POST /generate_quiz - Generate a quiz");
    println!("  POST /submit_quiz   - Grade answers");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
