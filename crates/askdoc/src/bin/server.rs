//! RAG server binary
//!
//! Run with: cargo run -p askdoc --bin askdoc-server

use askdoc::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdoc=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding mode: {:?}", config.embedding.mode);
    tracing::info!("  - Embedding model: {}", config.embedding.local_model);
    tracing::info!("  - LLM mode: {:?}", config.llm.mode);
    tracing::info!("  - LLM model: {}", config.llm.local_model);
    tracing::info!("  - Vector backend: {:?}", config.vector_db.backend);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    if config.llm.use_ollama {
        tracing::info!("Checking Ollama at {}...", config.llm.base_url);
        let client = reqwest::Client::new();
        match client
            .get(format!("{}/api/tags", config.llm.base_url))
            .send()
            .await
        {
            Ok(resp) if resp.status().is_success() => {
                tracing::info!("Ollama is running");
            }
            _ => {
                tracing::warn!("Ollama not available at {}", config.llm.base_url);
                tracing::warn!("Embeddings and generation will use the fallback providers.");
                tracing::warn!("To start Ollama:");
                tracing::warn!("  1. Install: https://ollama.com/download");
                tracing::warn!("  2. Start: ollama serve");
                tracing::warn!(
                    "  3. Pull models: ollama pull {} && ollama pull {}",
                    config.embedding.local_model,
                    config.llm.local_model
                );
            }
        }
    }

    let server = RagServer::new(config).await?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ingest    - Upload documents / submit URLs");
    println!("  POST /api/query     - Ask questions");
    println!("  GET  /api/documents - List documents");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
