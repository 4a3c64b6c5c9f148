//! Command-line interface for ingestion and querying
//!
//! Run with: cargo run -p askdoc --bin askdoc -- query "your question"

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use askdoc::config::RagConfig;
use askdoc::index::open_index;
use askdoc::ingestion::DocumentProcessor;
use askdoc::providers::{build_embedder, build_llm, GenerateOptions};
use askdoc::rag::RagChain;

#[derive(Parser)]
#[command(name = "askdoc", about = "Retrieval-augmented document Q&A", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest files and/or URLs into the vector index
    Ingest {
        /// Files to ingest (.pdf, .docx, .doc, .txt)
        files: Vec<PathBuf>,
        /// URLs to fetch and ingest
        #[arg(long = "url")]
        urls: Vec<String>,
    },
    /// Ask a question over the indexed documents
    Query {
        /// The question to answer
        question: String,
        /// Number of chunks to retrieve
        #[arg(long)]
        top_k: Option<usize>,
    },
}

async fn build_chain(config: &RagConfig) -> anyhow::Result<RagChain> {
    let embedder = build_embedder(config).await?;
    let llm = build_llm(config)?;
    let index = open_index(&config.vector_db, embedder.dimensions())?;
    let processor = DocumentProcessor::new(
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    )?;

    let options = GenerateOptions {
        temperature: config.llm.temperature,
        max_tokens: config.llm.max_tokens,
        context_window: config.llm.context_window,
    };

    Ok(RagChain::new(
        index,
        embedder,
        llm,
        processor,
        options,
        config.retrieval.top_k,
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "askdoc=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::from_env().context("invalid configuration")?;

    match cli.command {
        Command::Ingest { files, urls } => {
            if files.is_empty() && urls.is_empty() {
                anyhow::bail!("nothing to ingest: pass files and/or --url");
            }

            let chain = build_chain(&config).await?;
            let (report, _) = chain.ingest(&files, &urls).await?;

            println!(
                "Ingested {} chunks from {} sources",
                report.chunks_written, report.sources_ingested
            );
            for failure in &report.failures {
                eprintln!("  failed: {} ({})", failure.source, failure.error);
            }
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
        Command::Query { question, top_k } => {
            let chain = build_chain(&config).await?;
            let result = match top_k {
                Some(k) => chain.query_with_top_k(&question, k).await,
                None => chain.query(&question).await,
            };

            println!("{}\n", result.answer);
            if !result.sources.is_empty() {
                println!("Sources:");
                for (i, source) in result.sources.iter().enumerate() {
                    println!("  [{}] {}", i + 1, source.metadata.source);
                }
            }
        }
    }

    Ok(())
}
