use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docs_rag::models::EngineConfig;
use docs_rag::store::{EngineBuilder, RemoteEngineBuilder};
use docs_rag::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Split local documents and upsert them into a Pinecone index")]
struct Cli {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: String,
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_key: String,
    #[arg(long, env = "PINECONE_INDEX")]
    index: String,
    /// Files to ingest (.txt, .md, .pdf)
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::from_env();
    let engine_config = EngineConfig {
        openai_key: cli.openai_key,
        pinecone_key: cli.pinecone_key,
        index_name: cli.index,
    };
    engine_config.validate()?;

    let engine = RemoteEngineBuilder::new(config)
        .build(&engine_config)
        .await
        .context("failed to configure engine")?;

    let mut total = 0;
    for file in &cli.files {
        let created = engine
            .ingest(file)
            .await
            .with_context(|| format!("failed to ingest {}", file.display()))?;
        println!("{}: {} chunks", file.display(), created);
        total += created;
    }

    println!(
        "Ingest complete. files={} chunks={} index={}",
        cli.files.len(),
        total,
        engine.index_name()
    );

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
