use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docs_rag::models::{EngineConfig, DEFAULT_TOP_K};
use docs_rag::store::{EngineBuilder, RemoteEngineBuilder};
use docs_rag::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "ask")]
#[command(about = "Answer one question from a Pinecone index")]
struct Cli {
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_key: String,
    #[arg(long, env = "PINECONE_API_KEY", hide_env_values = true)]
    pinecone_key: String,
    #[arg(long, env = "PINECONE_INDEX")]
    index: String,
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    top_k: usize,
    /// Print the retrieved chunks before the answer
    #[arg(long, default_value_t = false)]
    show_sources: bool,
    question: String,
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

    if cli.show_sources {
        for (rank, hit) in engine.retrieve(&cli.question, cli.top_k).await?.iter().enumerate() {
            println!(
                "[{}] score={:.3} source={} chunk={}",
                rank + 1,
                hit.score,
                hit.chunk.metadata.source,
                hit.chunk.metadata.chunk_index
            );
        }
        println!();
    }

    let answer = engine.ask(&cli.question, cli.top_k).await?;
    println!("{answer}");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
