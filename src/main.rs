use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use docs_rag::store::RemoteEngineBuilder;
use docs_rag::{run_server, AppConfig, ConfigStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env();
    let store = ConfigStore::new(Arc::new(RemoteEngineBuilder::new(config.clone())));

    run_server(config, store).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
