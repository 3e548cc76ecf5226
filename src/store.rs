use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::config::AppConfig;
use crate::engine::RagEngine;
use crate::error::{RagError, Result};
use crate::models::EngineConfig;
use crate::openai::OpenAiClient;
use crate::pinecone::PineconeStore;

/// Turns caller credentials into a ready engine.
#[async_trait]
pub trait EngineBuilder: Send + Sync {
    async fn build(&self, config: &EngineConfig) -> anyhow::Result<RagEngine>;
}

/// Builds engines backed by OpenAI and Pinecone.
#[derive(Clone)]
pub struct RemoteEngineBuilder {
    config: AppConfig,
}

impl RemoteEngineBuilder {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineBuilder for RemoteEngineBuilder {
    async fn build(&self, engine_config: &EngineConfig) -> anyhow::Result<RagEngine> {
        let openai = Arc::new(OpenAiClient::new(
            engine_config.openai_key.trim(),
            self.config.openai_base_url.clone(),
            &self.config.models,
        ));

        let store = PineconeStore::connect(
            &self.config.pinecone_control_url,
            engine_config.pinecone_key.trim(),
            engine_config.index_name.trim(),
            self.config.pinecone_namespace.clone(),
        )
        .await
        .with_context(|| format!("failed to open pinecone index {}", engine_config.index_name.trim()))?;

        Ok(RagEngine::new(
            self.config.chunking,
            openai.clone(),
            Arc::new(store),
            openai,
        ))
    }
}

/// Single slot holding the active engine.
///
/// Readers take a clone of the `Arc`, so a request keeps the engine it started
/// with even if `configure` swaps the slot mid-flight.
#[derive(Clone)]
pub struct ConfigStore {
    builder: Arc<dyn EngineBuilder>,
    slot: Arc<RwLock<Option<Arc<RagEngine>>>>,
}

impl ConfigStore {
    pub fn new(builder: Arc<dyn EngineBuilder>) -> Self {
        Self {
            builder,
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// Builds an engine and replaces the current one. On failure the previous
    /// engine stays active.
    pub async fn configure(&self, config: EngineConfig) -> Result<Arc<RagEngine>> {
        config.validate()?;

        let engine = self
            .builder
            .build(&config)
            .await
            .map_err(|err| RagError::Configuration(format!("{err:#}")))?;
        let engine = Arc::new(engine);

        let previous = self.slot.write().await.replace(engine.clone());
        match previous {
            Some(old) => tracing::info!(
                previous_index = %old.index_name(),
                index = %engine.index_name(),
                "replaced active engine"
            ),
            None => tracing::info!(index = %engine.index_name(), "configured engine"),
        }

        Ok(engine)
    }

    pub async fn active(&self) -> Option<Arc<RagEngine>> {
        self.slot.read().await.clone()
    }

    pub async fn engine(&self) -> Result<Arc<RagEngine>> {
        self.active().await.ok_or(RagError::NotConfigured)
    }
}
