use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};
use crate::ingest::DocumentKind;

pub const DEFAULT_TOP_K: usize = 3;

/// Credentials and index for one engine. Deserialized from `POST /configure`.
#[derive(Clone, Deserialize)]
pub struct EngineConfig {
    pub openai_key: String,
    pub pinecone_key: String,
    pub index_name: String,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("openai_key", &self.openai_key),
            ("pinecone_key", &self.pinecone_key),
            ("index_name", &self.index_name),
        ] {
            if value.trim().is_empty() {
                return Err(RagError::Configuration(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }
}

// Keys stay out of logs.
impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("openai_key", &"<redacted>")
            .field("pinecone_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub kind: DocumentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub chunk_index: usize,
    pub start_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// A chunk paired with its embedding, ready for upsert.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureResponse {
    pub status: String,
    pub index_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub filename: String,
    pub chunks_created: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub configured: bool,
    pub index_name: Option<String>,
}
