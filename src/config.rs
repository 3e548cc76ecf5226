use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct ModelConfig {
    pub answer_model: String,
    pub embedding_model: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkConfig {
    /// Distance in characters between the starts of consecutive chunks.
    pub fn step(&self) -> usize {
        self.chunk_size.saturating_sub(self.chunk_overlap).max(1)
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub openai_base_url: String,
    pub pinecone_control_url: String,
    pub pinecone_namespace: Option<String>,
    pub models: ModelConfig,
    pub chunking: ChunkConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            upload_dir: env::temp_dir(),
            max_upload_bytes: 25 * 1024 * 1024,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            pinecone_control_url: "https://api.pinecone.io".to_string(),
            pinecone_namespace: None,
            models: ModelConfig {
                answer_model: "gpt-4-turbo-preview".to_string(),
                embedding_model: "text-embedding-ada-002".to_string(),
            },
            chunking: ChunkConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: env::var("DOCS_RAG_BIND").unwrap_or(defaults.bind_addr),
            upload_dir: env::var("DOCS_RAG_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes: parse_env("DOCS_RAG_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            pinecone_control_url: env::var("PINECONE_CONTROL_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.pinecone_control_url),
            pinecone_namespace: env::var("PINECONE_NAMESPACE")
                .ok()
                .filter(|ns| !ns.trim().is_empty()),
            models: ModelConfig {
                answer_model: env::var("ANSWER_MODEL").unwrap_or(defaults.models.answer_model),
                embedding_model: env::var("EMBEDDING_MODEL")
                    .unwrap_or(defaults.models.embedding_model),
            },
            chunking: ChunkConfig {
                chunk_size: parse_env("CHUNK_SIZE").unwrap_or(defaults.chunking.chunk_size),
                chunk_overlap: parse_env("CHUNK_OVERLAP")
                    .unwrap_or(defaults.chunking.chunk_overlap),
            },
        }
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
