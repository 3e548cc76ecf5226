#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use docs_rag::config::{AppConfig, ChunkConfig};
use docs_rag::models::{EngineConfig, ScoredChunk, VectorRecord};
use docs_rag::provider::{Embedder, Generator, VectorStore};
use docs_rag::server::{build_router, AppState};
use docs_rag::store::{ConfigStore, EngineBuilder};
use docs_rag::RagEngine;

pub const BOUNDARY: &str = "docs-rag-test-boundary";

/// Three-dimensional embedding: counts of 'a', counts of 'b', and a bias term.
pub struct LetterEmbedder;

pub fn letter_vector(text: &str) -> Vec<f32> {
    let a = text.chars().filter(|c| *c == 'a').count() as f32;
    let b = text.chars().filter(|c| *c == 'b').count() as f32;
    vec![a, b, 1.0]
}

#[async_trait]
impl Embedder for LetterEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(letter_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| letter_vector(t)).collect())
    }
}

pub struct MemoryStore {
    index_name: String,
    fail_upserts: bool,
    pub records: Mutex<Vec<VectorRecord>>,
}

impl MemoryStore {
    pub fn new(index_name: &str) -> Self {
        Self {
            index_name: index_name.to_string(),
            fail_upserts: index_name == "broken",
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if self.fail_upserts {
            anyhow::bail!("index {} rejected the upsert", self.index_name);
        }
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let mut hits: Vec<ScoredChunk> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .map(|record| ScoredChunk {
                chunk: record.chunk.clone(),
                score: cosine(vector, &record.vector),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
        hits.truncate(top_k);
        Ok(hits)
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

/// Echoes the prompt, tagged with the index it was configured for.
pub struct EchoGenerator {
    index_name: String,
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(format!("[{}] {}", self.index_name, prompt))
    }
}

/// Builds engines whose stores persist per index name across reconfiguration.
#[derive(Default)]
pub struct FakeBuilder {
    pub stores: Mutex<HashMap<String, Arc<MemoryStore>>>,
}

impl FakeBuilder {
    pub fn store(&self, index_name: &str) -> Arc<MemoryStore> {
        self.stores
            .lock()
            .unwrap()
            .entry(index_name.to_string())
            .or_insert_with(|| Arc::new(MemoryStore::new(index_name)))
            .clone()
    }
}

#[async_trait]
impl EngineBuilder for FakeBuilder {
    async fn build(&self, config: &EngineConfig) -> Result<RagEngine> {
        if config.pinecone_key == "pc-invalid" {
            anyhow::bail!("pinecone describe index returned 401 Unauthorized");
        }
        Ok(RagEngine::new(
            ChunkConfig::default(),
            Arc::new(LetterEmbedder),
            self.store(&config.index_name),
            Arc::new(EchoGenerator {
                index_name: config.index_name.clone(),
            }),
        ))
    }
}

pub struct TestApp {
    pub router: Router,
    pub builder: Arc<FakeBuilder>,
    pub upload_dir: tempfile::TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: upload_dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let builder = Arc::new(FakeBuilder::default());
        let store = ConfigStore::new(builder.clone());
        let router = build_router(AppState::new(config, store));

        Self {
            router,
            builder,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn configure(&self, index_name: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "/configure",
            serde_json::json!({
                "openai_key": "sk-test",
                "pinecone_key": "pc-test",
                "index_name": index_name,
            }),
        ))
        .await
    }

    pub fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path()).unwrap().next().is_none()
    }
}

pub fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn upload_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/ingest")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
