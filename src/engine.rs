use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use uuid::Uuid;

use crate::config::ChunkConfig;
use crate::error::{RagError, Result, Service};
use crate::ingest::{self, DocumentKind};
use crate::models::{ScoredChunk, VectorRecord};
use crate::provider::{Embedder, Generator, VectorStore};

const ANSWER_INSTRUCTION: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Retrieval + generation over one configured index.
#[derive(Clone)]
pub struct RagEngine {
    chunking: ChunkConfig,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    generator: Arc<dyn Generator>,
}

impl RagEngine {
    pub fn new(
        chunking: ChunkConfig,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            chunking,
            embedder,
            store,
            generator,
        }
    }

    pub fn index_name(&self) -> &str {
        self.store.index_name()
    }

    pub async fn ask(&self, question: &str, top_k: usize) -> Result<String> {
        let started = Instant::now();

        let retrieved = self.retrieve(question, top_k).await?;
        let prompt = build_prompt(question, &retrieved);

        let answer = self
            .generator
            .generate(&prompt)
            .await
            .map_err(|err| RagError::external(Service::Generation, err))?;

        tracing::info!(
            index = %self.index_name(),
            top_k,
            retrieved = retrieved.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "answered question"
        );

        Ok(answer)
    }

    /// The `top_k` stored chunks closest to `question`, most similar first.
    pub async fn retrieve(&self, question: &str, top_k: usize) -> Result<Vec<ScoredChunk>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(RagError::InvalidRequest("question must not be empty".to_string()));
        }
        if top_k == 0 {
            return Err(RagError::InvalidRequest("top_k must be at least 1".to_string()));
        }

        let embedding = self
            .embedder
            .embed(question)
            .await
            .map_err(|err| RagError::external(Service::Embedding, err))?;

        let mut hits = self
            .store
            .search(&embedding, top_k)
            .await
            .map_err(|err| RagError::external(Service::VectorStore, err))?;

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Ingests `path`, recording its file name as the chunk source.
    pub async fn ingest(&self, path: &Path) -> Result<usize> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.ingest_as(path, &source).await
    }

    pub async fn ingest_as(&self, path: &Path, source: &str) -> Result<usize> {
        let kind = DocumentKind::from_path(path)?;
        let started = Instant::now();

        let segments = ingest::load_document(path, kind).await?;
        let chunks = ingest::build_chunks(&segments, source, kind, self.chunking);

        if chunks.is_empty() {
            tracing::warn!(source, kind = kind.as_str(), "document produced no text; nothing to index");
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|err| RagError::external(Service::Embedding, err))?;

        if vectors.len() != chunks.len() {
            return Err(RagError::external(
                Service::Embedding,
                anyhow::anyhow!(
                    "embedding service returned {} vectors for {} chunks",
                    vectors.len(),
                    chunks.len()
                ),
            ));
        }

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRecord {
                id: Uuid::new_v4().to_string(),
                vector,
                chunk,
            })
            .collect();

        self.store
            .upsert(&records)
            .await
            .map_err(|err| RagError::external(Service::VectorStore, err))?;

        tracing::info!(
            index = %self.index_name(),
            source,
            kind = kind.as_str(),
            segments = segments.len(),
            chunks = records.len(),
            latency_ms = started.elapsed().as_millis() as u64,
            "ingested document"
        );

        Ok(records.len())
    }
}

impl fmt::Debug for RagEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagEngine")
            .field("index_name", &self.index_name())
            .field("chunking", &self.chunking)
            .finish_non_exhaustive()
    }
}

/// Instruction, then retrieved texts in rank order, then the question.
pub fn build_prompt(question: &str, retrieved: &[ScoredChunk]) -> String {
    let context = retrieved
        .iter()
        .map(|hit| hit.chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{ANSWER_INSTRUCTION}\n\n{context}\n\nQuestion: {}\nHelpful Answer:", question.trim())
}
