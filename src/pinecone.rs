use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ingest::DocumentKind;
use crate::models::{Chunk, ChunkMetadata, ScoredChunk, VectorRecord};
use crate::provider::{error_detail, VectorStore};

const API_VERSION: &str = "2024-07";
/// Vectors per upsert request.
const UPSERT_BATCH_SIZE: usize = 100;

/// Data-plane client for one Pinecone index.
#[derive(Clone)]
pub struct PineconeStore {
    client: Client,
    host_url: String,
    api_key: String,
    index_name: String,
    namespace: Option<String>,
}

impl PineconeStore {
    /// Resolves the index host through the control plane. Fails when the key is
    /// rejected or the index does not exist.
    pub async fn connect(
        control_url: &str,
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        namespace: Option<String>,
    ) -> Result<Self> {
        #[derive(Deserialize)]
        struct DescribeIndexResp {
            host: String,
        }

        let client = Client::new();
        let api_key = api_key.into();
        let index_name = index_name.into();

        let url = format!("{}/indexes/{}", control_url.trim_end_matches('/'), index_name);
        let response = client
            .get(url)
            .header("Api-Key", &api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .send()
            .await
            .context("failed to contact pinecone control plane")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "pinecone describe index {index_name} returned {status}: {}",
                error_detail(&body)
            );
        }

        let described = response
            .json::<DescribeIndexResp>()
            .await
            .context("failed to decode pinecone describe index response")?;

        tracing::debug!(index = %index_name, host = %described.host, "resolved pinecone index host");

        Ok(Self {
            client,
            host_url: host_url(&described.host),
            api_key,
            index_name,
            namespace,
        })
    }

    /// Uses a known data-plane host without contacting the control plane.
    #[cfg(test)]
    pub(crate) fn with_host(
        host: &str,
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        namespace: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            host_url: host_url(host),
            api_key: api_key.into(),
            index_name: index_name.into(),
            namespace,
        }
    }

    fn post(&self, route: &str) -> RequestBuilder {
        self.client
            .post(format!("{}{}", self.host_url, route))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }
}

#[async_trait]
impl VectorStore for PineconeStore {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let vectors: Vec<PineconeVector<'_>> = batch
                .iter()
                .map(|record| PineconeVector {
                    id: &record.id,
                    values: &record.vector,
                    metadata: PineconeMetadata::from_chunk(&record.chunk),
                })
                .collect();

            let mut body = json!({ "vectors": vectors });
            if let Some(namespace) = &self.namespace {
                body["namespace"] = json!(namespace);
            }

            let response = self
                .post("/vectors/upsert")
                .json(&body)
                .send()
                .await
                .context("failed to contact pinecone during upsert")?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("pinecone upsert returned {status}: {}", error_detail(&body));
            }
        }

        Ok(())
    }

    async fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if vector.is_empty() || top_k == 0 {
            return Ok(vec![]);
        }

        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }

        let response = self
            .post("/query")
            .json(&body)
            .send()
            .await
            .context("failed to contact pinecone during query")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("pinecone query returned {status}: {}", error_detail(&body));
        }

        let response = response
            .json::<QueryResponse>()
            .await
            .context("failed to decode pinecone query response")?;

        Ok(response
            .matches
            .into_iter()
            .filter_map(|m| {
                let metadata: PineconeMetadata = serde_json::from_value(m.metadata?).ok()?;
                Some(ScoredChunk {
                    chunk: metadata.into_chunk(),
                    score: m.score,
                })
            })
            .collect())
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

fn host_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: PineconeMetadata,
}

/// Flat metadata as stored with each vector; chunk text lives under `text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PineconeMetadata {
    text: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    kind: Option<DocumentKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    page: Option<u32>,
    #[serde(default)]
    chunk_index: usize,
    #[serde(default)]
    start_offset: usize,
}

impl PineconeMetadata {
    fn from_chunk(chunk: &Chunk) -> Self {
        Self {
            text: chunk.text.clone(),
            source: chunk.metadata.source.clone(),
            kind: Some(chunk.metadata.kind),
            page: chunk.metadata.page,
            chunk_index: chunk.metadata.chunk_index,
            start_offset: chunk.metadata.start_offset,
        }
    }

    fn into_chunk(self) -> Chunk {
        Chunk {
            text: self.text,
            metadata: ChunkMetadata {
                source: self.source,
                kind: self.kind.unwrap_or(DocumentKind::Text),
                page: self.page,
                chunk_index: self.chunk_index,
                start_offset: self.start_offset,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Deserialize)]
struct QueryMatch {
    score: f32,
    // Vectors written by other tools may lack our fields.
    metadata: Option<serde_json::Value>,
}
