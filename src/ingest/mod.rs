pub mod markdown;
pub mod pdf;
pub mod split;

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::config::ChunkConfig;
use crate::error::{RagError, Result};
use crate::models::{Chunk, ChunkMetadata};

/// Loader selected from a file extension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Text,
    Pdf,
    Markdown,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(DocumentKind::Text),
            "pdf" => Ok(DocumentKind::Pdf),
            "md" => Ok(DocumentKind::Markdown),
            "" => Err(RagError::UnsupportedFormat {
                extension: "<none>".to_string(),
            }),
            other => Err(RagError::UnsupportedFormat {
                extension: format!(".{other}"),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Pdf => "pdf",
            DocumentKind::Markdown => "markdown",
        }
    }
}

/// Raw text produced by a loader, before splitting.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub text: String,
    pub page: Option<u32>,
}

pub async fn load_document(path: &Path, kind: DocumentKind) -> Result<Vec<Segment>> {
    let segments = match kind {
        DocumentKind::Text => {
            let text = read_text(path).await?;
            vec![Segment { text, page: None }]
        }
        DocumentKind::Markdown => {
            let raw = read_text(path).await?;
            vec![Segment {
                text: markdown::to_plain_text(&raw),
                page: None,
            }]
        }
        DocumentKind::Pdf => {
            let pdf_path = path.to_path_buf();
            tokio::task::spawn_blocking(move || pdf::extract_pages(&pdf_path))
                .await
                .context("PDF extraction task panicked")
                .and_then(|res| res)
                .map_err(|err| RagError::document(path, err))?
        }
    };

    Ok(segments
        .into_iter()
        .filter(|segment| !segment.text.trim().is_empty())
        .collect())
}

async fn read_text(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed reading {}", path.display()))
        .map_err(|err| RagError::document(path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Splits every segment into windows; `chunk_index` runs across the whole document.
/// Whitespace-only windows are skipped, the rest keep their original offsets.
pub fn build_chunks(
    segments: &[Segment],
    source: &str,
    kind: DocumentKind,
    chunking: ChunkConfig,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for segment in segments {
        for window in split::split_text(&segment.text, chunking) {
            if window.text.trim().is_empty() {
                continue;
            }
            chunks.push(Chunk {
                text: window.text,
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    kind,
                    page: segment.page,
                    chunk_index: chunks.len(),
                    start_offset: window.start,
                },
            });
        }
    }

    chunks
}
