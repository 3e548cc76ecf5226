use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// External boundary a failed call belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Embedding,
    VectorStore,
    Generation,
}

impl Service {
    pub fn as_str(self) -> &'static str {
        match self {
            Service::Embedding => "embedding",
            Service::VectorStore => "vector store",
            Service::Generation => "generation",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("configuration failed: {0}")]
    Configuration(String),

    #[error("engine is not configured; call /configure first")]
    NotConfigured,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to load {}: {source:#}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("{service} service call failed: {source:#}")]
    ExternalService {
        service: Service,
        #[source]
        source: anyhow::Error,
    },
}

impl RagError {
    pub fn external(service: Service, source: anyhow::Error) -> Self {
        RagError::ExternalService { service, source }
    }

    pub fn document(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        RagError::Document {
            path: path.into(),
            source,
        }
    }

    /// Stable machine-readable tag used in HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::UnsupportedFormat { .. } => "unsupported_format",
            RagError::Configuration(_) => "configuration_error",
            RagError::NotConfigured => "not_configured",
            RagError::InvalidRequest(_) => "invalid_request",
            RagError::Document { .. } => "document_error",
            RagError::ExternalService { .. } => "external_service_error",
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RagError::UnsupportedFormat { .. }
                | RagError::Configuration(_)
                | RagError::NotConfigured
                | RagError::InvalidRequest(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_classified() {
        assert!(RagError::NotConfigured.is_client_error());
        assert!(RagError::UnsupportedFormat {
            extension: ".docx".to_string()
        }
        .is_client_error());
        assert!(!RagError::external(Service::Generation, anyhow::anyhow!("boom")).is_client_error());
    }

    #[test]
    fn external_error_message_names_service_and_cause() {
        let err = RagError::external(
            Service::VectorStore,
            anyhow::anyhow!("connection refused").context("pinecone query failed"),
        );
        let message = err.to_string();
        assert!(message.starts_with("vector store service call failed"));
        assert!(message.contains("connection refused"));
        assert_eq!(err.kind(), "external_service_error");
    }
}
