use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use tempfile::NamedTempFile;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::error::RagError;
use crate::ingest::DocumentKind;
use crate::models::{
    AskRequest, AskResponse, ConfigureResponse, EngineConfig, HealthResponse, IngestResponse,
};
use crate::store::ConfigStore;

/// Multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    store: ConfigStore,
}

impl AppState {
    pub fn new(config: AppConfig, store: ConfigStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health_handler))
        .route("/configure", post(configure_handler))
        .route("/ask", post(ask_handler))
        .route("/ingest", post(ingest_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_server(config: AppConfig, store: ConfigStore) -> Result<()> {
    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("failed to create upload dir {}", config.upload_dir.display()))?;

    let addr: SocketAddr = config.bind_addr.parse()?;
    let app = build_router(AppState::new(config, store));

    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let active = state.store.active().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        configured: active.is_some(),
        index_name: active.map(|engine| engine.index_name().to_string()),
    })
}

async fn configure_handler(
    State(state): State<AppState>,
    payload: Result<Json<EngineConfig>, JsonRejection>,
) -> Result<Json<ConfigureResponse>, ApiError> {
    let Json(request) = payload?;
    let engine = state.store.configure(request).await?;

    Ok(Json(ConfigureResponse {
        status: "configured".to_string(),
        index_name: engine.index_name().to_string(),
    }))
}

async fn ask_handler(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
    let Json(request) = payload?;
    let engine = state.store.engine().await?;
    let answer = engine.ask(&request.question, request.top_k).await?;
    Ok(Json(AskResponse { answer }))
}

async fn ingest_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    let engine = state.store.engine().await?;

    let (raw_name, data) = read_upload(&mut multipart).await?;
    let filename = sanitize_filename(&raw_name);
    DocumentKind::from_path(Path::new(&filename))?;

    tracing::info!(filename = %filename, bytes = data.len(), "received upload");

    let upload = write_temp_upload(&state.config.upload_dir, &filename, &data).await?;
    let result = engine.ingest_as(upload.path(), &filename).await;
    if let Err(err) = upload.close() {
        tracing::warn!(filename = %filename, "failed to remove temporary upload: {}", err);
    }

    let chunks_created = result?;
    Ok(Json(IngestResponse {
        filename,
        chunks_created,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| RagError::InvalidRequest("upload is missing a filename".to_string()))?;
        let data = field.bytes().await?;
        return Ok((filename, data));
    }

    Err(RagError::InvalidRequest(format!("multipart body has no `{UPLOAD_FIELD}` part")).into())
}

/// Drops any client-supplied directory components.
fn sanitize_filename(raw: &str) -> String {
    raw.rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("upload")
        .to_string()
}

/// Writes the upload to a temp file that is deleted when the handle drops.
async fn write_temp_upload(dir: &Path, filename: &str, data: &[u8]) -> Result<NamedTempFile> {
    let suffix = Path::new(filename)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let upload = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(&suffix)
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temporary upload in {}", dir.display()))?;

    tokio::fs::write(upload.path(), data)
        .await
        .context("failed to write temporary upload")?;

    Ok(upload)
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl From<RagError> for ApiError {
    fn from(value: RagError) -> Self {
        let status = if value.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status.is_server_error() {
            tracing::error!("request failed: {}", value);
        } else {
            tracing::warn!("request rejected: {}", value);
        }

        Self {
            status,
            kind: value.kind(),
            message: value.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(value: anyhow::Error) -> Self {
        tracing::error!("request failed: {:#}", value);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal_error",
            message: format!("{value:#}"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        tracing::warn!("request rejected: {}", value.body_text());
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "invalid_request",
            message: value.body_text(),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(value: MultipartError) -> Self {
        Self {
            status: value.status(),
            kind: "invalid_upload",
            message: value.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.kind, "detail": self.message });
        (self.status, Json(body)).into_response()
    }
}
