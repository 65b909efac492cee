//! HTTP surface: axum router and handlers.
//!
//! Endpoints:
//! - POST   /upload            - multipart `file` (PDF) → session id + summary
//! - POST   /chat              - question about one session
//! - POST   /chat-multi        - question across several sessions
//! - POST   /summary-multi     - combined summary of several sessions
//! - DELETE /sessions/:id      - drop a session
//! - GET    /health            - liveness and session count
//!
//! Handlers are thin: they decode the request, call [`DocumentService`] and
//! encode the reply. Errors turn into responses through
//! [`DocQaError`]'s `IntoResponse` impl.

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::DocQaError;
use crate::pipeline::extract::{validate_content_type, PdfiumExtractor};
use crate::pipeline::llm::ProviderGateway;
use crate::service::{DocumentService, UploadOutcome};
use crate::session::{InMemorySessionStore, SessionStore};

/// Headroom above the upload cap for multipart boundaries and headers. The
/// upload handler stops reading a file part once it passes the cap, so the
/// body limit only trips on oversized non-file content.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

// ============================================================================
// State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    service: DocumentService,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(service: DocumentService, config: &ServerConfig) -> Self {
        Self {
            service,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Wire up the production components: in-memory store, pdfium extractor
    /// and the configured LLM provider.
    pub fn from_config(config: &ServerConfig) -> Result<Self, DocQaError> {
        let store: Arc<dyn SessionStore> = match config.session_ttl_secs {
            Some(secs) => Arc::new(InMemorySessionStore::with_ttl(Duration::from_secs(secs))),
            None => Arc::new(InMemorySessionStore::new()),
        };
        let extractor = match &config.pdfium_lib_path {
            Some(path) => PdfiumExtractor::with_library_path(path),
            None => PdfiumExtractor::new(),
        };
        let gateway = ProviderGateway::from_config(config)?;

        let service = DocumentService::new(config, store, Arc::new(extractor), Arc::new(gateway));
        Ok(Self::new(service, config))
    }

    pub fn service(&self) -> &DocumentService {
        &self.service
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Always null; kept for clients that expect the field.
    pub sources: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct MultiChatRequest {
    pub session_ids: Vec<String>,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct MultiChatResponse {
    pub answer: String,
}

#[derive(Debug, Deserialize)]
pub struct MultiSummaryRequest {
    pub session_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MultiSummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub service: &'static str,
    pub sessions: usize,
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router with permissive CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(health_check))
        .route("/upload", post(upload))
        .route("/chat", post(chat))
        .route("/chat-multi", post(chat_multi))
        .route("/summary-multi", post(summary_multi))
        .route("/sessions/:session_id", delete(delete_session))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: env!("CARGO_PKG_NAME"),
        sessions: state.service.store().len().await,
    })
}

/// POST /upload
///
/// Reads the `file` field and hands it to the service. The declared content
/// type is checked before any bytes are read, and reading stops as soon as
/// the part exceeds the size cap.
async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, DocQaError> {
    let max = state.max_upload_bytes;
    let read_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            DocQaError::FileTooLarge { max }
        } else {
            DocQaError::MalformedUpload(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(read_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field.content_type().map(|s| s.to_string());
        let filename = field.file_name().unwrap_or("unknown").to_string();
        validate_content_type(content_type.as_deref())?;

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            if data.len() + chunk.len() > max {
                return Err(DocQaError::FileTooLarge { max });
            }
            data.extend_from_slice(&chunk);
        }

        tracing::debug!(
            filename = %filename,
            content_type = ?content_type,
            bytes = data.len(),
            "Received upload"
        );

        let outcome = state
            .service
            .upload(content_type.as_deref(), data)
            .await?;
        return Ok(Json(outcome));
    }

    Err(DocQaError::MissingFile)
}

/// POST /chat
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, DocQaError> {
    let answer = state.service.chat(&req.session_id, &req.question).await?;
    Ok(Json(ChatResponse {
        answer,
        sources: None,
    }))
}

/// POST /chat-multi
async fn chat_multi(
    State(state): State<AppState>,
    Json(req): Json<MultiChatRequest>,
) -> Result<Json<MultiChatResponse>, DocQaError> {
    let answer = state
        .service
        .chat_multi(&req.session_ids, &req.question)
        .await?;
    Ok(Json(MultiChatResponse { answer }))
}

/// POST /summary-multi
async fn summary_multi(
    State(state): State<AppState>,
    Json(req): Json<MultiSummaryRequest>,
) -> Result<Json<MultiSummaryResponse>, DocQaError> {
    let summary = state.service.summary_multi(&req.session_ids).await?;
    Ok(Json(MultiSummaryResponse { summary }))
}

/// DELETE /sessions/:session_id
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, DocQaError> {
    state.service.delete(&session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
