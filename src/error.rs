//! Error types for the docqa library.
//!
//! Every failure a request can hit is a variant of [`DocQaError`]. The
//! variants are grouped by where they originate (upload validation, PDF
//! parsing, session lookup, LLM gateway) and [`DocQaError::status_code`]
//! turns each group into the HTTP status the server reports.
//!
//! Summaries are best-effort: a gateway failure on a summarization path never
//! surfaces as an error. That decision is made in [`crate::service`], not here,
//! so this type stays a plain description of what went wrong.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// All errors returned by the docqa library.
#[derive(Debug, Error)]
pub enum DocQaError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Uploaded part did not declare `application/pdf`.
    #[error("Only PDF files are supported (got content type '{content_type}').")]
    UnsupportedContentType { content_type: String },

    /// Uploaded file exceeds the configured size cap.
    #[error("File too large (max {max} bytes).")]
    FileTooLarge { max: usize },

    /// Multipart body had no `file` field.
    #[error("Missing 'file' field in multipart upload.")]
    MissingFile,

    /// Multipart body could not be read.
    #[error("Failed to read upload: {0}")]
    MalformedUpload(String),

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not load or read the document.
    #[error("Failed to process PDF: {detail}")]
    PdfProcessing { detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Place libpdfium next to the binary, install it system-wide, or set PDFIUM_LIB_PATH."
    )]
    PdfiumBindingFailed(String),

    // ── Session errors ────────────────────────────────────────────────────
    /// No live session carries this identifier.
    #[error("Session not found.")]
    SessionNotFound { session_id: String },

    /// None of the identifiers of a multi-document request resolved.
    #[error("No valid documents found.")]
    NoValidDocuments,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM call failed.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM call exceeded the locally configured timeout.
    #[error("LLM call timed out after {secs}s")]
    LlmTimeout { secs: u64 },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocQaError {
    /// HTTP status reported for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DocQaError::UnsupportedContentType { .. }
            | DocQaError::FileTooLarge { .. }
            | DocQaError::MissingFile
            | DocQaError::MalformedUpload(_)
            | DocQaError::PdfProcessing { .. } => StatusCode::BAD_REQUEST,
            DocQaError::SessionNotFound { .. } | DocQaError::NoValidDocuments => {
                StatusCode::NOT_FOUND
            }
            DocQaError::PdfiumBindingFailed(_)
            | DocQaError::ProviderNotConfigured { .. }
            | DocQaError::LlmApiError { .. }
            | DocQaError::LlmTimeout { .. }
            | DocQaError::InvalidConfig(_)
            | DocQaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            DocQaError::UnsupportedContentType { .. } => "unsupported_content_type",
            DocQaError::FileTooLarge { .. } => "file_too_large",
            DocQaError::MissingFile => "missing_file",
            DocQaError::MalformedUpload(_) => "malformed_upload",
            DocQaError::PdfProcessing { .. } => "pdf_processing_failed",
            DocQaError::PdfiumBindingFailed(_) => "pdfium_unavailable",
            DocQaError::SessionNotFound { .. } => "session_not_found",
            DocQaError::NoValidDocuments => "no_valid_documents",
            DocQaError::ProviderNotConfigured { .. } => "provider_not_configured",
            DocQaError::LlmApiError { .. } => "llm_error",
            DocQaError::LlmTimeout { .. } => "llm_timeout",
            DocQaError::InvalidConfig(_) => "invalid_config",
            DocQaError::Internal(_) => "internal_error",
        }
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl IntoResponse for DocQaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }

        let body = Json(ErrorResponse {
            error: self.code(),
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}
