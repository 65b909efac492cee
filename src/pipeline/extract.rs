//! Upload validation and per-page text extraction.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which does CPU-bound work
//! and holds internal locks. Extraction runs on Tokio's blocking pool so a
//! large document never stalls the worker threads serving other requests.
//!
//! ## Why validate first?
//!
//! The content-type and size checks are cheap and reject bad uploads before
//! pdfium ever sees the bytes.

use crate::error::DocQaError;
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// The only media type accepted for uploads.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Check an upload's declared media type. It must be exactly
/// `application/pdf`.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), DocQaError> {
    match content_type {
        Some(PDF_CONTENT_TYPE) => Ok(()),
        other => Err(DocQaError::UnsupportedContentType {
            content_type: other.unwrap_or("none").to_string(),
        }),
    }
}

/// Check an upload's declared content type and size.
///
/// The content type is checked first.
pub fn validate_upload(
    content_type: Option<&str>,
    len: usize,
    max_bytes: usize,
) -> Result<(), DocQaError> {
    validate_content_type(content_type)?;
    if len > max_bytes {
        return Err(DocQaError::FileTooLarge { max: max_bytes });
    }
    Ok(())
}

/// Turns PDF bytes into one plain-text string per page, in page order.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_pages(&self, bytes: Vec<u8>) -> Result<Vec<String>, DocQaError>;
}

/// [`TextExtractor`] backed by pdfium.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    /// Bind to pdfium from `./` or the system library paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to pdfium at `path`, which may name the library file itself or
    /// the directory containing it.
    pub fn with_library_path(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, DocQaError> {
        let bindings = match &self.library_path {
            Some(path) if path.is_dir() => {
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(path))
            }
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| DocQaError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }

    fn extract_blocking(&self, bytes: Vec<u8>) -> Result<Vec<String>, DocQaError> {
        let pdfium = self.bind()?;
        let size = bytes.len();

        let document = pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| DocQaError::PdfProcessing {
                detail: format!("{:?}", e),
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages, {} bytes", pages.len(), size);

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| DocQaError::PdfProcessing {
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
            let text = text.all();
            debug!("Extracted page {} → {} chars", idx + 1, text.chars().count());
            texts.push(text);
        }

        Ok(texts)
    }
}

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract_pages(&self, bytes: Vec<u8>) -> Result<Vec<String>, DocQaError> {
        let extractor = self.clone();
        tokio::task::spawn_blocking(move || extractor.extract_blocking(bytes))
            .await
            .map_err(|e| DocQaError::Internal(format!("Extraction task panicked: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    #[test]
    fn accepts_pdf_within_cap() {
        assert!(validate_upload(Some("application/pdf"), 10, 50 * MIB).is_ok());
        assert!(validate_upload(Some("application/pdf"), 50 * MIB, 50 * MIB).is_ok());
    }

    #[test]
    fn rejects_wrong_content_type() {
        for ct in [Some("text/plain"), Some("application/pdf; charset=binary"), None] {
            let err = validate_upload(ct, 10, 50 * MIB).unwrap_err();
            assert!(
                matches!(err, DocQaError::UnsupportedContentType { .. }),
                "{ct:?} → {err:?}"
            );
        }
    }

    #[test]
    fn rejects_oversized_upload() {
        let err = validate_upload(Some("application/pdf"), 50 * MIB + 1, 50 * MIB).unwrap_err();
        assert!(matches!(err, DocQaError::FileTooLarge { .. }));
    }

    #[test]
    fn content_type_alone() {
        assert!(validate_content_type(Some("application/pdf")).is_ok());
        assert!(matches!(
            validate_content_type(Some("application/octet-stream")),
            Err(DocQaError::UnsupportedContentType { .. })
        ));
    }

    #[test]
    fn content_type_checked_before_size() {
        let err = validate_upload(Some("image/png"), 100 * MIB, 50 * MIB).unwrap_err();
        assert!(matches!(err, DocQaError::UnsupportedContentType { .. }));
    }
}
