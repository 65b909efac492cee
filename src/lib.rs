//! # docqa
//!
//! Ask questions about uploaded PDF documents through a hosted LLM.
//!
//! Upload a PDF and the server extracts its text page by page, asks the model
//! for a short summary, and keeps the pages in a session. Questions against
//! one or several sessions are answered by sending the page text, marked up
//! with `[Document i][Page j]` citations, together with the question to the
//! model.
//!
//! ## Request Flow
//!
//! ```text
//! upload ──▶ validate ──▶ extract ──▶ summarize ──▶ store ──▶ {session_id, summary}
//!                         (pdfium)    (degradable)
//!
//! chat / chat-multi / summary-multi
//!        ──▶ lookup ──▶ context (char budget) ──▶ prompt ──▶ LLM ──▶ reply
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docqa::{build_router, AppState, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = ServerConfig::default();
//!     let app = build_router(AppState::from_config(&config)?);
//!     let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docqa` binary (clap + anyhow + tracing-subscriber + dotenvy) |
//!
//! ## Context Budgets
//!
//! | Request | Characters |
//! |---------|-----------|
//! | Upload summary | 12 000 |
//! | Chat | 24 000 |
//! | Chat / summary across documents | 48 000 |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod service;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ContextBudgets, ServerConfig, ServerConfigBuilder};
pub use error::DocQaError;
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::llm::{LlmGateway, ProviderGateway};
pub use server::{build_router, AppState};
pub use service::{DocumentService, GatewayPolicy, Operation, UploadOutcome};
pub use session::{spawn_sweeper, InMemorySessionStore, Session, SessionStore};
