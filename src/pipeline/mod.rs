//! Pipeline stages shared by every request handler.
//!
//! Each submodule does one step, so each can be tested (or faked) on its
//! own.
//!
//! ## Data Flow
//!
//! ```text
//! extract ──▶ context ──▶ prompts ──▶ llm
//! (pdfium)    (budget)    (template)  (provider)
//! ```
//!
//! 1. [`extract`]: validate the upload and pull one text string per page;
//!    runs in `spawn_blocking` because pdfium is blocking
//! 2. [`context`]: join pages with `[Document i][Page j]` markers and cut
//!    to a character budget
//! 3. [`llm`]: one call to the configured provider; the only stage with
//!    network I/O

pub mod context;
pub mod extract;
pub mod llm;
