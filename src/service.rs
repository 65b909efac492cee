//! The document operations: upload, chat, chat-multi, summary-multi.
//!
//! [`DocumentService`] composes the pipeline stages with a session store and
//! knows nothing about HTTP, so the same operations can be driven from the
//! axum handlers in [`crate::server`] or directly from library code.
//!
//! ## Failure policy
//!
//! What happens when the model call fails is decided per operation by
//! [`Operation::gateway_policy`]: summaries degrade to
//! [`SUMMARY_PLACEHOLDER`], answers propagate the error.

use crate::config::{ContextBudgets, ServerConfig};
use crate::error::DocQaError;
use crate::pipeline::context::{build_context, DocumentPages};
use crate::pipeline::extract::{validate_upload, TextExtractor};
use crate::pipeline::llm::LlmGateway;
use crate::prompts::{
    chat_prompt, multi_chat_prompt, multi_summary_prompt, summary_prompt, SUMMARY_PLACEHOLDER,
};
use crate::session::{Session, SessionStore};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The operations that call the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Upload,
    Chat,
    ChatMulti,
    SummaryMulti,
}

/// What to do when the model call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayPolicy {
    /// Replace the reply with [`SUMMARY_PLACEHOLDER`] and carry on.
    Degrade,
    /// Fail the request.
    Propagate,
}

impl Operation {
    /// Summaries are best-effort; answers are not.
    pub fn gateway_policy(self) -> GatewayPolicy {
        match self {
            Operation::Upload | Operation::SummaryMulti => GatewayPolicy::Degrade,
            Operation::Chat | Operation::ChatMulti => GatewayPolicy::Propagate,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Upload => "upload",
            Operation::Chat => "chat",
            Operation::ChatMulti => "chat-multi",
            Operation::SummaryMulti => "summary-multi",
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub session_id: String,
    pub summary: String,
}

/// Upload, chat and summarize documents.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn SessionStore>,
    extractor: Arc<dyn TextExtractor>,
    gateway: Arc<dyn LlmGateway>,
    budgets: ContextBudgets,
    max_upload_bytes: usize,
}

impl DocumentService {
    pub fn new(
        config: &ServerConfig,
        store: Arc<dyn SessionStore>,
        extractor: Arc<dyn TextExtractor>,
        gateway: Arc<dyn LlmGateway>,
    ) -> Self {
        Self {
            store,
            extractor,
            gateway,
            budgets: config.budgets,
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Validate, extract, summarize and store an uploaded PDF.
    pub async fn upload(
        &self,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> Result<UploadOutcome, DocQaError> {
        let start = Instant::now();
        validate_upload(content_type, bytes.len(), self.max_upload_bytes)?;

        let pages = self.extractor.extract_pages(bytes).await?;
        debug!("Extracted {} pages in {:?}", pages.len(), start.elapsed());

        let context = build_context(&[DocumentPages::unlabeled(&pages)], self.budgets.summary);
        let summary = self.ask(Operation::Upload, &summary_prompt(&context)).await?;

        let session = self.store.insert(Session::new(pages, summary)).await;
        info!(
            "Upload complete: session {} ({} pages) in {}ms",
            session.id,
            session.pages.len(),
            start.elapsed().as_millis()
        );

        Ok(UploadOutcome {
            session_id: session.id.clone(),
            summary: session.summary.clone(),
        })
    }

    /// Answer a question about one document.
    pub async fn chat(&self, session_id: &str, question: &str) -> Result<String, DocQaError> {
        let session = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| DocQaError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let context = build_context(&[DocumentPages::unlabeled(&session.pages)], self.budgets.chat);
        self.ask(Operation::Chat, &chat_prompt(&context, question))
            .await
    }

    /// Answer a question across several documents.
    pub async fn chat_multi(
        &self,
        session_ids: &[String],
        question: &str,
    ) -> Result<String, DocQaError> {
        let sessions = self.resolve_all(session_ids).await?;
        let context = self.multi_context(&sessions);
        self.ask(Operation::ChatMulti, &multi_chat_prompt(&context, question))
            .await
    }

    /// Summarize several documents together.
    pub async fn summary_multi(&self, session_ids: &[String]) -> Result<String, DocQaError> {
        let sessions = self.resolve_all(session_ids).await?;
        let context = self.multi_context(&sessions);
        self.ask(Operation::SummaryMulti, &multi_summary_prompt(&context))
            .await
    }

    /// Delete a session.
    pub async fn delete(&self, session_id: &str) -> Result<(), DocQaError> {
        if self.store.remove(session_id).await {
            Ok(())
        } else {
            Err(DocQaError::SessionNotFound {
                session_id: session_id.to_string(),
            })
        }
    }

    /// Look up every id, keeping each live session with its 1-based position
    /// in the caller's list. Unknown ids are skipped.
    async fn resolve_all(
        &self,
        session_ids: &[String],
    ) -> Result<Vec<(usize, Arc<Session>)>, DocQaError> {
        let mut resolved = Vec::with_capacity(session_ids.len());
        for (idx, id) in session_ids.iter().enumerate() {
            match self.store.get(id).await {
                Some(session) => resolved.push((idx + 1, session)),
                None => debug!("Skipping unknown session {}", id),
            }
        }

        if resolved.is_empty() {
            return Err(DocQaError::NoValidDocuments);
        }
        Ok(resolved)
    }

    fn multi_context(&self, sessions: &[(usize, Arc<Session>)]) -> String {
        let documents: Vec<DocumentPages<'_>> = sessions
            .iter()
            .map(|(label, session)| DocumentPages::labeled(*label, &session.pages))
            .collect();
        build_context(&documents, self.budgets.multi)
    }

    /// Call the gateway and apply the operation's failure policy.
    async fn ask(&self, op: Operation, prompt: &str) -> Result<String, DocQaError> {
        match self.gateway.complete(prompt).await {
            Ok(text) => Ok(text),
            Err(e) => match op.gateway_policy() {
                GatewayPolicy::Degrade => {
                    warn!("{}: summary failed, using placeholder: {}", op.name(), e);
                    Ok(SUMMARY_PLACEHOLDER.to_string())
                }
                GatewayPolicy::Propagate => {
                    warn!("{}: LLM call failed: {}", op.name(), e);
                    Err(e)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedPages(Vec<String>);

    #[async_trait]
    impl TextExtractor for FixedPages {
        async fn extract_pages(&self, _bytes: Vec<u8>) -> Result<Vec<String>, DocQaError> {
            Ok(self.0.clone())
        }
    }

    /// Records prompts; fails every call when `fail` is set.
    #[derive(Default)]
    struct Recorder {
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl LlmGateway for Recorder {
        async fn complete(&self, prompt: &str) -> Result<String, DocQaError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                Err(DocQaError::LlmApiError {
                    message: "boom".into(),
                })
            } else {
                Ok("reply".to_string())
            }
        }
    }

    fn service(gateway: Arc<Recorder>) -> DocumentService {
        DocumentService::new(
            &ServerConfig::default(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(FixedPages(vec!["first".into(), "second".into()])),
            gateway,
        )
    }

    #[test]
    fn policy_table() {
        assert_eq!(Operation::Upload.gateway_policy(), GatewayPolicy::Degrade);
        assert_eq!(Operation::SummaryMulti.gateway_policy(), GatewayPolicy::Degrade);
        assert_eq!(Operation::Chat.gateway_policy(), GatewayPolicy::Propagate);
        assert_eq!(Operation::ChatMulti.gateway_policy(), GatewayPolicy::Propagate);
    }

    #[tokio::test]
    async fn upload_summarizes_page_context() {
        let gw = Arc::new(Recorder::default());
        let svc = service(Arc::clone(&gw));
        let out = svc
            .upload(Some("application/pdf"), b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(out.summary, "reply");
        assert!(svc.store().get(&out.session_id).await.is_some());
        let prompts = gw.prompts.lock().unwrap();
        assert!(prompts[0].contains("[Page 1]\nfirst\n[Page 2]\nsecond"));
    }

    #[tokio::test]
    async fn upload_degrades_when_summary_fails() {
        let gw = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let svc = service(gw);
        let out = svc
            .upload(Some("application/pdf"), b"%PDF-1.4".to_vec())
            .await
            .unwrap();
        assert_eq!(out.summary, SUMMARY_PLACEHOLDER);
    }

    #[tokio::test]
    async fn upload_rejects_before_extraction() {
        let gw = Arc::new(Recorder::default());
        let svc = service(Arc::clone(&gw));
        let err = svc
            .upload(Some("text/plain"), b"hello".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocQaError::UnsupportedContentType { .. }));
        assert!(gw.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_propagates_gateway_failure() {
        let ok = service(Arc::new(Recorder::default()));
        let id = ok
            .upload(Some("application/pdf"), vec![])
            .await
            .unwrap()
            .session_id;

        let failing = DocumentService {
            gateway: Arc::new(Recorder {
                fail: true,
                ..Default::default()
            }),
            ..ok.clone()
        };
        let err = failing.chat(&id, "what?").await.unwrap_err();
        assert!(matches!(err, DocQaError::LlmApiError { .. }));
    }

    #[tokio::test]
    async fn chat_unknown_session_is_not_found() {
        let svc = service(Arc::new(Recorder::default()));
        let err = svc.chat("nope", "what?").await.unwrap_err();
        assert!(matches!(err, DocQaError::SessionNotFound { .. }));
    }

    #[tokio::test]
    async fn multi_labels_follow_supplied_positions() {
        let gw = Arc::new(Recorder::default());
        let svc = service(Arc::clone(&gw));
        let a = svc.upload(Some("application/pdf"), vec![]).await.unwrap();
        let b = svc.upload(Some("application/pdf"), vec![]).await.unwrap();

        let ids = vec![a.session_id, "missing".to_string(), b.session_id];
        svc.chat_multi(&ids, "compare them").await.unwrap();

        let prompts = gw.prompts.lock().unwrap();
        let prompt = prompts.last().unwrap();
        assert!(prompt.contains("[Document 1][Page 1]\nfirst"));
        assert!(prompt.contains("[Document 3][Page 2]\nsecond"));
        assert!(!prompt.contains("[Document 2][Page 1]"));
    }

    #[tokio::test]
    async fn multi_with_no_live_ids_is_not_found() {
        let svc = service(Arc::new(Recorder::default()));
        let err = svc
            .summary_multi(&["x".to_string(), "y".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DocQaError::NoValidDocuments));
        let err = svc.chat_multi(&[], "q").await.unwrap_err();
        assert!(matches!(err, DocQaError::NoValidDocuments));
    }

    /// The text between `start` and `end` in a recorded prompt.
    fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
        let from = prompt.find(start).expect("start marker") + start.len();
        let to = prompt.rfind(end).expect("end marker");
        &prompt[from..to]
    }

    #[tokio::test]
    async fn each_operation_uses_its_own_budget() {
        let config = ServerConfig::builder()
            .budgets(ContextBudgets {
                summary: 10,
                chat: 20,
                multi: 40,
            })
            .build()
            .unwrap();
        let gw = Arc::new(Recorder::default());
        let svc = DocumentService::new(
            &config,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(FixedPages(vec!["x".repeat(100), "y".repeat(100)])),
            Arc::clone(&gw) as Arc<dyn LlmGateway>,
        );

        let id = svc
            .upload(Some("application/pdf"), vec![])
            .await
            .unwrap()
            .session_id;
        svc.chat(&id, "q").await.unwrap();
        svc.chat_multi(&[id.clone()], "q").await.unwrap();
        svc.summary_multi(&[id]).await.unwrap();

        let prompts = gw.prompts.lock().unwrap();
        let char_len = |s: &str| s.chars().count();
        assert_eq!(char_len(section(&prompts[0], "Document:\n", "\n\nSummary:")), 10);
        assert_eq!(char_len(section(&prompts[1], "Document:\n", "\n\nUser Question:")), 20);
        assert_eq!(char_len(section(&prompts[2], "Documents:\n", "\n\nUser Question:")), 40);
        assert_eq!(char_len(section(&prompts[3], "Documents:\n", "\n\nSummary:")), 40);
    }

    #[tokio::test]
    async fn delete_then_lookup_fails() {
        let svc = service(Arc::new(Recorder::default()));
        let id = svc
            .upload(Some("application/pdf"), vec![])
            .await
            .unwrap()
            .session_id;
        svc.delete(&id).await.unwrap();
        assert!(matches!(
            svc.delete(&id).await,
            Err(DocQaError::SessionNotFound { .. })
        ));
    }
}
