//! Prompt templates for summarization and document Q&A.
//!
//! All prompts live here so a wording change touches one file, and so unit
//! tests can check the instructions without calling a model. Each template
//! embeds the assembled document context (see [`crate::pipeline::context`])
//! and, for Q&A, the user's question. The model's reply is treated as opaque
//! text; nothing here is parsed back out.

/// Exact sentence the single-document prompt asks for when the answer is
/// absent. The handler returns it like any other answer.
pub const NOT_FOUND_ANSWER: &str = "I couldn't find the answer in the provided document.";

/// Returned in place of a summary when the model call fails.
pub const SUMMARY_PLACEHOLDER: &str = "Summary not available.";

/// Summarize one document in 3–5 sentences.
pub fn summary_prompt(document: &str) -> String {
    format!(
        "You are an expert assistant. Summarize the following document in 3-5 concise sentences, \
highlighting the main topics, purpose, and any key sections. Do not repeat the document verbatim. \
Be clear and helpful.

Document:
{document}

Summary:
"
    )
}

/// Summarize several documents together in 3–5 sentences.
pub fn multi_summary_prompt(documents: &str) -> String {
    format!(
        "You are an expert assistant. Summarize the following documents in 3-5 concise sentences, \
highlighting the main topics, purpose, and any key sections. Do not repeat the documents verbatim. \
Be clear and helpful.

Documents:
{documents}

Summary:
"
    )
}

/// Answer a question about a single document split into `[Page N]` segments.
pub fn chat_prompt(document: &str, question: &str) -> String {
    format!(
        "You are a helpful AI assistant for document Q&A.
You are given a document split into pages. Answer the user's question using ONLY the information from the document below.
- If the question is broad (e.g., 'What is in the attached document?'), provide a concise, high-level summary in 2-4 sentences, not a full extraction.
- If the question is specific, answer directly and concisely, citing page numbers (e.g., [Page 2]) if possible.
- Do NOT just repeat or dump the document text.
- If the answer is not present, say: \"{NOT_FOUND_ANSWER}\"

Document:
{document}

User Question: {question}

Answer (in a conversational, helpful style):
"
    )
}

/// Answer a question across several documents with `[Document N][Page M]` citations.
pub fn multi_chat_prompt(documents: &str, question: &str) -> String {
    format!(
        "You are a helpful AI assistant for document Q&A.
You are given multiple documents, each split into pages. Answer the user's question using ONLY the information from the provided documents below.
- If the question is broad, provide a concise, high-level overview in 2-4 sentences, not a full extraction.
- If the question is specific, answer directly and concisely.
- Cite document and page numbers (e.g., [Document 2][Page 3]) if possible.
- Do NOT just repeat or dump the document text.
- If the answer is not present in any document, say so plainly. Do NOT make up an answer.

Documents:
{documents}

User Question: {question}

Answer (with citations if possible):
"
    )
}
