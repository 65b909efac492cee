//! Document context assembly with a character budget.
//!
//! Pages are emitted as `[Page j]` segments (or `[Document i][Page j]` when a
//! document carries a label), joined with newlines, and the whole string is
//! cut to the budget. The budget is a character count, not a token count: a
//! cheap, predictable bound on the request size. The cut is hard and may land
//! mid-word or mid-marker, but it always falls on a `char` boundary.

/// One document's pages, optionally tagged with its 1-based label.
#[derive(Debug, Clone, Copy)]
pub struct DocumentPages<'a> {
    pub label: Option<usize>,
    pub pages: &'a [String],
}

impl<'a> DocumentPages<'a> {
    /// A single document without a label.
    pub fn unlabeled(pages: &'a [String]) -> Self {
        Self { label: None, pages }
    }

    /// A document labeled `[Document {label}]`.
    pub fn labeled(label: usize, pages: &'a [String]) -> Self {
        Self {
            label: Some(label),
            pages,
        }
    }
}

/// Render the page marker for one segment.
pub fn segment_marker(label: Option<usize>, page_num: usize) -> String {
    match label {
        Some(doc) => format!("[Document {}][Page {}]", doc, page_num),
        None => format!("[Page {}]", page_num),
    }
}

/// Concatenate every page of every document, then cut to `budget` characters.
pub fn build_context(documents: &[DocumentPages<'_>], budget: usize) -> String {
    let segments: Vec<String> = documents
        .iter()
        .flat_map(|doc| {
            doc.pages.iter().enumerate().map(move |(i, text)| {
                format!("{}\n{}", segment_marker(doc.label, i + 1), text)
            })
        })
        .collect();

    let mut text = segments.join("\n");
    truncate_chars(&mut text, budget);
    text
}

/// Cut `text` to at most `max_chars` characters in place.
pub fn truncate_chars(text: &mut String, max_chars: usize) {
    if let Some((byte_idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(byte_idx);
    }
}
