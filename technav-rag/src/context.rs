//! Context assembly and prompt templates.
//!
//! The model only ever sees bounded excerpts. Callers keep the full
//! [`SearchResult`]s, so the excerpt path ([`AssembledContext`]) and the
//! source path never derive from each other.

use crate::document::{ConversationTurn, SearchResult};

/// Answer returned when retrieval finds nothing above the threshold.
pub const NO_RELEVANT_DOCUMENTS_ANSWER: &str = "I couldn't find any relevant documents to answer \
your question. Try uploading documents related to this topic or rephrasing your question.";

/// Placed between document excerpts in the rendered context.
pub const DOCUMENT_SEPARATOR: &str = "\n\n---\n\n";

/// Appended to an excerpt that was cut at the character limit.
pub const TRUNCATION_MARKER: &str = "...";

const UNTITLED: &str = "Untitled document";

/// One document as the model sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextExcerpt {
    /// Title or file name of the source document.
    pub label: String,
    /// Content cut to the character limit, with [`TRUNCATION_MARKER`] when cut.
    pub excerpt: String,
    /// Whether the content was cut.
    pub truncated: bool,
    /// Similarity of the source document to the question.
    pub similarity: f32,
}

/// Labeled excerpts ready to be rendered into a prompt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembledContext {
    excerpts: Vec<ContextExcerpt>,
}

impl AssembledContext {
    /// The excerpts in retrieval order.
    pub fn excerpts(&self) -> &[ContextExcerpt] {
        &self.excerpts
    }

    /// Returns `true` if no document contributed.
    pub fn is_empty(&self) -> bool {
        self.excerpts.is_empty()
    }

    /// Render as numbered, labeled blocks joined by [`DOCUMENT_SEPARATOR`].
    pub fn render(&self) -> String {
        self.excerpts
            .iter()
            .enumerate()
            .map(|(i, excerpt)| {
                format!(
                    "[Document {}: {}] (Relevance: {:.1}%)\n{}",
                    i + 1,
                    excerpt.label,
                    excerpt.similarity * 100.0,
                    excerpt.excerpt
                )
            })
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }
}

/// Builds bounded context blocks and conversation history for prompts.
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    char_limit: usize,
    history_window: usize,
}

impl ContextAssembler {
    /// Create an assembler with a per-document character cap and a history window.
    pub fn new(char_limit: usize, history_window: usize) -> Self {
        Self { char_limit, history_window }
    }

    /// Turn search results into labeled, truncated excerpts.
    pub fn assemble(&self, results: &[SearchResult]) -> AssembledContext {
        let excerpts = results
            .iter()
            .map(|result| {
                let (excerpt, truncated) = truncate_chars(&result.content, self.char_limit);
                ContextExcerpt {
                    label: result.metadata.display_name().unwrap_or(UNTITLED).to_string(),
                    excerpt,
                    truncated,
                    similarity: result.similarity,
                }
            })
            .collect();
        AssembledContext { excerpts }
    }

    /// The most recent turns within the history window, oldest first.
    pub fn recent_history<'a>(&self, history: &'a [ConversationTurn]) -> &'a [ConversationTurn] {
        let start = history.len().saturating_sub(self.history_window);
        &history[start..]
    }

    /// Render the history window as `role: content` lines.
    pub fn render_history(&self, history: &[ConversationTurn]) -> String {
        self.recent_history(history)
            .iter()
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Cut `text` to at most `limit` characters, appending [`TRUNCATION_MARKER`] when cut.
pub fn truncate_chars(text: &str, limit: usize) -> (String, bool) {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => (format!("{}{TRUNCATION_MARKER}", &text[..byte_index]), true),
        None => (text.to_string(), false),
    }
}

/// Prompt for a one-shot question over retrieved documents.
pub fn document_question_prompt(context: &AssembledContext, question: &str) -> String {
    format!(
        "You are a helpful study assistant. Answer the question using only the documents \
below.\n\n\
Context from documents:\n{context}\n\n\
Question: {question}\n\n\
Instructions:\n\
- Answer only from the information in the context.\n\
- If the context does not contain enough information, say so explicitly.\n\
- Mention which document the information comes from when possible.\n\n\
Answer:",
        context = context.render(),
    )
}

/// Prompt for a chat turn that also carries recent conversation history.
pub fn conversation_prompt(history: &str, context: &AssembledContext, question: &str) -> String {
    let history_section = if history.is_empty() {
        String::new()
    } else {
        format!("Previous conversation:\n{history}\n\n")
    };
    format!(
        "You are a helpful study assistant chatting with a learner about their documents.\n\n\
{history_section}\
Context from documents:\n{context}\n\n\
Question: {question}\n\n\
Instructions:\n\
- Answer only from the information in the context and the conversation.\n\
- If the context does not contain enough information, say so explicitly.\n\
- Keep the answer consistent with the previous conversation.\n\n\
Answer:",
        context = context.render(),
    )
}
