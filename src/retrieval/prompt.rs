//! Deterministic prompt composition.
//!
//! Retrieved source text is split into fixed-size overlapping character
//! windows before inclusion; the composed prompt is preamble + context
//! sections + question, or preamble + question when nothing was retrieved.

use super::retriever::ContextSource;

pub const CONTEXT_PREAMBLE: &str = "You are an assistant that answers questions based on the \
provided context from stored documents and meeting summaries.\n\
Answer based solely on the context. If the context does not contain the \
information needed, say so clearly.";

pub const GENERAL_PREAMBLE: &str = "You are a helpful assistant. No stored documents matched \
this question, so answer from general knowledge and mention that no \
connected data was available.";

/// Upper bound on windows taken per source so one long document cannot
/// crowd out the rest of the context.
const MAX_CHUNKS_PER_SOURCE: usize = 4;

#[derive(Clone)]
pub struct PromptComposer {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl PromptComposer {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn compose(&self, question: &str, sources: &[ContextSource]) -> String {
        if sources.is_empty() {
            return format!("{}\n\nQUESTION: {}\n\nAnswer:", GENERAL_PREAMBLE, question);
        }

        let mut prompt = String::from(CONTEXT_PREAMBLE);
        prompt.push_str("\n\nCONTEXT:\n");

        for (i, source) in sources.iter().enumerate() {
            prompt.push_str(&format!("Source {}: {} [{}]\n", i + 1, source.title, source.id));
            for chunk in self.chunk_text(&source.content) {
                prompt.push_str(&chunk);
                prompt.push('\n');
            }
            prompt.push_str("---\n");
        }

        prompt.push_str(&format!("\nQUESTION: {}\n\nAnswer:", question));
        prompt
    }

    /// Fixed-size character windows with the configured overlap. The step
    /// is chunk_size - chunk_overlap (settings guarantee it is positive).
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total == 0 {
            return Vec::new();
        }

        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total && chunks.len() < MAX_CHUNKS_PER_SOURCE {
            let end = (start + self.chunk_size).min(total);
            let window: String = chars[start..end].iter().collect();

            let trimmed = if end < total {
                trim_to_sentence_boundary(&window).to_string()
            } else {
                window
            };
            chunks.push(trimmed.trim().to_string());

            start += step;
        }

        chunks
    }
}

/// Cut a window back to the last sentence ending in its final fifth, when
/// one exists. Only ever shortens the window.
fn trim_to_sentence_boundary(text: &str) -> &str {
    let char_count = text.chars().count();
    let skip = (char_count * 4) / 5;
    let search_start = text
        .char_indices()
        .nth(skip)
        .map(|(i, _)| i)
        .unwrap_or(0);

    for ending in [". ", "! ", "? ", ".\n", "!\n", "?\n"] {
        if let Some(pos) = text[search_start..].rfind(ending) {
            return &text[..search_start + pos + ending.len()];
        }
    }
    text
}
