//! Chat orchestration: retrieve context, compose the prompt, call the
//! provider, record the exchange.

mod recorder;

pub use recorder::ConversationRecorder;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::core::settings::Settings;
use crate::core::validation::{validate_email, validate_identifier, validate_question};
use crate::providers::{GenerationRequest, ProviderRegistry};
use crate::retrieval::{ContextRetriever, ContextSource, PromptComposer, SourceKind};
use crate::store::DataStore;

const SOURCE_PREVIEW_CHARS: usize = 200;
const MAX_SOURCES_REPORTED: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatQuery {
    pub question: String,
    pub ai_provider: Option<String>,
    pub conversation_id: Option<String>,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub max_documents: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcePreview {
    pub id: String,
    pub title: String,
    pub kind: SourceKind,
    pub content_preview: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    pub answer: String,
    pub sources: Vec<SourcePreview>,
    pub ai_provider: String,
    pub confidence: f64,
    pub conversation_id: String,
}

#[derive(Clone)]
pub struct ChatService {
    registry: Arc<ProviderRegistry>,
    retriever: ContextRetriever,
    composer: PromptComposer,
    recorder: ConversationRecorder,
    max_tokens: u32,
}

impl ChatService {
    pub fn new(store: DataStore, registry: Arc<ProviderRegistry>, settings: &Settings) -> Self {
        Self {
            registry,
            retriever: ContextRetriever::new(store.clone(), settings.max_context_documents),
            composer: PromptComposer::new(settings.chunk_size, settings.chunk_overlap),
            recorder: ConversationRecorder::new(store),
            max_tokens: settings.max_tokens,
        }
    }

    /// One stateless pass: validate, retrieve, compose, generate, record.
    /// Recording is best-effort; the generated answer is returned even when
    /// persistence fails.
    pub async fn ask(&self, query: ChatQuery) -> Result<ChatAnswer, ApiError> {
        validate_question(&query.question)?;
        if let Some(email) = &query.user_email {
            validate_email(email)?;
        }
        if let Some(id) = &query.conversation_id {
            validate_identifier(id)?;
        }

        let provider = self.registry.resolve(query.ai_provider.as_deref())?;

        let sources = self
            .retriever
            .retrieve(&query.question, query.max_documents)
            .await?;

        let prompt = self.composer.compose(&query.question, &sources);
        tracing::debug!(
            provider = provider.name(),
            sources = sources.len(),
            "Generating answer"
        );

        let answer = provider
            .generate(&GenerationRequest::new(prompt, self.max_tokens))
            .await?;

        let confidence = if sources.is_empty() {
            0.3
        } else {
            estimate_confidence(&answer, &query.question)
        };

        let context_ids: Vec<String> = sources.iter().map(|s| s.id.clone()).collect();
        let conversation_id = self
            .recorder
            .record(&query, &answer, &context_ids)
            .await;

        Ok(ChatAnswer {
            answer,
            sources: previews(&sources),
            ai_provider: provider.name().to_string(),
            confidence,
            conversation_id,
        })
    }
}

fn previews(sources: &[ContextSource]) -> Vec<SourcePreview> {
    sources
        .iter()
        .take(MAX_SOURCES_REPORTED)
        .map(|s| SourcePreview {
            id: s.id.clone(),
            title: s.title.clone(),
            kind: s.kind,
            content_preview: truncate_chars(&s.content, SOURCE_PREVIEW_CHARS),
        })
        .collect()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max).collect();
    format!("{}...", truncated)
}

const UNCERTAINTY_PHRASES: [&str; 6] = [
    "i don't know",
    "i'm not sure",
    "no information",
    "not mentioned",
    "not specified",
    "not available",
];

/// Rough confidence heuristic: hedging answers score low, otherwise a base
/// score plus a bonus for question/answer term overlap, capped at 0.95.
fn estimate_confidence(answer: &str, question: &str) -> f64 {
    let answer_lower = answer.to_lowercase();

    if UNCERTAINTY_PHRASES
        .iter()
        .any(|phrase| answer_lower.contains(phrase))
    {
        return 0.2;
    }

    let question_lower = question.to_lowercase();
    let question_terms: Vec<&str> = question_lower.split_whitespace().collect();
    if question_terms.is_empty() {
        return 0.7;
    }

    let overlap = question_terms
        .iter()
        .filter(|term| answer_lower.split_whitespace().any(|w| w == **term))
        .count();
    let similarity = overlap as f64 / question_terms.len() as f64;

    let confidence: f64 = 0.7 + similarity * 0.3;
    (confidence.min(0.95) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hedging_answers_score_low() {
        assert_eq!(
            estimate_confidence("I don't know about that.", "What is X?"),
            0.2
        );
        assert_eq!(
            estimate_confidence("That is not mentioned in the notes.", "What is X?"),
            0.2
        );
    }

    #[test]
    fn term_overlap_raises_confidence() {
        let low = estimate_confidence("Bananas.", "what was the deploy decision");
        let high = estimate_confidence(
            "the deploy decision was to ship friday",
            "what was the deploy decision",
        );
        assert!(high > low);
        assert!(high <= 0.95);
    }

    #[test]
    fn preview_truncates_long_content() {
        let preview = truncate_chars(&"a".repeat(300), SOURCE_PREVIEW_CHARS);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), SOURCE_PREVIEW_CHARS + 3);

        assert_eq!(truncate_chars("short", SOURCE_PREVIEW_CHARS), "short");
    }
}
