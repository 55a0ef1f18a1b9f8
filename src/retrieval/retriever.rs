//! Keyword-based context retrieval.
//!
//! Relevance policy: a source scores one point per distinct question token
//! appearing in its searchable text; ties break on recency. No embeddings,
//! no ranking model.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::core::errors::ApiError;
use crate::store::{DataStore, DocumentRecord, MeetingRecord};

/// How many tokens are used for the store lookup; scoring still uses all
/// of them.
const MAX_QUERY_TOKENS: usize = 5;
const CANDIDATES_PER_TOKEN: i64 = 10;

/// Recent meetings are always candidates, scored like everything else.
const RECENT_MEETING_DAYS: i64 = 30;
const RECENT_MEETING_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Document,
    Meeting,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextSource {
    pub id: String,
    pub title: String,
    pub content: String,
    pub kind: SourceKind,
    pub score: usize,
    pub created_at: String,
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w{3,}").unwrap())
}

/// Lowercased tokens of at least three characters, deduplicated in order.
pub fn tokenize(question: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in token_regex().find_iter(&question.to_lowercase()) {
        let token = m.as_str().to_string();
        if !seen.contains(&token) {
            seen.push(token);
        }
    }
    seen
}

fn count_matches(haystack: &str, tokens: &[String]) -> usize {
    let lowered = haystack.to_lowercase();
    tokens.iter().filter(|t| lowered.contains(t.as_str())).count()
}

fn document_source(doc: &DocumentRecord, tokens: &[String]) -> ContextSource {
    let searchable = format!(
        "{} {} {} {}",
        doc.title,
        doc.content,
        doc.tags.join(" "),
        doc.category
    );
    ContextSource {
        id: doc.id.clone(),
        title: doc.title.clone(),
        content: doc.content.clone(),
        kind: SourceKind::Document,
        score: count_matches(&searchable, tokens),
        created_at: doc.created_at.clone(),
    }
}

fn meeting_source(meeting: &MeetingRecord, tokens: &[String]) -> ContextSource {
    let searchable = format!(
        "{} {} {}",
        meeting.title,
        meeting.summary,
        meeting.tags.join(" ")
    );
    ContextSource {
        id: meeting.id.clone(),
        title: meeting.title.clone(),
        content: meeting.summary.clone(),
        kind: SourceKind::Meeting,
        score: count_matches(&searchable, tokens),
        created_at: meeting.created_at.clone(),
    }
}

#[derive(Clone)]
pub struct ContextRetriever {
    store: DataStore,
    max_documents: usize,
}

impl ContextRetriever {
    pub fn new(store: DataStore, max_documents: usize) -> Self {
        Self {
            store,
            max_documents,
        }
    }

    /// Top matching documents and meeting summaries for a question. Zero
    /// matches is a valid, empty result.
    pub async fn retrieve(
        &self,
        question: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ContextSource>, ApiError> {
        let tokens = tokenize(question);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut candidates: HashMap<String, ContextSource> = HashMap::new();

        for token in tokens.iter().take(MAX_QUERY_TOKENS) {
            for doc in self
                .store
                .search_documents(token, CANDIDATES_PER_TOKEN)
                .await?
            {
                candidates
                    .entry(doc.id.clone())
                    .or_insert_with(|| document_source(&doc, &tokens));
            }
            for meeting in self
                .store
                .search_meetings(token, CANDIDATES_PER_TOKEN)
                .await?
            {
                candidates
                    .entry(meeting.id.clone())
                    .or_insert_with(|| meeting_source(&meeting, &tokens));
            }
        }

        for meeting in self
            .store
            .recent_meetings(RECENT_MEETING_DAYS, RECENT_MEETING_LIMIT)
            .await?
        {
            candidates
                .entry(meeting.id.clone())
                .or_insert_with(|| meeting_source(&meeting, &tokens));
        }

        let mut sources: Vec<ContextSource> = candidates
            .into_values()
            .filter(|s| s.score > 0)
            .collect();

        sources.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        sources.truncate(limit.unwrap_or(self.max_documents).max(1));

        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::temp_store;
    use crate::store::NewDocument;

    async fn seed(store: &DataStore, title: &str, content: &str, tags: &[&str]) -> String {
        store
            .insert_document(NewDocument {
                title: title.to_string(),
                content: content.to_string(),
                category: None,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn tokenize_filters_short_words_and_dedups() {
        let tokens = tokenize("What is the deploy process for the deploy server?");
        assert_eq!(
            tokens,
            vec!["what", "the", "deploy", "process", "for", "server"]
        );
    }

    #[tokio::test]
    async fn no_matches_returns_empty_not_error() {
        let store = temp_store().await;
        let retriever = ContextRetriever::new(store, 10);

        let sources = retriever.retrieve("quantum entanglement", None).await.unwrap();
        assert!(sources.is_empty());

        let blank = retriever.retrieve("a an", None).await.unwrap();
        assert!(blank.is_empty());
    }

    #[tokio::test]
    async fn ranks_by_distinct_token_overlap() {
        let store = temp_store().await;
        let best = seed(
            &store,
            "Deploy guide",
            "How to deploy the server to production",
            &["deploy"],
        )
        .await;
        let weaker = seed(&store, "Server notes", "Notes about the server", &[]).await;
        seed(&store, "Cooking", "A recipe for soup", &[]).await;

        let retriever = ContextRetriever::new(store, 10);
        let sources = retriever
            .retrieve("How do I deploy the server?", None)
            .await
            .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].id, best);
        assert_eq!(sources[1].id, weaker);
        assert!(sources[0].score > sources[1].score);
    }

    #[tokio::test]
    async fn respects_max_documents_limit() {
        let store = temp_store().await;
        for i in 0..5 {
            seed(&store, &format!("Doc {}", i), "shared keyword payload", &[]).await;
        }

        let retriever = ContextRetriever::new(store, 2);
        let sources = retriever.retrieve("keyword payload", None).await.unwrap();
        assert_eq!(sources.len(), 2);

        let retriever_override = retriever.retrieve("keyword payload", Some(3)).await.unwrap();
        assert_eq!(retriever_override.len(), 3);
    }
}
