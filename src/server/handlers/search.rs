use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::validation::validate_question;
use crate::retrieval::SourceKind;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

/// Keyword search across documents and meetings, ranked like the ask
/// flow's context retrieval.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, ApiError> {
    validate_question(&params.q)?;

    let sources = state
        .retriever
        .retrieve(&params.q, Some(params.limit.max(1)))
        .await?;

    let (documents, meetings): (Vec<_>, Vec<_>) = sources
        .into_iter()
        .partition(|s| s.kind == SourceKind::Document);

    Ok(Json(json!({
        "query": params.q,
        "documents": documents,
        "meetings": meetings,
    })))
}
