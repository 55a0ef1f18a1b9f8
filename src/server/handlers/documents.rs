use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::core::validation::validate_identifier;
use crate::state::AppState;
use crate::store::{DocumentUpdate, NewDocument};

#[derive(Debug, Deserialize)]
pub struct ListDocumentsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub category: Option<String>,
    pub tag: Option<String>,
}

fn default_limit() -> i64 {
    20
}

pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut title = None;
    let mut content = None;
    let mut category = None;
    let mut tags_json = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart form: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let text = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid form field '{}': {}", name, e)))?;

        match name.as_str() {
            "title" => title = Some(text),
            "content" => content = Some(text),
            "category" => category = Some(text),
            "tags" => tags_json = Some(text),
            _ => {}
        }
    }

    let title = title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("title is required".to_string()))?;
    let content = content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("content is required".to_string()))?;

    // Tags arrive as a JSON array string; anything unparseable means none.
    let tags: Vec<String> = tags_json
        .as_deref()
        .and_then(|t| serde_json::from_str(t).ok())
        .unwrap_or_default();

    let record = state
        .store
        .insert_document(NewDocument {
            title,
            content,
            category,
            tags,
        })
        .await?;

    tracing::info!(doc_id = %record.id, "Document uploaded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document uploaded successfully",
            "doc_id": record.id,
            "data": record,
        })),
    ))
}

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListDocumentsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let documents = state
        .store
        .list_documents(
            params.limit,
            params.offset,
            params.category.as_deref(),
            params.tag.as_deref(),
        )
        .await?;
    Ok(Json(documents))
}

pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&doc_id)?;
    let document = state
        .store
        .get_document(&doc_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
    Ok(Json(document))
}

pub async fn update_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
    Json(update): Json<DocumentUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&doc_id)?;
    if update.is_empty() {
        return Err(ApiError::BadRequest("No update data provided".to_string()));
    }

    let updated = state.store.update_document(&doc_id, update).await?;
    if !updated {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }
    Ok(Json(json!({ "message": "Document updated successfully" })))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&doc_id)?;
    let deleted = state.store.delete_document(&doc_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Document not found".to_string()));
    }
    Ok(Json(json!({ "message": "Document deleted successfully" })))
}
