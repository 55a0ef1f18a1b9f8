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
use crate::summary::MeetingUpload;

#[derive(Debug, Deserialize)]
pub struct ListMeetingsParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub tag: Option<String>,
    pub participant: Option<String>,
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct UpdateMeetingRequest {
    pub transcript: String,
    pub ai_provider: Option<String>,
}

pub async fn upload_meeting(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut transcript = None;
    let mut title = None;
    let mut participants_json = None;
    let mut duration_minutes = 60;
    let mut ai_provider = None;

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
            "transcript" => transcript = Some(text),
            "title" => title = Some(text),
            "participants" => participants_json = Some(text),
            "duration_minutes" => {
                duration_minutes = text.trim().parse::<i64>().map_err(|_| {
                    ApiError::BadRequest(format!("Invalid duration_minutes: '{}'", text))
                })?;
            }
            "ai_provider" => ai_provider = Some(text),
            _ => {}
        }
    }

    let transcript = transcript
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("transcript is required".to_string()))?;
    let participants: Vec<String> = participants_json
        .as_deref()
        .and_then(|p| serde_json::from_str(p).ok())
        .unwrap_or_default();

    let record = state
        .summaries
        .generate_and_store(MeetingUpload {
            title: title.unwrap_or_else(|| "Untitled Meeting".to_string()),
            transcript,
            participants,
            duration_minutes,
            ai_provider,
        })
        .await?;

    tracing::info!(meeting_id = %record.id, "Meeting summary stored");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Meeting summary generated successfully",
            "meeting_id": record.id,
            "data": record,
        })),
    ))
}

pub async fn list_meetings(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListMeetingsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let meetings = state
        .store
        .list_meetings(
            params.limit,
            params.tag.as_deref(),
            params.participant.as_deref(),
        )
        .await?;
    Ok(Json(meetings))
}

pub async fn get_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&meeting_id)?;
    let meeting = state
        .store
        .get_meeting(&meeting_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Meeting not found".to_string()))?;
    Ok(Json(meeting))
}

pub async fn update_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
    Json(payload): Json<UpdateMeetingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&meeting_id)?;
    if payload.transcript.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Transcript is required for update".to_string(),
        ));
    }

    let updated = state
        .summaries
        .regenerate(
            &meeting_id,
            &payload.transcript,
            payload.ai_provider.as_deref(),
        )
        .await?;
    if !updated {
        return Err(ApiError::NotFound("Meeting not found".to_string()));
    }
    Ok(Json(json!({ "message": "Meeting updated successfully" })))
}

pub async fn delete_meeting(
    State(state): State<Arc<AppState>>,
    Path(meeting_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_identifier(&meeting_id)?;
    let deleted = state.store.delete_meeting(&meeting_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Meeting not found".to_string()));
    }
    Ok(Json(json!({ "message": "Meeting deleted successfully" })))
}
