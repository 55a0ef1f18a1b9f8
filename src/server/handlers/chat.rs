use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::chat::ChatQuery;
use crate::core::errors::ApiError;
use crate::state::AppState;

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(query): Json<ChatQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let answer = state.chat.ask(query).await?;
    Ok(Json(answer))
}

pub async fn providers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "available_providers": state.providers.available(),
        "default": state.providers.default_provider(),
    }))
}
