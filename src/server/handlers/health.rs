use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = if state.store.ping().await {
        "connected"
    } else {
        "unreachable"
    };

    Json(json!({
        "status": "healthy",
        "database": database,
        "ai_providers": state.providers.available(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}
