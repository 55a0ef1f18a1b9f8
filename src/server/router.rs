use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{chat, documents, health, meetings, search};
use crate::state::AppState;

/// Main application router: document and meeting CRUD, the ask flow,
/// search and health, behind CORS and request tracing.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/documents/upload",
            axum::routing::post(documents::upload_document),
        )
        .route("/documents", get(documents::list_documents))
        .route(
            "/documents/:doc_id",
            get(documents::get_document)
                .put(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/chat/ask", axum::routing::post(chat::ask))
        .route("/chat/providers", get(chat::providers))
        .route(
            "/meetings/upload",
            axum::routing::post(meetings::upload_meeting),
        )
        .route("/meetings", get(meetings::list_meetings))
        .route(
            "/meetings/:meeting_id",
            get(meetings::get_meeting)
                .put(meetings::update_meeting)
                .delete(meetings::delete_meeting),
        )
        .route("/search", get(search::search))
        .with_state(state)
        .layer(build_cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}
