//! API routes for the convo-map server

pub mod conversations;
pub mod topics;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Import - with larger body limit for file uploads
        .route(
            "/conversations/parse",
            post(conversations::preview_conversation).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/conversations/import",
            post(conversations::import_conversations).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Conversation management
        .route("/conversations", get(conversations::list_conversations))
        .route(
            "/conversations/:id",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        // Topics
        .route("/conversations/:id/topics", get(topics::list_topics))
        .route("/conversations/:id/generate-topics", post(topics::generate_topics))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let config = state.config();
    let provider = state.label_provider();

    axum::Json(serde_json::json!({
        "name": "convo-map",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Chat-history import with LLM topic labeling",
        "endpoints": {
            "POST /api/conversations/parse": "Detect and extract an export without storing it",
            "POST /api/conversations/import": "Upload and store one or more exports",
            "GET /api/conversations": "List conversations (limit, offset)",
            "GET /api/conversations/:id": "Get a conversation with its messages",
            "DELETE /api/conversations/:id": "Delete a conversation",
            "GET /api/conversations/:id/topics": "Topic labels with counts",
            "POST /api/conversations/:id/generate-topics": "Label unlabeled messages (SSE progress)"
        },
        "accepted_extensions": crate::ingestion::ACCEPTED_EXTENSIONS,
        "max_upload_size": config.server.max_upload_size,
        "labeling": {
            "provider": provider.name(),
            "model": provider.model(),
            "batch_size": config.labeling.batch_size,
            "max_units_per_run": config.labeling.max_units_per_run,
        },
    }))
}
