//! Topic listing and topic generation endpoints

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio_stream::StreamExt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::TopicCount;

/// Optional body of a generate-topics request
#[derive(Debug, Default, Deserialize)]
pub struct GenerateTopicsRequest {
    /// Restrict the run to these messages
    #[serde(default)]
    pub message_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicCount>,
}

/// GET /api/conversations/:id/topics - Labels with their counts
pub async fn list_topics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TopicsResponse>> {
    if state.db().get_conversation(id)?.is_none() {
        return Err(Error::NotFound(format!("Conversation {}", id)));
    }

    Ok(Json(TopicsResponse {
        topics: state.db().topic_counts(id)?,
    }))
}

/// POST /api/conversations/:id/generate-topics - Stream labeling progress
///
/// An unreadable body is treated as "no filter".
pub async fn generate_topics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<GenerateTopicsRequest>>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    if state.db().get_conversation(id)?.is_none() {
        return Err(Error::NotFound(format!("Conversation {}", id)));
    }

    let message_ids = body
        .map(|Json(request)| request.message_ids)
        .filter(|ids| !ids.is_empty());

    tracing::info!(
        "[{}] Starting topic generation ({})",
        id,
        message_ids
            .as_ref()
            .map_or("all unlabeled".to_string(), |ids| format!("{} selected", ids.len()))
    );

    let stream = state
        .labeler()
        .start(id, message_ids)
        .map(|event| Event::default().json_data(&event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
