//! Conversation import and management endpoints

use axum::{
    extract::{multipart::Field, Multipart, Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ingestion::parse_conversation;
use crate::server::state::AppState;
use crate::storage::ConversationPage;
use crate::types::{ConversationRecord, ImportedConversation, MessageRecord, ParsedConversation};

/// Query parameters for listing conversations
#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Per-file import outcome
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ImportResult {
    Imported {
        filename: String,
        #[serde(flatten)]
        imported: ImportedConversation,
    },
    Failed {
        filename: String,
        error: String,
    },
}

/// Response for a multi-file import
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub results: Vec<ImportResult>,
    pub imported: usize,
    pub failed: usize,
}

/// A conversation with its messages
#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    pub conversation: ConversationRecord,
    pub messages: Vec<MessageRecord>,
}

/// Response for a delete
#[derive(Debug, Serialize)]
pub struct DeleteConversationResponse {
    pub deleted: bool,
    pub id: Uuid,
}

/// Read an uploaded file field as text
async fn read_upload(field: Field<'_>) -> Result<(String, String)> {
    let filename = field
        .file_name()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "upload".to_string());

    let data = field
        .bytes()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read file '{}': {}", filename, e)))?;

    let content = String::from_utf8(data.to_vec())
        .map_err(|_| Error::InvalidRequest(format!("File '{}' is not valid UTF-8 text", filename)))?;

    Ok((filename, content))
}

/// POST /api/conversations/parse - Detect and extract without storing
pub async fn preview_conversation(mut multipart: Multipart) -> Result<Json<ParsedConversation>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }

        let (filename, content) = read_upload(field).await?;
        tracing::info!("Previewing {} ({} bytes)", filename, content.len());
        return Ok(Json(parse_conversation(&content, &filename)?));
    }

    Err(Error::InvalidRequest("No file uploaded".to_string()))
}

/// POST /api/conversations/import - Parse and store each uploaded file
pub async fn import_conversations(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportResponse>> {
    let mut results = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let outcome = match read_upload(field).await {
            Ok((_, content)) => import_one(&state, &content, &filename),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(imported) => {
                tracing::info!(
                    "[{}] Imported {} messages as {}",
                    filename,
                    imported.message_count,
                    imported.conversation_id
                );
                results.push(ImportResult::Imported { filename, imported });
            }
            Err(e) => {
                tracing::warn!("[{}] Import failed: {}", filename, e);
                let error = match e {
                    Error::Parse(parse) => parse.to_string(),
                    Error::InvalidRequest(msg) => msg,
                    _ => "Failed to save conversation".to_string(),
                };
                results.push(ImportResult::Failed { filename, error });
            }
        }
    }

    if results.is_empty() {
        return Err(Error::InvalidRequest("No file uploaded".to_string()));
    }

    let imported = results
        .iter()
        .filter(|r| matches!(r, ImportResult::Imported { .. }))
        .count();
    let failed = results.len() - imported;

    Ok(Json(ImportResponse {
        results,
        imported,
        failed,
    }))
}

fn import_one(state: &AppState, content: &str, filename: &str) -> Result<ImportedConversation> {
    let parsed = parse_conversation(content, filename)?;
    state.db().insert_conversation(&parsed, filename)
}

/// GET /api/conversations - List conversations, newest first
pub async fn list_conversations(
    State(state): State<AppState>,
    Query(params): Query<ListConversationsQuery>,
) -> Result<Json<ConversationPage>> {
    Ok(Json(state.db().list_conversations(params.limit, params.offset)?))
}

/// GET /api/conversations/:id - Conversation with its messages
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ConversationDetail>> {
    let conversation = state
        .db()
        .get_conversation(id)?
        .ok_or_else(|| Error::NotFound(format!("Conversation {}", id)))?;
    let messages = state.db().conversation_messages(id)?;

    Ok(Json(ConversationDetail {
        conversation,
        messages,
    }))
}

/// DELETE /api/conversations/:id - Delete a conversation and its messages
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteConversationResponse>> {
    if !state.db().delete_conversation(id)? {
        return Err(Error::NotFound(format!("Conversation {}", id)));
    }

    tracing::info!("Deleted conversation {}", id);
    Ok(Json(DeleteConversationResponse { deleted: true, id }))
}
