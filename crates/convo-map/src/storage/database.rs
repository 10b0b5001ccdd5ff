//! SQLite database for imported conversations and topic labels

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::LabelStore;
use crate::types::{
    ConversationRecord, ImportedConversation, LabelingUnit, MessageRecord, ParsedConversation,
    Role, RunStatus, SourceFormat, SourcePlatform, TopicCount,
};

/// SQLite-based conversation store
#[derive(Clone)]
pub struct ConversationDb {
    conn: Arc<Mutex<Connection>>,
}

/// One page of conversations plus the overall count
#[derive(Debug, Clone, serde::Serialize)]
pub struct ConversationPage {
    pub conversations: Vec<ConversationRecord>,
    pub total: usize,
}

const CONVERSATION_COLUMNS: &str = "id, title, source_platform, source_format, original_filename, \
     message_count, first_message_at, last_message_at, imported_at";

const MESSAGE_COLUMNS: &str =
    "id, conversation_id, role, content, message_index, timestamp, topic, topic_generated_at";

impl ConversationDb {
    /// Create or open the database at the given path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::database(format!("Failed to open database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to open in-memory database: {}", e)))?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.migrate()?;
        Ok(db)
    }

    /// Run database migrations
    fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
        "#,
        )
        .map_err(|e| Error::database(format!("Failed to set pragmas: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                source_platform TEXT NOT NULL,
                source_format TEXT NOT NULL,
                original_filename TEXT NOT NULL,
                message_count INTEGER NOT NULL,
                first_message_at TEXT,
                last_message_at TEXT,
                imported_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_imported_at ON conversations(imported_at);

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                message_index INTEGER NOT NULL,
                timestamp TEXT,
                topic TEXT,
                topic_generated_at TEXT,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
                UNIQUE(conversation_id, message_index)
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation ON messages(conversation_id, message_index);
            CREATE INDEX IF NOT EXISTS idx_messages_topic ON messages(conversation_id, topic);

            CREATE TABLE IF NOT EXISTS labeling_runs (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                status TEXT NOT NULL,
                processed INTEGER NOT NULL DEFAULT 0,
                total INTEGER NOT NULL,
                error TEXT,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_labeling_runs_conversation ON labeling_runs(conversation_id);
        "#,
        )
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

        tracing::debug!("Database migrations complete");
        Ok(())
    }

    // ========================================================================
    // Conversations
    // ========================================================================

    /// Store a parsed conversation and all its messages atomically
    pub fn insert_conversation(
        &self,
        parsed: &ParsedConversation,
        original_filename: &str,
    ) -> Result<ImportedConversation> {
        let mut conn = self.conn.lock();
        let conversation_id = Uuid::new_v4();

        let tx = conn
            .transaction()
            .map_err(|e| Error::database(format!("Failed to begin transaction: {}", e)))?;

        tx.execute(
            r#"
            INSERT INTO conversations (
                id, title, source_platform, source_format, original_filename,
                message_count, first_message_at, last_message_at, imported_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                conversation_id.to_string(),
                parsed.title,
                parsed.source_platform.as_str(),
                parsed.source_format.as_str(),
                original_filename,
                parsed.message_count() as i64,
                parsed.first_message_at.map(|t| t.to_rfc3339()),
                parsed.last_message_at.map(|t| t.to_rfc3339()),
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(format!("Failed to insert conversation: {}", e)))?;

        {
            let mut stmt = tx
                .prepare(
                    r#"
                    INSERT INTO messages (id, conversation_id, role, content, message_index, timestamp)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                )
                .map_err(|e| Error::database(format!("Failed to prepare statement: {}", e)))?;

            for (index, message) in parsed.messages.iter().enumerate() {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    conversation_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    index as i64,
                    message.timestamp.map(|t| t.to_rfc3339()),
                ])
                .map_err(|e| Error::database(format!("Failed to insert message: {}", e)))?;
            }
        }

        tx.commit()
            .map_err(|e| Error::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(ImportedConversation {
            conversation_id,
            message_count: parsed.message_count(),
        })
    }

    /// List conversations, most recently imported first
    pub fn list_conversations(&self, limit: usize, offset: usize) -> Result<ConversationPage> {
        let conn = self.conn.lock();

        let total: i64 = conn
            .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to count conversations: {}", e)))?;

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM conversations ORDER BY imported_at DESC, rowid DESC LIMIT ?1 OFFSET ?2",
                CONVERSATION_COLUMNS
            ))
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let conversations = stmt
            .query_map(params![limit as i64, offset as i64], row_to_conversation)
            .map_err(|e| Error::database(format!("Failed to list conversations: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(ConversationPage {
            conversations,
            total: total as usize,
        })
    }

    /// Get a conversation by id
    pub fn get_conversation(&self, id: Uuid) -> Result<Option<ConversationRecord>> {
        let conn = self.conn.lock();

        conn.query_row(
            &format!("SELECT {} FROM conversations WHERE id = ?1", CONVERSATION_COLUMNS),
            params![id.to_string()],
            row_to_conversation,
        )
        .optional()
        .map_err(|e| Error::database(format!("Failed to get conversation: {}", e)))
    }

    /// Messages of a conversation in their original order
    pub fn conversation_messages(&self, conversation_id: Uuid) -> Result<Vec<MessageRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM messages WHERE conversation_id = ?1 ORDER BY message_index ASC",
                MESSAGE_COLUMNS
            ))
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let messages = stmt
            .query_map(params![conversation_id.to_string()], row_to_message)
            .map_err(|e| Error::database(format!("Failed to list messages: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(messages)
    }

    /// Delete a conversation and its messages. Returns false if it did not exist.
    pub fn delete_conversation(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock();

        let deleted = conn
            .execute(
                "DELETE FROM conversations WHERE id = ?1",
                params![id.to_string()],
            )
            .map_err(|e| Error::database(format!("Failed to delete conversation: {}", e)))?;

        Ok(deleted > 0)
    }

    /// Label frequencies for a conversation, most frequent first
    pub fn topic_counts(&self, conversation_id: Uuid) -> Result<Vec<TopicCount>> {
        let conn = self.conn.lock();

        let mut stmt = conn
            .prepare(
                r#"
                SELECT topic, COUNT(*) AS n FROM messages
                WHERE conversation_id = ?1 AND topic IS NOT NULL
                GROUP BY topic
                ORDER BY n DESC, topic ASC
                "#,
            )
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let counts = stmt
            .query_map(params![conversation_id.to_string()], |row| {
                let topic: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok(TopicCount {
                    topic,
                    count: count as usize,
                })
            })
            .map_err(|e| Error::database(format!("Failed to count topics: {}", e)))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(counts)
    }

    // ========================================================================
    // Labeling
    // ========================================================================

    /// Unlabeled messages in `message_index` order, optionally restricted to `ids_filter`
    pub fn unlabeled_messages(
        &self,
        conversation_id: Uuid,
        ids_filter: Option<&[Uuid]>,
        limit: usize,
    ) -> Result<Vec<LabelingUnit>> {
        let conn = self.conn.lock();

        let ids: Vec<String> = ids_filter
            .unwrap_or_default()
            .iter()
            .map(Uuid::to_string)
            .collect();

        let id_clause = if ids.is_empty() {
            String::new()
        } else {
            let placeholders: Vec<String> = (0..ids.len()).map(|i| format!("?{}", i + 3)).collect();
            format!(" AND id IN ({})", placeholders.join(", "))
        };

        let sql = format!(
            "SELECT id, content FROM messages WHERE conversation_id = ?1 AND topic IS NULL{} \
             ORDER BY message_index ASC LIMIT ?2",
            id_clause
        );

        let mut bound: Vec<rusqlite::types::Value> = vec![
            conversation_id.to_string().into(),
            (limit as i64).into(),
        ];
        bound.extend(ids.into_iter().map(rusqlite::types::Value::from));

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| Error::database(format!("Failed to prepare query: {}", e)))?;

        let units = stmt
            .query_map(params_from_iter(bound), |row| {
                let id: String = row.get(0)?;
                let content: String = row.get(1)?;
                Ok((id, content))
            })
            .map_err(|e| Error::database(format!("Failed to fetch unlabeled messages: {}", e)))?
            .filter_map(|r| r.ok())
            .filter_map(|(id, content)| {
                Uuid::parse_str(&id)
                    .ok()
                    .map(|id| LabelingUnit { id, content })
            })
            .collect();

        Ok(units)
    }

    /// Persist a topic label for one message
    pub fn set_topic(&self, message_id: Uuid, topic: &str, labeled_at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock();

        let updated = conn
            .execute(
                "UPDATE messages SET topic = ?1, topic_generated_at = ?2 WHERE id = ?3",
                params![topic, labeled_at.to_rfc3339(), message_id.to_string()],
            )
            .map_err(|e| Error::database(format!("Failed to write topic: {}", e)))?;

        if updated == 0 {
            return Err(Error::NotFound(format!("Message {}", message_id)));
        }
        Ok(())
    }

    /// Open a labeling run record
    pub fn create_run(&self, conversation_id: Uuid, total: usize) -> Result<Uuid> {
        let conn = self.conn.lock();
        let run_id = Uuid::new_v4();

        conn.execute(
            r#"
            INSERT INTO labeling_runs (id, conversation_id, status, processed, total, started_at)
            VALUES (?1, ?2, ?3, 0, ?4, ?5)
            "#,
            params![
                run_id.to_string(),
                conversation_id.to_string(),
                RunStatus::Running.as_str(),
                total as i64,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| Error::database(format!("Failed to create run: {}", e)))?;

        Ok(run_id)
    }

    /// Update the processed count of a run
    pub fn record_run_progress(&self, run_id: Uuid, processed: usize) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "UPDATE labeling_runs SET processed = ?1 WHERE id = ?2",
            params![processed as i64, run_id.to_string()],
        )
        .map_err(|e| Error::database(format!("Failed to record run progress: {}", e)))?;

        Ok(())
    }

    /// Mark a run as finished with its terminal status
    pub fn finish_run(&self, run_id: Uuid, status: RunStatus, error: Option<&str>) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "UPDATE labeling_runs SET status = ?1, error = ?2, finished_at = ?3 WHERE id = ?4",
            params![
                status.as_str(),
                error,
                Utc::now().to_rfc3339(),
                run_id.to_string()
            ],
        )
        .map_err(|e| Error::database(format!("Failed to finish run: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl LabelStore for ConversationDb {
    async fn fetch_unlabeled_units(
        &self,
        conversation_id: Uuid,
        ids_filter: Option<&[Uuid]>,
        limit: usize,
    ) -> Result<Vec<LabelingUnit>> {
        self.unlabeled_messages(conversation_id, ids_filter, limit)
    }

    async fn write_label(&self, unit_id: Uuid, label: &str, labeled_at: DateTime<Utc>) -> Result<()> {
        self.set_topic(unit_id, label, labeled_at)
    }

    async fn create_run(&self, conversation_id: Uuid, total: usize) -> Result<Uuid> {
        ConversationDb::create_run(self, conversation_id, total)
    }

    async fn record_progress(&self, run_id: Uuid, processed: usize) -> Result<()> {
        self.record_run_progress(run_id, processed)
    }

    async fn finish_run(&self, run_id: Uuid, status: RunStatus, error: Option<&str>) -> Result<()> {
        ConversationDb::finish_run(self, run_id, status, error)
    }
}

// Helper functions

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|d| d.with_timezone(&Utc))
            .ok()
    })
}

fn platform_from_str(value: &str) -> SourcePlatform {
    match value {
        "chatgpt" => SourcePlatform::Chatgpt,
        "claude" => SourcePlatform::Claude,
        _ => SourcePlatform::Generic,
    }
}

fn format_from_str(value: &str) -> SourceFormat {
    match value {
        "html" => SourceFormat::Html,
        "markdown" => SourceFormat::Markdown,
        _ => SourceFormat::Json,
    }
}

/// Uuid text column; a corrupt value is a conversion error, never the nil id
fn uuid_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<Uuid> {
    let text: String = row.get(idx)?;
    Uuid::parse_str(&text).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn row_to_conversation(row: &rusqlite::Row) -> rusqlite::Result<ConversationRecord> {
    let id = uuid_column(row, 0)?;
    let title: String = row.get(1)?;
    let platform_str: String = row.get(2)?;
    let format_str: String = row.get(3)?;
    let original_filename: String = row.get(4)?;
    let message_count: i64 = row.get(5)?;
    let first_message_at: Option<String> = row.get(6)?;
    let last_message_at: Option<String> = row.get(7)?;
    let imported_at: Option<String> = row.get(8)?;

    Ok(ConversationRecord {
        id,
        title,
        source_platform: platform_from_str(&platform_str),
        source_format: format_from_str(&format_str),
        original_filename,
        message_count: message_count as usize,
        first_message_at: parse_timestamp(first_message_at),
        last_message_at: parse_timestamp(last_message_at),
        imported_at: parse_timestamp(imported_at).unwrap_or_else(Utc::now),
    })
}

fn row_to_message(row: &rusqlite::Row) -> rusqlite::Result<MessageRecord> {
    let id = uuid_column(row, 0)?;
    let conversation_id = uuid_column(row, 1)?;
    let role_str: String = row.get(2)?;
    let content: String = row.get(3)?;
    let message_index: i64 = row.get(4)?;
    let timestamp: Option<String> = row.get(5)?;
    let topic: Option<String> = row.get(6)?;
    let topic_generated_at: Option<String> = row.get(7)?;

    Ok(MessageRecord {
        id,
        conversation_id,
        role: Role::from_db(&role_str),
        content,
        message_index: message_index as usize,
        timestamp: parse_timestamp(timestamp),
        topic,
        topic_generated_at: parse_timestamp(topic_generated_at),
    })
}
