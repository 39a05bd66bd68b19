//! SQLite-backed [`AiRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::OptionalExtension;
use serde_json::{Map, Value};
use uuid::Uuid;

use triploom_core::{Result, TriploomError};

use crate::db::Database;
use crate::repository::{AiRepository, MAX_CONVERSATIONS};
use crate::types::{Conversation, StoredMessage, Trip};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteRepository {
    db: Arc<Database>,
}

impl SqliteRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a trip row. Trips are owned by the main web app;
    /// this exists for seeding local databases and tests.
    pub fn insert_trip(&self, trip: &Trip) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO trips (id, destination, start_date, end_date, timezone)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    trip.id,
                    trip.destination,
                    trip.start_date.format(DATE_FORMAT).to_string(),
                    trip.end_date.format(DATE_FORMAT).to_string(),
                    trip.timezone,
                ],
            )
            .map_err(|e| TriploomError::Storage(format!("Failed to save trip: {}", e)))?;
            Ok(())
        })
    }

    pub fn add_trip_member(&self, trip_id: &str, user_id: &str) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO trip_members (trip_id, user_id) VALUES (?1, ?2)",
                rusqlite::params![trip_id, user_id],
            )
            .map_err(|e| TriploomError::Storage(format!("Failed to add trip member: {}", e)))?;
            Ok(())
        })
    }

    fn insert_json_row(&self, sql: &str, params: &[&dyn rusqlite::ToSql], what: &str) -> Result<()> {
        self.db.with_conn(|conn| {
            conn.execute(sql, params)
                .map_err(|e| TriploomError::Storage(format!("Failed to save {}: {}", what, e)))?;
            Ok(())
        })
    }
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| TriploomError::Storage(format!("invalid trip date '{}': {}", raw, e)))
}

fn row_to_conversation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(0)?,
        trip_id: row.get(1)?,
        user_id: row.get(2)?,
        title: row.get(3)?,
        created_at: millis_to_datetime(row.get(4)?),
        updated_at: millis_to_datetime(row.get(5)?),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let usage_raw: String = row.get(5)?;
    Ok(StoredMessage {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        role: row.get(2)?,
        content: row.get(3)?,
        model: row.get(4)?,
        token_usage_json: serde_json::from_str(&usage_raw).unwrap_or_default(),
        created_at: millis_to_datetime(row.get(6)?),
    })
}

#[async_trait]
impl AiRepository for SqliteRepository {
    async fn is_trip_member(&self, trip_id: &str, user_id: &str) -> Result<bool> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM trip_members WHERE trip_id = ?1 AND user_id = ?2)",
                rusqlite::params![trip_id, user_id],
                |row| row.get(0),
            )
            .map_err(|e| TriploomError::Storage(e.to_string()))
        })
    }

    async fn get_trip_by_id(&self, trip_id: &str) -> Result<Trip> {
        let row = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, destination, start_date, end_date, COALESCE(timezone, '')
                 FROM trips WHERE id = ?1",
                rusqlite::params![trip_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()
            .map_err(|e| TriploomError::Storage(e.to_string()))
        })?;

        let (id, destination, start, end, timezone) =
            row.ok_or_else(|| TriploomError::Storage(format!("trip not found: {}", trip_id)))?;
        Ok(Trip {
            id,
            destination,
            start_date: parse_date(&start)?,
            end_date: parse_date(&end)?,
            timezone,
        })
    }

    async fn upsert_conversation(
        &self,
        trip_id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<String> {
        let now = Utc::now().timestamp_millis();
        self.db.with_conn(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM ai_conversations
                     WHERE trip_id = ?1 AND user_id = ?2
                     ORDER BY updated_at DESC, rowid DESC LIMIT 1",
                    rusqlite::params![trip_id, user_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| TriploomError::Storage(e.to_string()))?;

            if let Some(id) = existing {
                conn.execute(
                    "UPDATE ai_conversations SET updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, id],
                )
                .map_err(|e| TriploomError::Storage(e.to_string()))?;
                return Ok(id);
            }

            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO ai_conversations (id, trip_id, user_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                rusqlite::params![id, trip_id, user_id, title, now],
            )
            .map_err(|e| TriploomError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(id)
        })
    }

    async fn insert_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
        model: &str,
        usage: &Map<String, Value>,
    ) -> Result<()> {
        let usage_json = serde_json::to_string(usage)?;
        let now = Utc::now().timestamp_millis();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO ai_messages (id, conversation_id, role, content, model, token_usage_json, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    Uuid::new_v4().to_string(),
                    conversation_id,
                    role,
                    content,
                    model,
                    usage_json,
                    now,
                ],
            )
            .map_err(|e| TriploomError::Storage(format!("Failed to save message: {}", e)))?;
            conn.execute(
                "UPDATE ai_conversations SET updated_at = ?1 WHERE id = ?2",
                rusqlite::params![now, conversation_id],
            )
            .map_err(|e| TriploomError::Storage(e.to_string()))?;
            Ok(())
        })
    }

    async fn insert_tool_snapshot(
        &self,
        conversation_id: &str,
        page_key: &str,
        tool_name: &str,
        status: &str,
        payload: &Value,
    ) -> Result<()> {
        let payload_json = serde_json::to_string(payload)?;
        self.insert_json_row(
            "INSERT INTO ai_tool_snapshots (id, conversation_id, page_key, tool_name, status, payload_json, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                conversation_id,
                page_key,
                tool_name,
                status,
                payload_json,
                Utc::now().timestamp_millis(),
            ],
            "tool snapshot",
        )
    }

    async fn insert_context_snapshot(
        &self,
        trip_id: &str,
        page_key: &str,
        payload: &Value,
    ) -> Result<()> {
        let payload_json = serde_json::to_string(payload)?;
        self.insert_json_row(
            "INSERT INTO ai_context_snapshots (id, trip_id, page_key, context_json, generated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                trip_id,
                page_key,
                payload_json,
                Utc::now().timestamp_millis(),
            ],
            "context snapshot",
        )
    }

    async fn insert_audit_log(
        &self,
        user_id: &str,
        trip_id: &str,
        action: &str,
        metadata: &Value,
    ) -> Result<()> {
        let metadata_json = serde_json::to_string(metadata)?;
        self.insert_json_row(
            "INSERT INTO ai_audit_logs (id, user_id, trip_id, action, metadata_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                Uuid::new_v4().to_string(),
                user_id,
                trip_id,
                action,
                metadata_json,
                Utc::now().timestamp_millis(),
            ],
            "audit log",
        )
    }

    async fn list_conversations(&self, trip_id: &str, user_id: &str) -> Result<Vec<Conversation>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, trip_id, user_id, title, created_at, updated_at
                     FROM ai_conversations
                     WHERE trip_id = ?1 AND user_id = ?2
                     ORDER BY updated_at DESC, rowid DESC
                     LIMIT ?3",
                )
                .map_err(|e| TriploomError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![trip_id, user_id, MAX_CONVERSATIONS as i64],
                    row_to_conversation,
                )
                .map_err(|e| TriploomError::Storage(e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| TriploomError::Storage(e.to_string()))
        })
    }

    async fn conversation_belongs_to_user(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM ai_conversations WHERE id = ?1 AND user_id = ?2)",
                rusqlite::params![conversation_id, user_id],
                |row| row.get(0),
            )
            .map_err(|e| TriploomError::Storage(e.to_string()))
        })
    }

    async fn list_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<StoredMessage>> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, role, content, model, token_usage_json, created_at
                     FROM ai_messages
                     WHERE conversation_id = ?1
                     ORDER BY created_at DESC, rowid DESC
                     LIMIT ?2",
                )
                .map_err(|e| TriploomError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(
                    rusqlite::params![conversation_id, limit as i64],
                    row_to_message,
                )
                .map_err(|e| TriploomError::Storage(e.to_string()))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(|e| TriploomError::Storage(e.to_string()))
        })
    }

    fn mode(&self) -> &'static str {
        "sqlite"
    }
}
