//! Database schema migrations.
//!
//! Version 1 creates the trip membership tables the assistant reads from and
//! the conversation, message, snapshot, and audit tables it writes to.

use rusqlite::Connection;
use tracing::info;

use triploom_core::TriploomError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), TriploomError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| TriploomError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| TriploomError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema. Timestamps are epoch milliseconds.
fn apply_v1(conn: &Connection) -> Result<(), TriploomError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS trips (
            id          TEXT PRIMARY KEY NOT NULL,
            destination TEXT NOT NULL DEFAULT '',
            start_date  TEXT NOT NULL,
            end_date    TEXT NOT NULL,
            timezone    TEXT
        );

        CREATE TABLE IF NOT EXISTS trip_members (
            trip_id     TEXT NOT NULL REFERENCES trips (id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL,
            PRIMARY KEY (trip_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS ai_conversations (
            id          TEXT PRIMARY KEY NOT NULL,
            trip_id     TEXT NOT NULL,
            user_id     TEXT NOT NULL,
            title       TEXT NOT NULL DEFAULT '',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ai_conversations_owner
            ON ai_conversations (trip_id, user_id, updated_at DESC);

        CREATE TABLE IF NOT EXISTS ai_messages (
            id                TEXT PRIMARY KEY NOT NULL,
            conversation_id   TEXT NOT NULL REFERENCES ai_conversations (id) ON DELETE CASCADE,
            role              TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
            content           TEXT NOT NULL,
            model             TEXT NOT NULL DEFAULT '',
            token_usage_json  TEXT NOT NULL DEFAULT '{}',
            created_at        INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_ai_messages_conversation
            ON ai_messages (conversation_id, created_at DESC);

        CREATE TABLE IF NOT EXISTS ai_tool_snapshots (
            id               TEXT PRIMARY KEY NOT NULL,
            conversation_id  TEXT NOT NULL,
            page_key         TEXT NOT NULL,
            tool_name        TEXT NOT NULL,
            status           TEXT NOT NULL,
            payload_json     TEXT NOT NULL DEFAULT '{}',
            fetched_at       INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ai_context_snapshots (
            id            TEXT PRIMARY KEY NOT NULL,
            trip_id       TEXT NOT NULL,
            page_key      TEXT NOT NULL,
            context_json  TEXT NOT NULL DEFAULT '{}',
            generated_at  INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS ai_audit_logs (
            id             TEXT PRIMARY KEY NOT NULL,
            user_id        TEXT NOT NULL,
            trip_id        TEXT NOT NULL,
            action         TEXT NOT NULL,
            metadata_json  TEXT NOT NULL DEFAULT '{}',
            created_at     INTEGER NOT NULL
        );

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| TriploomError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}
