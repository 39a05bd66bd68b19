//! In-process repository used when no database is configured.
//!
//! Every non-empty (trip, user) pair counts as a member and trips are
//! synthesized on lookup, so the service can run end-to-end without any
//! seeded data. Snapshot and audit rows are kept in bounded ring buffers;
//! only the newest [`MAX_RECORDED_ROWS`] of each kind are retained.

use std::collections::{HashMap, VecDeque};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use triploom_core::{Result, TriploomError};

use crate::repository::{AiRepository, MAX_CONVERSATIONS};
use crate::types::{
    AuditLogEntry, ContextSnapshot, Conversation, StoredMessage, ToolSnapshot, Trip,
};

/// Retention per snapshot/audit buffer. Older rows are evicted first.
pub const MAX_RECORDED_ROWS: usize = 256;

fn push_bounded<T>(buf: &mut VecDeque<T>, row: T) {
    if buf.len() == MAX_RECORDED_ROWS {
        buf.pop_front();
    }
    buf.push_back(row);
}

#[derive(Default)]
struct MemoryState {
    conversations_by_id: HashMap<String, Conversation>,
    conversation_by_owner: HashMap<(String, String), String>,
    messages_by_conversation: HashMap<String, Vec<StoredMessage>>,
    tool_snapshots: VecDeque<ToolSnapshot>,
    context_snapshots: VecDeque<ContextSnapshot>,
    audit_logs: VecDeque<AuditLogEntry>,
}

/// Map-backed repository behind a single reader/writer lock.
#[derive(Default)]
pub struct InMemoryRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|e| TriploomError::Storage(format!("memory store lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|e| TriploomError::Storage(format!("memory store lock poisoned: {}", e)))
    }

    /// Retained tool snapshots, oldest first.
    pub fn tool_snapshots(&self) -> Vec<ToolSnapshot> {
        self.read()
            .map(|s| s.tool_snapshots.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Retained context snapshots, oldest first.
    pub fn context_snapshots(&self) -> Vec<ContextSnapshot> {
        self.read()
            .map(|s| s.context_snapshots.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Retained audit log entries, oldest first.
    pub fn audit_logs(&self) -> Vec<AuditLogEntry> {
        self.read()
            .map(|s| s.audit_logs.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AiRepository for InMemoryRepository {
    async fn is_trip_member(&self, trip_id: &str, user_id: &str) -> Result<bool> {
        Ok(!trip_id.is_empty() && !user_id.is_empty())
    }

    async fn get_trip_by_id(&self, trip_id: &str) -> Result<Trip> {
        let now = Utc::now();
        Ok(Trip {
            id: trip_id.to_string(),
            destination: "Test Destination".to_string(),
            start_date: now.date_naive(),
            end_date: (now + Duration::hours(72)).date_naive(),
            timezone: "UTC".to_string(),
        })
    }

    async fn upsert_conversation(
        &self,
        trip_id: &str,
        user_id: &str,
        title: &str,
    ) -> Result<String> {
        let owner = (trip_id.to_string(), user_id.to_string());
        let now = Utc::now();
        let mut state = self.write()?;

        if let Some(id) = state.conversation_by_owner.get(&owner).cloned() {
            if let Some(conv) = state.conversations_by_id.get_mut(&id) {
                conv.updated_at = now;
            }
            return Ok(id);
        }

        let id = Uuid::new_v4().to_string();
        state.conversations_by_id.insert(
            id.clone(),
            Conversation {
                id: id.clone(),
                trip_id: trip_id.to_string(),
                user_id: user_id.to_string(),
                title: title.to_string(),
                created_at: now,
                updated_at: now,
            },
        );
        state.conversation_by_owner.insert(owner, id.clone());
        Ok(id)
    }

    async fn insert_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
        model: &str,
        usage: &Map<String, Value>,
    ) -> Result<()> {
        let msg = StoredMessage {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            model: model.to_string(),
            token_usage_json: usage.clone(),
            created_at: Utc::now(),
        };
        let mut state = self.write()?;
        if let Some(conv) = state.conversations_by_id.get_mut(conversation_id) {
            conv.updated_at = msg.created_at;
        }
        state
            .messages_by_conversation
            .entry(conversation_id.to_string())
            .or_default()
            .push(msg);
        Ok(())
    }

    async fn insert_tool_snapshot(
        &self,
        conversation_id: &str,
        page_key: &str,
        tool_name: &str,
        status: &str,
        payload: &Value,
    ) -> Result<()> {
        let row = ToolSnapshot {
            conversation_id: conversation_id.to_string(),
            page_key: page_key.to_string(),
            tool_name: tool_name.to_string(),
            status: status.to_string(),
            payload: payload.clone(),
            fetched_at: Utc::now(),
        };
        push_bounded(&mut self.write()?.tool_snapshots, row);
        Ok(())
    }

    async fn insert_context_snapshot(
        &self,
        trip_id: &str,
        page_key: &str,
        payload: &Value,
    ) -> Result<()> {
        let row = ContextSnapshot {
            trip_id: trip_id.to_string(),
            page_key: page_key.to_string(),
            context: payload.clone(),
            generated_at: Utc::now(),
        };
        push_bounded(&mut self.write()?.context_snapshots, row);
        Ok(())
    }

    async fn insert_audit_log(
        &self,
        user_id: &str,
        trip_id: &str,
        action: &str,
        metadata: &Value,
    ) -> Result<()> {
        let row = AuditLogEntry {
            user_id: user_id.to_string(),
            trip_id: trip_id.to_string(),
            action: action.to_string(),
            metadata: metadata.clone(),
            created_at: Utc::now(),
        };
        push_bounded(&mut self.write()?.audit_logs, row);
        Ok(())
    }

    async fn list_conversations(&self, trip_id: &str, user_id: &str) -> Result<Vec<Conversation>> {
        let state = self.read()?;
        let mut out: Vec<Conversation> = state
            .conversations_by_id
            .values()
            .filter(|c| c.trip_id == trip_id && c.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        out.truncate(MAX_CONVERSATIONS);
        Ok(out)
    }

    async fn conversation_belongs_to_user(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<bool> {
        let state = self.read()?;
        Ok(state
            .conversations_by_id
            .get(conversation_id)
            .is_some_and(|c| c.user_id == user_id))
    }

    async fn list_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<StoredMessage>> {
        let state = self.read()?;
        Ok(state
            .messages_by_conversation
            .get(conversation_id)
            .map(|msgs| msgs.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    fn mode(&self) -> &'static str {
        "in-memory"
    }
}
