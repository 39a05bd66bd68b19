//! The persistence boundary consumed by the chat pipeline.

use async_trait::async_trait;
use serde_json::{Map, Value};

use triploom_core::Result;

use crate::types::{Conversation, StoredMessage, Trip};

/// Maximum number of conversations returned by [`AiRepository::list_conversations`].
pub const MAX_CONVERSATIONS: usize = 50;

/// Persistence operations for trips, conversations, and AI audit records.
///
/// Implementations must be safe to share across concurrent requests.
/// Listing operations return newest-first.
#[async_trait]
pub trait AiRepository: Send + Sync {
    async fn is_trip_member(&self, trip_id: &str, user_id: &str) -> Result<bool>;

    async fn get_trip_by_id(&self, trip_id: &str) -> Result<Trip>;

    /// Find the (trip, user) conversation, touching its `updated_at`, or create it.
    async fn upsert_conversation(&self, trip_id: &str, user_id: &str, title: &str)
        -> Result<String>;

    async fn insert_message(
        &self,
        conversation_id: &str,
        role: &str,
        content: &str,
        model: &str,
        usage: &Map<String, Value>,
    ) -> Result<()>;

    async fn insert_tool_snapshot(
        &self,
        conversation_id: &str,
        page_key: &str,
        tool_name: &str,
        status: &str,
        payload: &Value,
    ) -> Result<()>;

    async fn insert_context_snapshot(
        &self,
        trip_id: &str,
        page_key: &str,
        payload: &Value,
    ) -> Result<()>;

    async fn insert_audit_log(
        &self,
        user_id: &str,
        trip_id: &str,
        action: &str,
        metadata: &Value,
    ) -> Result<()>;

    /// At most [`MAX_CONVERSATIONS`] conversations, most recently updated first.
    async fn list_conversations(&self, trip_id: &str, user_id: &str)
        -> Result<Vec<Conversation>>;

    async fn conversation_belongs_to_user(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> Result<bool>;

    /// The `limit` most recent messages, newest first.
    async fn list_messages(&self, conversation_id: &str, limit: usize)
        -> Result<Vec<StoredMessage>>;

    /// Short description of the backing store, for startup logs.
    fn mode(&self) -> &'static str;
}
