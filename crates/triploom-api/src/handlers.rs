//! HTTP request handlers for all API endpoints.
//!
//! Each handler extracts the caller from the auth extension, delegates to
//! the chat orchestrator, and wraps the result in the response envelope.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use triploom_chat::{
    ChatRequest, ChatResponse, PlannerChatRequest, PlannerChatResponse, RefreshContextRequest,
    RefreshContextResponse,
};
use triploom_storage::{Conversation, StoredMessage};

use crate::auth::UserId;
use crate::error::{ApiError, Envelope};
use crate::state::AppState;

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub origins: Vec<String>,
}

/// GET /healthz - liveness plus the configured CORS origins.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        origins: state.allowed_origins.as_ref().clone(),
    })
}

// =============================================================================
// Assistant
// =============================================================================

/// POST /v1/ai/chat
pub async fn chat(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(req) = body?;
    let resp = state.orchestrator.chat(&user_id, req).await?;
    Ok(Envelope::ok(resp))
}

/// POST /v1/ai/planner/chat
pub async fn planner_chat(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    body: Result<Json<PlannerChatRequest>, JsonRejection>,
) -> ApiResult<PlannerChatResponse> {
    let Json(req) = body?;
    let resp = state.orchestrator.planner_chat(&user_id, req).await?;
    Ok(Envelope::ok(resp))
}

/// GET /v1/ai/conversations/{tripId}
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(trip_id): Path<String>,
) -> ApiResult<Vec<Conversation>> {
    let convs = state
        .orchestrator
        .list_conversations(&user_id, &trip_id)
        .await?;
    Ok(Envelope::ok(convs))
}

#[derive(Debug, Default, Deserialize)]
pub struct MessagesQuery {
    /// Kept as text so a malformed value falls back to the default page size.
    pub limit: Option<String>,
}

impl MessagesQuery {
    fn limit(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(0)
    }
}

/// GET /v1/ai/conversations/{conversationId}/messages?limit=
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(conversation_id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Vec<StoredMessage>> {
    let limit = triploom_chat::orchestrator::clamp_message_limit(query.limit());
    let msgs = state
        .orchestrator
        .list_messages(&user_id, &conversation_id, limit as i64)
        .await?;
    Ok(Envelope::ok(msgs))
}

/// POST /v1/ai/context/refresh
pub async fn refresh_context(
    State(state): State<AppState>,
    Extension(UserId(user_id)): Extension<UserId>,
    body: Result<Json<RefreshContextRequest>, JsonRejection>,
) -> ApiResult<RefreshContextResponse> {
    let Json(req) = body?;
    let resp = state.orchestrator.refresh_context(&user_id, req).await?;
    Ok(Envelope::ok(resp))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_query_limit_parsing() {
        let q = |raw: Option<&str>| MessagesQuery {
            limit: raw.map(str::to_string),
        };
        assert_eq!(q(None).limit(), 0);
        assert_eq!(q(Some("25")).limit(), 25);
        assert_eq!(q(Some("abc")).limit(), 0);
        assert_eq!(q(Some("-4")).limit(), -4);
    }
}
