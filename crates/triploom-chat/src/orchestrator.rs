//! Chat orchestrator: the request pipeline behind every assistant endpoint.
//!
//! Validates input, checks trip membership, assembles the context payload,
//! optionally gathers live data, calls the model, substitutes a local answer
//! when the model yields nothing usable, and records the exchange.

use std::sync::Arc;

use serde_json::{json, Map};
use tracing::{debug, info, warn};

use triploom_storage::{AiRepository, Conversation, StoredMessage};

use crate::error::ChatError;
use crate::fallback::{is_unusable, synthesize, PLANNER_FALLBACK};
use crate::model_selector::ModelSelector;
use crate::planner::build_planner_draft;
use crate::prompt::{build_planner_system_prompt, build_system_prompt};
use crate::providers::{BridgeClient, ModelClient};
use crate::realtime::RealtimeDispatcher;
use crate::response::{conversation_title, highlights, suggest_actions_for_page};
use crate::types::{
    last_content, now_rfc3339, ChatRequest, ChatResponse, ContextPayload,
    PlannerChatRequest, PlannerChatResponse, RefreshContextRequest, RefreshContextResponse,
    Source,
};

/// Default page size for message listings.
pub const DEFAULT_MESSAGE_LIMIT: usize = 50;
/// Largest page size a caller may request.
pub const MAX_MESSAGE_LIMIT: usize = 200;

const DEFAULT_SOURCE: &str = "trip_db_context";
const PLANNER_SOURCE: &str = "planner_context";

/// Normalize a requested page size: anything outside `1..=200` becomes 50.
pub fn clamp_message_limit(requested: i64) -> usize {
    if requested <= 0 || requested > MAX_MESSAGE_LIMIT as i64 {
        DEFAULT_MESSAGE_LIMIT
    } else {
        requested as usize
    }
}

/// Log and drop a failed write the response does not depend on.
fn best_effort<T, E: std::fmt::Display>(operation: &str, result: Result<T, E>) {
    if let Err(e) = result {
        warn!(operation, error = %e, "Best-effort write failed");
    }
}

pub struct ChatOrchestrator {
    repo: Arc<dyn AiRepository>,
    model: Arc<dyn ModelClient>,
    dispatcher: RealtimeDispatcher,
    selector: ModelSelector,
}

impl ChatOrchestrator {
    pub fn new(
        repo: Arc<dyn AiRepository>,
        model: Arc<dyn ModelClient>,
        bridge: Arc<dyn BridgeClient>,
        selector: ModelSelector,
    ) -> Self {
        Self {
            repo,
            model,
            dispatcher: RealtimeDispatcher::new(bridge),
            selector,
        }
    }

    async fn ensure_trip_member(&self, trip_id: &str, user_id: &str) -> Result<(), ChatError> {
        if self.repo.is_trip_member(trip_id, user_id).await? {
            Ok(())
        } else {
            Err(ChatError::Unauthorized)
        }
    }

    /// Answer a page chat turn for a trip member.
    pub async fn chat(&self, user_id: &str, req: ChatRequest) -> Result<ChatResponse, ChatError> {
        if req.trip_id.is_empty() {
            return Err(ChatError::InvalidInput("tripId is required".into()));
        }
        if req.page_key.is_empty() {
            return Err(ChatError::InvalidInput("pageKey is required".into()));
        }
        if req.messages.is_empty() {
            return Err(ChatError::InvalidInput("messages are required".into()));
        }

        self.ensure_trip_member(&req.trip_id, user_id).await?;
        let trip = self.repo.get_trip_by_id(&req.trip_id).await?;
        let conversation_id = self
            .repo
            .upsert_conversation(&req.trip_id, user_id, &conversation_title(&req.page_key))
            .await?;

        let mut payload =
            ContextPayload::for_trip(&trip, &req.page_key, req.page_context.as_ref());
        let mut sources: Vec<Source> = Vec::new();
        let mut degraded = false;
        if req.refresh {
            let live = self.dispatcher.fetch(&req.page_key, &req.messages).await;
            degraded = live.degraded;
            sources = live.sources;
            payload = payload.with_extra(live.data);
        }
        if sources.is_empty() {
            sources.push(Source::ok(DEFAULT_SOURCE));
        }

        best_effort(
            "insert_context_snapshot",
            self.repo
                .insert_context_snapshot(&req.trip_id, &req.page_key, &payload.to_json())
                .await,
        );

        let user_prompt = last_content(&req.messages);
        let model = self.selector.select(user_prompt, &req.messages).to_string();
        let system_prompt = build_system_prompt(&req.page_key, &payload, degraded);

        let reply = self
            .model
            .respond(&model, &system_prompt, &req.messages)
            .await?;
        let answer = if is_unusable(&reply.text) {
            debug!(
                page_key = %req.page_key,
                degraded,
                "Model output unusable; using local fallback"
            );
            synthesize(&req.page_key, &req.messages, degraded)
        } else {
            reply.text
        };

        self.repo
            .insert_message(&conversation_id, "user", user_prompt, "", &Map::new())
            .await?;
        self.repo
            .insert_message(&conversation_id, "assistant", &answer, &model, &reply.token_usage)
            .await?;

        for src in &sources {
            let detail = src.detail.as_deref().unwrap_or_default();
            best_effort(
                "insert_tool_snapshot",
                self.repo
                    .insert_tool_snapshot(
                        &conversation_id,
                        &req.page_key,
                        &src.name,
                        src.status.as_str(),
                        &json!({"detail": detail, "fetchedAt": src.fetched_at}),
                    )
                    .await,
            );
        }
        best_effort(
            "insert_audit_log",
            self.repo
                .insert_audit_log(
                    user_id,
                    &req.trip_id,
                    "ai_chat",
                    &json!({"pageKey": req.page_key, "model": model, "degraded": degraded}),
                )
                .await,
        );

        info!(
            conversation_id = %conversation_id,
            page_key = %req.page_key,
            model = %model,
            degraded,
            "Chat turn completed"
        );

        Ok(ChatResponse {
            conversation_id,
            answer,
            highlights: highlights(&req.page_key),
            suggested_actions: suggest_actions_for_page(&req.page_key),
            sources,
            degraded,
        })
    }

    /// Answer a planner turn and infer a trip draft. Nothing is persisted.
    pub async fn planner_chat(
        &self,
        user_id: &str,
        req: PlannerChatRequest,
    ) -> Result<PlannerChatResponse, ChatError> {
        if req.messages.is_empty() {
            return Err(ChatError::InvalidInput("messages are required".into()));
        }

        let payload = ContextPayload::for_planner(user_id, req.planner_context.as_ref());
        let sources = vec![Source::ok(PLANNER_SOURCE)];
        let degraded = false;

        let model = self
            .selector
            .select(last_content(&req.messages), &req.messages)
            .to_string();
        let system_prompt = build_planner_system_prompt(&payload, degraded);

        let reply = self
            .model
            .respond(&model, &system_prompt, &req.messages)
            .await?;
        let answer = if is_unusable(&reply.text) {
            PLANNER_FALLBACK.to_string()
        } else {
            reply.text
        };

        let planner_draft = build_planner_draft(req.planner_context.as_ref(), &req.messages, &answer);
        debug!(
            model = %model,
            drafted = planner_draft.is_some(),
            "Planner turn completed"
        );

        Ok(PlannerChatResponse {
            answer,
            sources,
            degraded,
            planner_draft,
        })
    }

    /// Conversations the user holds on a trip, most recently updated first.
    pub async fn list_conversations(
        &self,
        user_id: &str,
        trip_id: &str,
    ) -> Result<Vec<Conversation>, ChatError> {
        self.ensure_trip_member(trip_id, user_id).await?;
        Ok(self.repo.list_conversations(trip_id, user_id).await?)
    }

    /// Newest messages of a conversation the user owns.
    pub async fn list_messages(
        &self,
        user_id: &str,
        conversation_id: &str,
        limit: i64,
    ) -> Result<Vec<StoredMessage>, ChatError> {
        if !self
            .repo
            .conversation_belongs_to_user(conversation_id, user_id)
            .await?
        {
            return Err(ChatError::Unauthorized);
        }
        Ok(self
            .repo
            .list_messages(conversation_id, clamp_message_limit(limit))
            .await?)
    }

    /// Record that the user asked for fresh context on a page.
    pub async fn refresh_context(
        &self,
        user_id: &str,
        req: RefreshContextRequest,
    ) -> Result<RefreshContextResponse, ChatError> {
        if req.trip_id.is_empty() || req.page_key.is_empty() {
            return Err(ChatError::InvalidInput(
                "tripId and pageKey are required".into(),
            ));
        }
        self.ensure_trip_member(&req.trip_id, user_id).await?;

        let snapshot = json!({"pageKey": req.page_key, "refreshedBy": user_id});
        self.repo
            .insert_context_snapshot(&req.trip_id, &req.page_key, &snapshot)
            .await?;

        Ok(RefreshContextResponse {
            updated_at: now_rfc3339(),
            page_key: req.page_key,
        })
    }
}
