//! Trip-aware chat pipeline for TripLoom.
//!
//! Assembles per-request trip context, optionally augments it with live data
//! from the web app bridge, calls the language model, and falls back to
//! deterministic page-aware answers when the model yields nothing usable.
//! Also infers structured trip-planning drafts from free-form conversation.

pub mod error;
pub mod extract;
pub mod fallback;
pub mod model_selector;
pub mod orchestrator;
pub mod planner;
pub mod prompt;
pub mod providers;
pub mod realtime;
pub mod response;
pub mod types;

pub use error::ChatError;
pub use model_selector::ModelSelector;
pub use orchestrator::ChatOrchestrator;
pub use providers::{
    BridgeClient, BridgeError, HttpBridgeClient, ModelClient, ModelError, ModelReply,
    OpenAiClient,
};
pub use realtime::{RealtimeContext, RealtimeDispatcher};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, ContextPayload, PlannerChatRequest,
    PlannerChatResponse, PlannerDraft, PlannerDraftItem, RefreshContextRequest,
    RefreshContextResponse, Source, SourceStatus, TripContext,
};
