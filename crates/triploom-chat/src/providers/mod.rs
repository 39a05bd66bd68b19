//! Collaborators the pipeline talks to over the network.
//!
//! [`ModelClient`] generates answers; [`BridgeClient`] fetches live data from
//! the sibling web app. Both are traits so the orchestrator can be driven by
//! in-process fakes.

pub mod bridge;
pub mod openai;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::types::ChatMessage;

pub use bridge::HttpBridgeClient;
pub use openai::OpenAiClient;

/// Text returned when the provider produced no output at all.
pub const PLACEHOLDER_ANSWER: &str = "I could not generate a response.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    pub text: String,
    pub token_usage: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("openai request failed: {0}")]
    Transport(String),
    #[error("openai responses error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("openai response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("next bridge request failed: {0}")]
    Transport(String),
    #[error("next bridge error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("next bridge response could not be decoded: {0}")]
    Decode(String),
}

/// A generative model reachable over the network.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Answer the conversation under `system_prompt`.
    ///
    /// Implementations return [`PLACEHOLDER_ANSWER`] rather than an empty
    /// string when the provider produced no text.
    async fn respond(
        &self,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<ModelReply, ModelError>;
}

/// JSON-over-HTTP access to the web app's live-data endpoints.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Map<String, Value>, BridgeError>;
}
