//! Application state shared across all route handlers.

use std::sync::Arc;

use triploom_chat::ChatOrchestrator;

use crate::auth::AuthMode;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// The chat pipeline behind every `/v1/ai` endpoint.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// How callers are identified.
    pub auth: Arc<AuthMode>,
    /// Origins allowed by CORS, also reported by `/healthz`.
    pub allowed_origins: Arc<Vec<String>>,
}

impl AppState {
    pub fn new(orchestrator: ChatOrchestrator, auth: AuthMode, allowed_origins: Vec<String>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            auth: Arc::new(auth),
            allowed_origins: Arc::new(allowed_origins),
        }
    }
}
