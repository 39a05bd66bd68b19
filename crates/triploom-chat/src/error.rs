//! Error types for the chat pipeline.

use triploom_core::TriploomError;

use crate::providers::ModelError;

/// Errors surfaced by [`crate::ChatOrchestrator`].
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unauthorized trip access")]
    Unauthorized,
    #[error("model error: {0}")]
    Model(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<TriploomError> for ChatError {
    fn from(err: TriploomError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<ModelError> for ChatError {
    fn from(err: ModelError) -> Self {
        ChatError::Model(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::InvalidInput("tripId is required".to_string());
        assert_eq!(err.to_string(), "invalid input: tripId is required");

        assert_eq!(ChatError::Unauthorized.to_string(), "unauthorized trip access");

        let err = ChatError::Model("timeout".to_string());
        assert_eq!(err.to_string(), "model error: timeout");
    }

    #[test]
    fn test_chat_error_from_triploom_error() {
        let err: ChatError = TriploomError::Storage("trip not found: t1".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("trip not found: t1"));
    }

    #[test]
    fn test_chat_error_from_model_error() {
        let err: ChatError = ModelError::Status {
            status: 500,
            body: "boom".to_string(),
        }
        .into();
        assert!(matches!(err, ChatError::Model(_)));
        assert!(err.to_string().contains("500"));
    }
}
