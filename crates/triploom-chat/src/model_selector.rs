//! Per-request model choice.

use crate::types::ChatMessage;

/// Chooses which model answers a request.
///
/// Every request currently goes to the configured default model.
#[derive(Debug, Clone)]
pub struct ModelSelector {
    default_model: String,
}

impl ModelSelector {
    pub fn new(default_model: impl Into<String>) -> Self {
        Self {
            default_model: default_model.into(),
        }
    }

    pub fn select(&self, _prompt: &str, _messages: &[ChatMessage]) -> &str {
        &self.default_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_always_returns_default_model() {
        let selector = ModelSelector::new("gpt-5-mini");
        assert_eq!(
            selector.select("hello", &[ChatMessage::user("hello")]),
            "gpt-5-mini"
        );

        let long_history = vec![ChatMessage::user("compare"); 12];
        assert_eq!(
            selector.select("Please compare and optimize", &long_history),
            "gpt-5-mini"
        );
    }
}
