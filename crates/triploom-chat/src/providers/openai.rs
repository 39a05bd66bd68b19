//! OpenAI Responses API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use triploom_core::config::ModelConfig;

use super::{ModelClient, ModelError, ModelReply, PLACEHOLDER_ANSWER};
use crate::types::ChatMessage;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(
        base_url: &str,
        api_key: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            max_retries,
        })
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        Self::new(
            &config.base_url,
            &config.api_key,
            Duration::from_secs(config.timeout_secs),
            config.max_retries,
        )
    }

    async fn send_once(&self, body: &Value) -> Result<Value, ModelError> {
        let response = self
            .client
            .post(format!("{}/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))
    }
}

fn is_retryable(err: &ModelError) -> bool {
    match err {
        ModelError::Transport(_) => true,
        ModelError::Status { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        ModelError::Decode(_) => false,
    }
}

/// Flatten the conversation into `role: content` blocks separated by blank lines.
pub fn build_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Output text from a Responses API body.
///
/// Prefers the top-level `output_text` convenience field and falls back to
/// concatenating `output_text` parts of message items.
pub fn extract_text(body: &Value) -> String {
    if let Some(text) = body.get("output_text").and_then(Value::as_str) {
        return text.to_string();
    }

    let mut out = String::new();
    let items = body.get("output").and_then(Value::as_array);
    for item in items.into_iter().flatten() {
        if item.get("type").and_then(Value::as_str) != Some("message") {
            continue;
        }
        let parts = item.get("content").and_then(Value::as_array);
        for part in parts.into_iter().flatten() {
            if part.get("type").and_then(Value::as_str) == Some("output_text") {
                if let Some(text) = part.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                }
            }
        }
    }
    out
}

fn extract_usage(body: &Value) -> Map<String, Value> {
    body.get("usage")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn respond(
        &self,
        model: &str,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<ModelReply, ModelError> {
        let body = json!({
            "model": model,
            "instructions": system_prompt,
            "input": build_transcript(messages),
        });

        let mut attempt = 0;
        let response = loop {
            match self.send_once(&body).await {
                Ok(v) => break v,
                Err(e) if attempt < self.max_retries && is_retryable(&e) => {
                    attempt += 1;
                    warn!(model, attempt, error = %e, "Retrying model request");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        };

        let mut text = extract_text(&response).trim().to_string();
        if text.is_empty() {
            text = PLACEHOLDER_ANSWER.to_string();
        }
        let token_usage = extract_usage(&response);
        debug!(model, chars = text.len(), "Model responded");

        Ok(ModelReply { text, token_usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_format() {
        let messages = vec![
            ChatMessage::user("  Hi there "),
            ChatMessage::assistant("Hello"),
            ChatMessage::user("Plan Lisbon"),
        ];
        assert_eq!(
            build_transcript(&messages),
            "user: Hi there\n\nassistant: Hello\n\nuser: Plan Lisbon"
        );
        assert_eq!(build_transcript(&[]), "");
    }

    #[test]
    fn test_extract_text_prefers_output_text() {
        let body = json!({"output_text": "direct", "output": []});
        assert_eq!(extract_text(&body), "direct");
    }

    #[test]
    fn test_extract_text_from_message_items() {
        let body = json!({
            "output": [
                {"type": "reasoning", "summary": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Hello "},
                    {"type": "refusal", "refusal": "no"},
                    {"type": "output_text", "text": "world"}
                ]}
            ]
        });
        assert_eq!(extract_text(&body), "Hello world");
        assert_eq!(extract_text(&json!({})), "");
    }

    #[test]
    fn test_usage_is_open_object() {
        let body = json!({"usage": {"input_tokens": 10, "output_tokens": 4}});
        let usage = extract_usage(&body);
        assert_eq!(usage["input_tokens"], 10);
        assert!(extract_usage(&json!({"usage": null})).is_empty());
    }

    #[test]
    fn test_retryable_errors() {
        assert!(is_retryable(&ModelError::Transport("reset".into())));
        assert!(is_retryable(&ModelError::Status {
            status: 429,
            body: String::new()
        }));
        assert!(is_retryable(&ModelError::Status {
            status: 503,
            body: String::new()
        }));
        assert!(!is_retryable(&ModelError::Status {
            status: 400,
            body: String::new()
        }));
        assert!(!is_retryable(&ModelError::Decode("eof".into())));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client =
            OpenAiClient::new("https://api.example.com/v1/", "k", Duration::from_secs(1), 0).unwrap();
        assert_eq!(client.base_url, "https://api.example.com/v1");
    }
}
