//! HTTP client for the web app's live-data endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};

use triploom_core::config::BridgeConfig;

use super::{BridgeClient, BridgeError};

pub struct HttpBridgeClient {
    client: Client,
    base_url: String,
}

impl HttpBridgeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BridgeConfig) -> Result<Self, BridgeError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a bridge response body, which must be a JSON object.
fn decode_object(raw: &str) -> Result<Map<String, Value>, BridgeError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(BridgeError::Decode(format!(
            "expected JSON object, got {}",
            other
        ))),
        Err(e) => Err(BridgeError::Decode(e.to_string())),
    }
}

#[async_trait]
impl BridgeClient for HttpBridgeClient {
    async fn post_json(&self, path: &str, body: &Value) -> Result<Map<String, Value>, BridgeError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| BridgeError::Transport(e.to_string()))?;

        if status.as_u16() >= 300 {
            return Err(BridgeError::Status {
                status: status.as_u16(),
                body: raw,
            });
        }
        decode_object(&raw)
    }
}
