//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use werewolf_coordination::{ChatMessage, GenerationError, TextGenerator};

use crate::config::LlmEndpoint;

/// Posts to `<url>/chat/completions` and returns the first choice.
///
/// One request per call; no retries. Failures surface as
/// [`GenerationError`] and end the game in progress.
pub struct OpenAiChat {
    client: reqwest::Client,
    endpoint: LlmEndpoint,
}

impl OpenAiChat {
    pub fn new(endpoint: LlmEndpoint) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(endpoint.timeout_secs))
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn completions_url(&self) -> String {
        let base = self.endpoint.url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{base}/chat/completions")
        }
    }

    pub fn request_body(&self, model: &str, messages: &[ChatMessage]) -> Value {
        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if let Some(temperature) = self.endpoint.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }
        if let Some(max_tokens) = self.endpoint.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }
}

/// Pull `choices[0].message.content` out of a completion payload.
pub fn extract_content(model: &str, payload: &Value) -> Result<String, GenerationError> {
    let content = payload["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            GenerationError::Malformed("missing choices[0].message.content".to_string())
        })?;
    if content.trim().is_empty() {
        return Err(GenerationError::Empty {
            model: model.to_string(),
        });
    }
    Ok(content.to_string())
}

#[async_trait]
impl TextGenerator for OpenAiChat {
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, GenerationError> {
        let start = std::time::Instant::now();
        let mut request = self
            .client
            .post(self.completions_url())
            .header("Content-Type", "application/json")
            .json(&self.request_body(model, messages));
        if let Some(key) = &self.endpoint.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| GenerationError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, body });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(e.to_string()))?;
        let content = extract_content(model, &payload)?;

        tracing::debug!(
            model,
            messages = messages.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(content)
    }
}
