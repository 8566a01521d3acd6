use async_trait::async_trait;
use inkloop_core::{CapabilityError, Generator, Message, MessageRole};
use serde_json::{json, Value};
use tracing::debug;

use crate::http;

const API_VERSION: &str = "2023-06-01";

/// Anthropic messages backend. System messages are lifted into the
/// top-level `system` field.
pub struct AnthropicGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl AnthropicGenerator {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    fn request_body(&self, messages: &[Message]) -> Value {
        let mut system = Vec::new();
        let mut turns = Vec::new();
        for m in messages {
            match m.role {
                MessageRole::System => system.push(m.content.as_str()),
                MessageRole::User => turns.push(json!({ "role": "user", "content": m.content })),
                MessageRole::Assistant => {
                    turns.push(json!({ "role": "assistant", "content": m.content }))
                }
            }
        }
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": turns,
        });
        if !system.is_empty() {
            body["system"] = Value::String(system.join("\n\n"));
        }
        body
    }
}

fn extract_text(data: &Value) -> Result<String, CapabilityError> {
    let blocks = data
        .get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| CapabilityError::Provider("anthropic: no content in response".into()))?;
    Ok(blocks
        .iter()
        .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
        .collect())
}

#[async_trait]
impl Generator for AnthropicGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, CapabilityError> {
        let url = format!("{}/messages", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, messages = messages.len(), "anthropic request");
        let request = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION);
        let data = http::post_json(request, &self.request_body(messages), "anthropic").await?;
        extract_text(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> AnthropicGenerator {
        AnthropicGenerator::new(
            reqwest::Client::new(),
            "http://x",
            "k",
            "claude-3-5-sonnet-latest",
            0.7,
            1024,
        )
    }

    #[test]
    fn test_system_lifted_out_of_messages() {
        let body = generator().request_body(&[Message::system("rules"), Message::user("go")]);
        assert_eq!(body["system"], "rules");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 1024);
    }

    #[test]
    fn test_no_system_field_without_system_messages() {
        let body = generator().request_body(&[Message::user("go")]);
        assert!(body.get("system").is_none());
    }

    #[test]
    fn test_extract_text_joins_blocks() {
        let data = json!({ "content": [{ "type": "text", "text": "a" }, { "type": "text", "text": "b" }] });
        assert_eq!(extract_text(&data).unwrap(), "ab");
        assert!(extract_text(&json!({})).is_err());
    }
}
