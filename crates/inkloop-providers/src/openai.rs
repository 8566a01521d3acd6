use async_trait::async_trait;
use inkloop_core::{CapabilityError, Generator, Message};
use serde_json::{json, Value};
use tracing::debug;

use crate::http;

/// OpenAI chat completions backend.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature,
        }
    }

    fn request_body(&self, messages: &[Message]) -> Value {
        let api_messages: Vec<Value> = messages
            .iter()
            .map(|m| json!({ "role": m.role.to_string(), "content": m.content }))
            .collect();
        json!({
            "model": self.model,
            "messages": api_messages,
            "temperature": self.temperature,
        })
    }
}

fn extract_text(data: &Value) -> Result<String, CapabilityError> {
    data.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(str::to_string)
        .ok_or_else(|| CapabilityError::Provider("openai: no message content in response".into()))
}

#[async_trait]
impl Generator for OpenAiGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, CapabilityError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, messages = messages.len(), "openai request");
        let request = self.client.post(&url).bearer_auth(&self.api_key);
        let data = http::post_json(request, &self.request_body(messages), "openai").await?;
        extract_text(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new(reqwest::Client::new(), "http://x", "k", "gpt-4o", 0.7)
    }

    #[test]
    fn test_request_body_keeps_roles_in_order() {
        let body = generator().request_body(&[Message::system("sys"), Message::user("hi")]);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_extract_text() {
        let data = json!({ "choices": [{ "message": { "role": "assistant", "content": "Hello" } }] });
        assert_eq!(extract_text(&data).unwrap(), "Hello");
        assert!(extract_text(&json!({ "choices": [] })).is_err());
    }
}
