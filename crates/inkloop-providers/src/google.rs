use async_trait::async_trait;
use inkloop_core::{CapabilityError, Generator, Message, MessageRole};
use serde_json::{json, Value};
use tracing::debug;

use crate::http;

/// Google Gemini `generateContent` backend.
pub struct GoogleGenerator {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GoogleGenerator {
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
        let mut system = Vec::new();
        let mut contents = Vec::new();
        for m in messages {
            let role = match m.role {
                MessageRole::System => {
                    system.push(m.content.as_str());
                    continue;
                }
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };
            contents.push(json!({ "role": role, "parts": [{ "text": m.content }] }));
        }
        let mut body = json!({
            "contents": contents,
            "generationConfig": { "temperature": self.temperature },
        });
        if !system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system.join("\n\n") }] });
        }
        body
    }
}

fn extract_text(data: &Value) -> Result<String, CapabilityError> {
    let parts = data
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .ok_or_else(|| CapabilityError::Provider("google: no candidate content in response".into()))?;
    Ok(parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect())
}

#[async_trait]
impl Generator for GoogleGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[Message]) -> Result<String, CapabilityError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        debug!(model = %self.model, messages = messages.len(), "google request");
        let request = self.client.post(&url).header("x-goog-api-key", &self.api_key);
        let data = http::post_json(request, &self.request_body(messages), "google").await?;
        extract_text(&data)
    }
}
