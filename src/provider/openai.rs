use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::errors::BlueprintError;
use crate::wire::{LlmRequest, LlmResponse, ResponseFormat};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions backend. Gemini-style schemas are passed along as
/// instructions; JSON mode is only forced when the schema root is an object,
/// since `json_object` cannot yield a top-level array.
pub struct OpenAIProvider {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(model: String, api_key: String, api_base: Option<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: Client::builder().timeout(timeout).build()?,
        })
    }
}

fn build_body(model: &str, req: &LlmRequest) -> Value {
    let mut system = req.instruction.system.clone();
    let mut body = json!({ "model": model });

    if let ResponseFormat::Json { schema } = &req.response {
        system.push_str("\n\nRespond with JSON only (no markdown, no code fences) matching this schema:\n");
        system.push_str(&schema.to_string());
        if schema["type"].as_str().is_some_and(|t| t.eq_ignore_ascii_case("object")) {
            body["response_format"] = json!({ "type": "json_object" });
        }
    }

    body["messages"] = json!([
        { "role": "system", "content": system },
        { "role": "user", "content": req.instruction.user },
    ]);
    body
}

fn extract_content(text: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct ChatMessage {
        content: Option<String>,
    }
    #[derive(Deserialize)]
    struct Choice {
        message: ChatMessage,
    }
    #[derive(Deserialize)]
    struct ChatResponse {
        choices: Vec<Choice>,
    }

    let parsed: ChatResponse = serde_json::from_str(text)
        .map_err(|e| anyhow!("Failed to parse OpenAI response: {e}"))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| anyhow!("openai: empty content"))
}

#[async_trait]
impl super::Provider for OpenAIProvider {
    async fn send(&self, req: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.api_base.trim_end_matches('/'));
        let body = build_body(&self.model, req);
        debug!(stage = req.stage.as_str(), %url, "openai: POST");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("openai request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("openai read body failed")?;
        debug!(stage = req.stage.as_str(), %status, bytes = text.len(), "openai: response");

        if !status.is_success() {
            return Err(BlueprintError::Provider(format!("OpenAI API error ({}): {}", status, text)).into());
        }

        Ok(LlmResponse { model: self.model.clone(), text: extract_content(&text)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Instruction, Stage};
    use chrono::Utc;
    use uuid::Uuid;

    fn request(response: ResponseFormat) -> LlmRequest {
        LlmRequest {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            stage: Stage::Tickets,
            instruction: Instruction { system: "sys".into(), user: "usr".into() },
            response,
        }
    }

    #[test]
    fn object_schema_forces_json_mode() {
        let body = build_body("m", &request(ResponseFormat::Json { schema: json!({"type": "OBJECT"}) }));
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body["messages"][0]["content"].as_str().unwrap().contains("\"OBJECT\""));
    }

    #[test]
    fn array_schema_is_described_but_not_forced() {
        let body = build_body("m", &request(ResponseFormat::Json { schema: json!({"type": "ARRAY"}) }));
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"][1]["content"], "usr");
    }

    #[test]
    fn plain_text_keeps_system_prompt_untouched() {
        let body = build_body("m", &request(ResponseFormat::Text));
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["model"], "m");
    }

    #[test]
    fn missing_content_is_an_error() {
        assert!(extract_content(r#"{"choices":[]}"#).is_err());
        assert_eq!(
            extract_content(r#"{"choices":[{"message":{"content":"hi"}}]}"#).unwrap(),
            "hi"
        );
    }
}
