use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::errors::BlueprintError;
use crate::wire::{LlmRequest, LlmResponse, ResponseFormat};
use super::Provider;

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiProvider {
    model: String,
    api_key: String,
    api_base: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(model: String, api_key: String, api_base: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            model,
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base.trim_end_matches('/'), self.model)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: SystemInstruction<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct SystemInstruction<'a> {
    parts: Vec<PartIn<'a>>,
}

#[derive(Serialize)]
struct PartIn<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Deserialize)]
struct PartOut {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn build_body(req: &LlmRequest) -> GenerateRequest<'_> {
    let generation_config = match &req.response {
        ResponseFormat::Text => None,
        ResponseFormat::Json { schema } => Some(GenerationConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        }),
    };
    GenerateRequest {
        contents: vec![Content { role: "user", parts: vec![PartIn { text: &req.instruction.user }] }],
        system_instruction: SystemInstruction { parts: vec![PartIn { text: &req.instruction.system }] },
        generation_config,
    }
}

/// Concatenates the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| anyhow!("gemini response parse error: {}", e))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(anyhow!("gemini: empty response ({})", reason));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(anyhow!("gemini: empty content"));
    }
    Ok(text)
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn send(&self, req: &LlmRequest) -> Result<LlmResponse> {
        let url = self.url();
        let body = build_body(req);
        debug!(stage = req.stage.as_str(), %url, "gemini: POST");

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("gemini request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("gemini read body failed")?;
        debug!(stage = req.stage.as_str(), %status, bytes = text.len(), "gemini: response");

        if !status.is_success() {
            return Err(BlueprintError::Provider(format!("Gemini API error ({}): {}", status, text)).into());
        }

        Ok(LlmResponse { model: self.model.clone(), text: extract_text(&text)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Instruction, Stage};
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn request(response: ResponseFormat) -> LlmRequest {
        LlmRequest {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            stage: Stage::Platform,
            instruction: Instruction { system: "sys".into(), user: "usr".into() },
            response,
        }
    }

    #[test]
    fn json_requests_carry_schema_and_mime_type() {
        let req = request(ResponseFormat::Json { schema: json!({"type": "OBJECT"}) });
        let v = serde_json::to_value(build_body(&req)).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], "usr");
        assert_eq!(v["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(v["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }

    #[test]
    fn text_requests_omit_generation_config() {
        let v = serde_json::to_value(build_body(&request(ResponseFormat::Text))).unwrap();
        assert!(v.get("generationConfig").is_none());
    }

    #[test]
    fn text_parts_are_concatenated() {
        let body = r##"{"candidates":[{"content":{"parts":[{"text":"# PRD"},{"text":"\nbody"}]}}]}"##;
        assert_eq!(extract_text(body).unwrap(), "# PRD\nbody");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = extract_text(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn url_uses_model_and_trims_base() {
        let p = GeminiProvider::new(
            "gemini-2.5-pro".into(),
            "k".into(),
            Some("http://localhost:8080/v1beta/".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(p.url(), "http://localhost:8080/v1beta/models/gemini-2.5-pro:generateContent");
    }
}
