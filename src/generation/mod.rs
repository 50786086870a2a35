//! The boundary between the wizard and the hosted model.
//!
//! [`GenerationService`] is the four-operation capability the wizard depends on.
//! [`GenerationClient`] implements it over any [`Provider`]: it builds the prompt for
//! each operation, sends it, records the exchange when asked to, and parses the model
//! text into typed values. Every failure collapses into one
//! [`BlueprintError::Generation`] per call.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::BlueprintError;
use crate::log::ArtifactRecorder;
use crate::prompt;
use crate::provider::DynProvider;
use crate::wire::{
    AiPrompt, FullProductData, Instruction, LlmRequest, PlatformRecommendation, ProductData,
    ResponseFormat, Stage, Ticket,
};

#[cfg(test)]
pub mod fake;

pub type GenerationResult<T> = std::result::Result<T, BlueprintError>;

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn get_platform_recommendation(&self, data: &ProductData) -> GenerationResult<PlatformRecommendation>;
    async fn generate_prd(&self, data: &FullProductData) -> GenerationResult<String>;
    async fn generate_tickets(&self, data: &FullProductData) -> GenerationResult<Vec<Ticket>>;
    async fn generate_ai_prompts(&self, data: &FullProductData) -> GenerationResult<Vec<AiPrompt>>;
}

pub struct GenerationClient {
    provider: DynProvider,
    recorder: Option<ArtifactRecorder>,
}

impl GenerationClient {
    pub fn new(provider: DynProvider, recorder: Option<ArtifactRecorder>) -> Self {
        Self { provider, recorder }
    }

    async fn complete(&self, stage: Stage, instruction: Instruction, response: ResponseFormat) -> Result<String> {
        let req = LlmRequest { id: Uuid::new_v4(), timestamp: Utc::now(), stage, instruction, response };
        let result = self.provider.send(&req).await;

        if let Some(rec) = &self.recorder {
            // Recording is best-effort; a full disk must not fail the generation.
            match rec.save_stage(stage, &req, result.as_ref().ok()) {
                Ok(saved) => debug!(
                    stage = stage.as_str(),
                    dir = %saved.dir.display(),
                    request = saved.request.is_some(),
                    response = saved.response.is_some(),
                    "exchange saved"
                ),
                Err(e) => warn!(stage = stage.as_str(), error = %e, "could not save exchange artifacts"),
            }
        }

        let resp = result?;
        debug!(stage = stage.as_str(), model = %resp.model, chars = resp.text.len(), "generation completed");
        Ok(resp.text)
    }

    async fn complete_json<T: DeserializeOwned>(&self, stage: Stage, instruction: Instruction, schema: serde_json::Value) -> Result<T> {
        let text = self.complete(stage, instruction, ResponseFormat::Json { schema }).await?;
        parse_json_payload(&text)
    }
}

#[async_trait]
impl GenerationService for GenerationClient {
    async fn get_platform_recommendation(&self, data: &ProductData) -> GenerationResult<PlatformRecommendation> {
        let instruction = Instruction {
            system: prompt::system_prompt_platform(),
            user: prompt::user_prompt_platform(data),
        };
        self.complete_json(Stage::Platform, instruction, prompt::platform_schema())
            .await
            .map_err(|e| BlueprintError::generation("platform recommendation", &e))
    }

    async fn generate_prd(&self, data: &FullProductData) -> GenerationResult<String> {
        let instruction = Instruction {
            system: prompt::system_prompt_prd(),
            user: prompt::user_prompt_prd(data),
        };
        self.complete(Stage::Prd, instruction, ResponseFormat::Text)
            .await
            .map_err(|e| BlueprintError::generation("PRD", &e))
    }

    async fn generate_tickets(&self, data: &FullProductData) -> GenerationResult<Vec<Ticket>> {
        let instruction = Instruction {
            system: prompt::system_prompt_tickets(),
            user: prompt::user_prompt_tickets(data),
        };
        self.complete_json(Stage::Tickets, instruction, prompt::tickets_schema())
            .await
            .map_err(|e| BlueprintError::generation("tickets", &e))
    }

    async fn generate_ai_prompts(&self, data: &FullProductData) -> GenerationResult<Vec<AiPrompt>> {
        let instruction = Instruction {
            system: prompt::system_prompt_ai_prompts(),
            user: prompt::user_prompt_ai_prompts(data),
        };
        self.complete_json(Stage::Prompts, instruction, prompt::ai_prompts_schema())
            .await
            .map_err(|e| BlueprintError::generation("AI prompts", &e))
    }
}

/// Strict parse first, then without a markdown code fence, then each balanced JSON
/// value found in the text, in order, until one deserializes as `T`.
pub fn parse_json_payload<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();
    let first_err = match serde_json::from_str::<T>(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    let unfenced = strip_code_fence(trimmed);
    if unfenced != trimmed {
        if let Ok(v) = serde_json::from_str::<T>(unfenced) {
            return Ok(v);
        }
    }

    for (start, _) in unfenced.match_indices(|c: char| c == '{' || c == '[') {
        let Some(candidate) = balanced_json_at(unfenced, start) else { continue };
        if let Ok(v) = serde_json::from_str::<T>(candidate) {
            return Ok(v);
        }
    }

    Err(anyhow!(BlueprintError::Schema(format!("{first_err}; content was:\n{trimmed}"))))
}

fn strip_code_fence(s: &str) -> &str {
    let Some(rest) = s.strip_prefix("```") else { return s };
    // Drop the info string (e.g. `json`) on the opening fence line.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Returns the balanced `{...}` or `[...]` slice opening at byte `start`, honouring
/// string literals so braces inside strings do not unbalance the scan.
fn balanced_json_at(s: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&s[start..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
