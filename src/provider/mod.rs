use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::wire::{LlmRequest, LlmResponse};

pub mod gemini;
pub mod openai;

/// One text completion against a hosted model. Implementations return the raw model
/// text; turning it into typed values is the generation client's job.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn send(&self, req: &LlmRequest) -> Result<LlmResponse>;
}

pub type DynProvider = Box<dyn Provider + Send + Sync>;

pub fn make_provider(cfg: &Config) -> Result<DynProvider> {
    let api_key = cfg.api_key()?;
    let timeout = Duration::from_secs(cfg.timeout_secs);
    match cfg.provider {
        ProviderKind::Gemini => Ok(Box::new(gemini::GeminiProvider::new(
            cfg.model.clone(),
            api_key,
            cfg.api_base.clone(),
            timeout,
        )?)),
        ProviderKind::OpenAI => Ok(Box::new(openai::OpenAIProvider::new(
            cfg.model.clone(),
            api_key,
            cfg.api_base.clone(),
            timeout,
        )?)),
    }
}
