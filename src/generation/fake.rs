//! Deterministic stand-in for the hosted model, for tests.

use async_trait::async_trait;
use std::sync::Mutex;

use super::{GenerationResult, GenerationService};
use crate::errors::BlueprintError;
use crate::wire::{AiPrompt, FullProductData, PlatformRecommendation, ProductData, Stage, Ticket};

pub struct FakeGeneration {
    failing: Vec<Stage>,
    calls: Mutex<Vec<Stage>>,
    document_payloads: Mutex<Vec<FullProductData>>,
    platform_payloads: Mutex<Vec<ProductData>>,
}

impl FakeGeneration {
    pub fn ok() -> Self {
        Self::failing(&[])
    }

    pub fn failing(stages: &[Stage]) -> Self {
        Self {
            failing: stages.to_vec(),
            calls: Mutex::new(Vec::new()),
            document_payloads: Mutex::new(Vec::new()),
            platform_payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Stage> {
        self.calls.lock().unwrap().clone()
    }

    pub fn document_payloads(&self) -> Vec<FullProductData> {
        self.document_payloads.lock().unwrap().clone()
    }

    pub fn platform_payloads(&self) -> Vec<ProductData> {
        self.platform_payloads.lock().unwrap().clone()
    }

    fn record(&self, stage: Stage) -> GenerationResult<()> {
        self.calls.lock().unwrap().push(stage);
        if self.failing.contains(&stage) {
            return Err(BlueprintError::Generation {
                operation: stage.as_str(),
                cause: "fake failure".into(),
            });
        }
        Ok(())
    }
}

pub fn recommendation() -> PlatformRecommendation {
    PlatformRecommendation {
        platform: "Web Application".into(),
        justification: "Reaches every artist without an install.".into(),
    }
}

pub fn prd_for(data: &FullProductData) -> String {
    format!("# {}\n\nTarget platform: **{}**.", data.product.project_name, data.platform)
}

#[async_trait]
impl GenerationService for FakeGeneration {
    async fn get_platform_recommendation(&self, data: &ProductData) -> GenerationResult<PlatformRecommendation> {
        self.platform_payloads.lock().unwrap().push(data.clone());
        self.record(Stage::Platform)?;
        Ok(recommendation())
    }

    async fn generate_prd(&self, data: &FullProductData) -> GenerationResult<String> {
        self.document_payloads.lock().unwrap().push(data.clone());
        self.record(Stage::Prd)?;
        Ok(prd_for(data))
    }

    async fn generate_tickets(&self, data: &FullProductData) -> GenerationResult<Vec<Ticket>> {
        self.record(Stage::Tickets)?;
        Ok(data
            .product
            .features
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|f| Ticket {
                title: f.to_string(),
                description: format!("Implement: {f}"),
                acceptance_criteria: vec![format!("Given the app, when used, then {f}")],
            })
            .collect())
    }

    async fn generate_ai_prompts(&self, data: &FullProductData) -> GenerationResult<Vec<AiPrompt>> {
        self.record(Stage::Prompts)?;
        Ok(data
            .product
            .features
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(|f| AiPrompt {
                ticket_title: f.to_string(),
                generation_prompt: format!("You are an expert frontend developer. Build: {f}"),
            })
            .collect())
    }
}
