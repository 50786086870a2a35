use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// ========================================
/// Product data and generated artifacts
/// ========================================

/// What the user typed into the first three wizard stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub problem_to_solve: String,
    /// Newline-delimited features / user stories, kept exactly as entered.
    #[serde(default)]
    pub features: String,
}

/// A partial edit of [`ProductData`]; `None` fields are left untouched on merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub project_name: Option<String>,
    pub description: Option<String>,
    pub target_audience: Option<String>,
    pub problem_to_solve: Option<String>,
    pub features: Option<String>,
}

impl ProductData {
    pub fn merge(&mut self, patch: ProductPatch) {
        if let Some(v) = patch.project_name {
            self.project_name = v;
        }
        if let Some(v) = patch.description {
            self.description = v;
        }
        if let Some(v) = patch.target_audience {
            self.target_audience = v;
        }
        if let Some(v) = patch.problem_to_solve {
            self.problem_to_solve = v;
        }
        if let Some(v) = patch.features {
            self.features = v;
        }
    }
}

impl From<ProductData> for ProductPatch {
    fn from(d: ProductData) -> Self {
        Self {
            project_name: Some(d.project_name),
            description: Some(d.description),
            target_audience: Some(d.target_audience),
            problem_to_solve: Some(d.problem_to_solve),
            features: Some(d.features),
        }
    }
}

/// Product data plus the platform the documents should target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullProductData {
    #[serde(flatten)]
    pub product: ProductData,
    pub platform: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRecommendation {
    pub platform: String,
    pub justification: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub title: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPrompt {
    pub ticket_title: String,
    pub generation_prompt: String,
}

/// PRD, tickets and prompts are fetched together and always set together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Documents {
    pub prd: String,
    pub tickets: Vec<Ticket>,
    pub prompts: Vec<AiPrompt>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub platform: Option<PlatformRecommendation>,
    #[serde(flatten)]
    pub documents: Option<Documents>,
}

/// ========================================
/// Request/Response wire protocol
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Platform,
    Prd,
    Tickets,
    Prompts,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Platform => "platform",
            Stage::Prd => "prd",
            Stage::Tickets => "tickets",
            Stage::Prompts => "prompts",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instruction {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Free-form text (markdown for the PRD).
    Text,
    /// JSON constrained by a Gemini-style response schema.
    Json { schema: Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub stage: Stage,
    pub instruction: Instruction,
    pub response: ResponseFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub model: String,
    pub text: String,
}
