//! The five-stage product wizard.
//!
//! [`WizardState`] is an owned value; every user intent is a method on it. Intents
//! that need the model return an [`Effect`] describing the work instead of doing it,
//! and the caller feeds the outcome back through [`WizardState::apply`]. Each effect
//! carries a sequence number, so a completion that arrives after `start_over` or after
//! a newer request of the same kind is dropped instead of overwriting newer state.

use tracing::{debug, error, info};

use crate::generation::GenerationResult;
use crate::wire::{Documents, FullProductData, GeneratedContent, PlatformRecommendation, ProductData, ProductPatch};

pub mod runner;

pub const PLATFORM_FAILED: &str = "Failed to generate platform recommendation. Please try again.";
pub const DOCUMENTS_FAILED: &str = "Failed to generate documents. Please try again.";
pub const PLATFORM_REQUIRED: &str = "Platform recommendation must be available to generate documents.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Idea = 1,
    Audience = 2,
    Features = 3,
    Platform = 4,
    Results = 5,
}

impl Step {
    pub const ALL: [Step; 5] = [Step::Idea, Step::Audience, Step::Features, Step::Platform, Step::Results];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Step> {
        Step::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Idea => "Project Idea",
            Step::Audience => "Audience & Problem",
            Step::Features => "Core Features",
            Step::Platform => "Platform",
            Step::Results => "Results",
        }
    }

    fn next(self) -> Option<Step> {
        Step::from_number(self.number() + 1)
    }

    fn prev(self) -> Option<Step> {
        Step::from_number(self.number() - 1)
    }
}

/// Generation work a transition asks the caller to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    None,
    FetchPlatform { seq: u64, data: ProductData },
    FetchDocuments { seq: u64, data: FullProductData },
}

#[derive(Debug)]
pub enum Completion {
    Platform { seq: u64, result: GenerationResult<PlatformRecommendation> },
    Documents { seq: u64, result: GenerationResult<Documents> },
}

/// What [`WizardState::apply`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Committed,
    Failed,
    Stale,
}

#[derive(Debug, Clone)]
pub struct WizardState {
    current_step: Step,
    product: ProductData,
    content: GeneratedContent,
    is_loading: bool,
    error: Option<String>,
    last_seq: u64,
    platform_seq: Option<u64>,
    documents_seq: Option<u64>,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardState {
    pub fn new() -> Self {
        Self {
            current_step: Step::Idea,
            product: ProductData::default(),
            content: GeneratedContent::default(),
            is_loading: false,
            error: None,
            last_seq: 0,
            platform_seq: None,
            documents_seq: None,
        }
    }

    pub fn current_step(&self) -> Step {
        self.current_step
    }

    pub fn product(&self) -> &ProductData {
        &self.product
    }

    pub fn content(&self) -> &GeneratedContent {
        &self.content
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn advance(&mut self) {
        if let Some(next) = self.current_step.next() {
            self.current_step = next;
        }
    }

    pub fn retreat(&mut self) {
        if let Some(prev) = self.current_step.prev() {
            self.current_step = prev;
        }
    }

    /// Only earlier stages can be revisited directly; later ones are reached in order.
    pub fn jump_to(&mut self, step: Step) {
        if step < self.current_step {
            self.current_step = step;
        }
    }

    pub fn update_field(&mut self, patch: ProductPatch) {
        self.product.merge(patch);
    }

    pub fn request_platform_recommendation(&mut self) -> Effect {
        if self.is_loading {
            return Effect::None;
        }
        self.is_loading = true;
        self.error = None;
        // Old documents describe the old platform; the platform itself stays visible until replaced.
        self.content.documents = None;

        let seq = self.issue();
        self.platform_seq = Some(seq);
        debug!(seq, "platform recommendation requested");
        Effect::FetchPlatform { seq, data: self.product.clone() }
    }

    pub fn request_document_generation(&mut self) -> Effect {
        let Some(platform) = &self.content.platform else {
            self.error = Some(PLATFORM_REQUIRED.to_string());
            return Effect::None;
        };
        if self.is_loading {
            return Effect::None;
        }
        let data = FullProductData { product: self.product.clone(), platform: platform.platform.clone() };
        self.is_loading = true;
        self.error = None;

        let seq = self.issue();
        self.documents_seq = Some(seq);
        debug!(seq, platform = %data.platform, "document generation requested");
        Effect::FetchDocuments { seq, data }
    }

    /// Back to an empty stage one. Anything still in flight is orphaned.
    pub fn start_over(&mut self) {
        let last_seq = self.last_seq;
        *self = Self { last_seq, ..Self::new() };
        info!("wizard reset");
    }

    pub fn apply(&mut self, completion: Completion) -> Outcome {
        match completion {
            Completion::Platform { seq, result } => {
                if self.platform_seq != Some(seq) {
                    debug!(seq, "discarding stale platform recommendation");
                    return Outcome::Stale;
                }
                self.platform_seq = None;
                self.is_loading = false;
                match result {
                    Ok(rec) => {
                        info!(platform = %rec.platform, "platform recommendation received");
                        self.content.platform = Some(rec);
                        self.advance();
                        Outcome::Committed
                    }
                    Err(e) => {
                        error!(error = %e, "platform recommendation failed");
                        self.error = Some(PLATFORM_FAILED.to_string());
                        Outcome::Failed
                    }
                }
            }
            Completion::Documents { seq, result } => {
                if self.documents_seq != Some(seq) {
                    debug!(seq, "discarding stale documents");
                    return Outcome::Stale;
                }
                self.documents_seq = None;
                self.is_loading = false;
                match result {
                    Ok(docs) => {
                        info!(tickets = docs.tickets.len(), prompts = docs.prompts.len(), "documents received");
                        self.content.documents = Some(docs);
                        Outcome::Committed
                    }
                    Err(e) => {
                        error!(error = %e, "document generation failed");
                        self.error = Some(DOCUMENTS_FAILED.to_string());
                        Outcome::Failed
                    }
                }
            }
        }
    }

    fn issue(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }
}
