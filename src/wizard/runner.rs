use futures::try_join;

use super::{Completion, Effect, Outcome, WizardState};
use crate::generation::GenerationService;
use crate::wire::Documents;

/// Runs the generation work an [`Effect`] describes. The three document calls are
/// issued together and joined; the first failure fails the whole batch.
pub async fn perform<S: GenerationService + ?Sized>(service: &S, effect: Effect) -> Option<Completion> {
    match effect {
        Effect::None => None,
        Effect::FetchPlatform { seq, data } => {
            let result = service.get_platform_recommendation(&data).await;
            Some(Completion::Platform { seq, result })
        }
        Effect::FetchDocuments { seq, data } => {
            let result = try_join!(
                service.generate_prd(&data),
                service.generate_tickets(&data),
                service.generate_ai_prompts(&data),
            )
            .map(|(prd, tickets, prompts)| Documents { prd, tickets, prompts });
            Some(Completion::Documents { seq, result })
        }
    }
}

/// Owns the state and the service and runs effects to completion inline.
pub struct Wizard<S> {
    state: WizardState,
    service: S,
}

impl<S: GenerationService> Wizard<S> {
    pub fn new(service: S) -> Self {
        Self { state: WizardState::new(), service }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut WizardState {
        &mut self.state
    }

    #[cfg(test)]
    pub fn service(&self) -> &S {
        &self.service
    }

    /// `None` when the effect was a no-op.
    pub async fn run(&mut self, effect: Effect) -> Option<Outcome> {
        let completion = perform(&self.service, effect).await?;
        Some(self.state.apply(completion))
    }

    pub async fn request_platform_recommendation(&mut self) -> Option<Outcome> {
        let effect = self.state.request_platform_recommendation();
        self.run(effect).await
    }

    pub async fn request_document_generation(&mut self) -> Option<Outcome> {
        let effect = self.state.request_document_generation();
        self.run(effect).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::fake::{prd_for, FakeGeneration};
    use crate::wire::{ProductPatch, Stage};
    use crate::wizard::{Step, DOCUMENTS_FAILED, PLATFORM_REQUIRED};

    fn filled(fake: FakeGeneration) -> Wizard<FakeGeneration> {
        let mut w = Wizard::new(fake);
        w.state_mut().update_field(ProductPatch {
            project_name: Some("Cosmic Canvas".into()),
            description: Some("AI art prompts".into()),
            target_audience: Some("Digital artists".into()),
            problem_to_solve: Some("Creative block".into()),
            features: Some("As a user, I can log in.\nAs a user, I can log out.".into()),
        });
        w.state_mut().advance();
        w.state_mut().advance();
        w
    }

    #[tokio::test]
    async fn full_flow_reaches_results_with_documents() {
        let mut w = filled(FakeGeneration::ok());
        assert_eq!(w.request_platform_recommendation().await, Some(Outcome::Committed));
        assert_eq!(w.state().current_step(), Step::Platform);
        w.state_mut().advance();

        assert_eq!(w.request_document_generation().await, Some(Outcome::Committed));
        let docs = w.state().content().documents.clone().unwrap();
        assert_eq!(docs.tickets.len(), 2);
        assert_eq!(docs.prompts.len(), 2);
        assert!(docs.prd.starts_with("# Cosmic Canvas"));
        assert!(!w.state().is_loading());
    }

    #[tokio::test]
    async fn documents_without_platform_never_reach_the_service() {
        let mut w = filled(FakeGeneration::ok());
        for _ in 0..2 {
            w.state_mut().advance();
        }
        assert_eq!(w.request_document_generation().await, None);
        assert!(w.service().calls().is_empty());
        assert_eq!(w.state().error(), Some(PLATFORM_REQUIRED));
    }

    #[tokio::test]
    async fn any_single_failure_keeps_previous_documents() {
        for failing in [Stage::Prd, Stage::Tickets, Stage::Prompts] {
            let mut w = filled(FakeGeneration::ok());
            w.request_platform_recommendation().await;
            w.request_document_generation().await;
            let before = w.state().content().documents.clone();
            assert!(before.is_some(), "{failing:?}");

            let mut w = Wizard { state: w.state().clone(), service: FakeGeneration::failing(&[failing]) };
            assert_eq!(w.request_document_generation().await, Some(Outcome::Failed), "{failing:?}");
            assert_eq!(w.state().content().documents, before, "{failing:?}");
            assert_eq!(w.state().error(), Some(DOCUMENTS_FAILED));
            assert!(!w.state().is_loading());
        }
    }

    #[tokio::test]
    async fn first_generation_failure_leaves_no_documents() {
        let mut w = filled(FakeGeneration::failing(&[Stage::Prompts]));
        assert_eq!(w.request_platform_recommendation().await, Some(Outcome::Committed));
        assert_eq!(w.request_document_generation().await, Some(Outcome::Failed));
        assert!(w.state().content().documents.is_none());
        assert!(w.state().content().platform.is_some());
    }

    #[tokio::test]
    async fn failed_regeneration_does_not_replace_good_documents() {
        let mut w = filled(FakeGeneration::ok());
        w.request_platform_recommendation().await;
        w.request_document_generation().await;
        let good = w.state().content().documents.clone();
        assert!(good.is_some());

        // Swap in a service whose ticket call fails, keeping the state.
        let state = w.state().clone();
        let mut w = Wizard { state, service: FakeGeneration::failing(&[Stage::Tickets]) };
        assert_eq!(w.request_document_generation().await, Some(Outcome::Failed));
        assert_eq!(w.state().content().documents, good);
    }

    #[tokio::test]
    async fn document_calls_receive_platform_and_raw_features() {
        let mut w = filled(FakeGeneration::ok());
        w.request_platform_recommendation().await;
        w.request_document_generation().await;

        let payloads = w.service().document_payloads();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].platform, "Web Application");
        assert_eq!(payloads[0].product.features, "As a user, I can log in.\nAs a user, I can log out.");
        assert_eq!(w.state().content().documents.as_ref().unwrap().prd, prd_for(&payloads[0]));
    }

    #[tokio::test]
    async fn platform_failure_stays_on_features() {
        let mut w = filled(FakeGeneration::failing(&[Stage::Platform]));
        assert_eq!(w.request_platform_recommendation().await, Some(Outcome::Failed));
        assert_eq!(w.state().current_step(), Step::Features);
        assert!(w.state().content().platform.is_none());
        assert_eq!(w.service().platform_payloads()[0].project_name, "Cosmic Canvas");
    }
}
