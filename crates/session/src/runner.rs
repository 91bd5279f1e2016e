use crate::machine::{handle, Effect, Event};
use crate::state::{Notice, SessionState};
use colorbook_common::{
    ActionKind, Credential, Error, ErrorCategory, GeneratedImage, ObservableMetrics, Result,
};
use colorbook_config::PromptSet;
use colorbook_runtime::{CredentialGate, GenerationClient, ModelSettings};
use colorbook_store::IdeaStore;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// What a dispatched action produced for the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub images: Vec<GeneratedImage>,
}

/// Owns the session state and executes the effects `handle` asks for
pub struct Session {
    state: SessionState,
    gate: CredentialGate,
    client: Option<GenerationClient>,
    store: Arc<dyn IdeaStore>,
    prompts: PromptSet,
    settings: ModelSettings,
    images_per_idea: usize,
    metrics: Arc<ObservableMetrics>,
}

impl Session {
    pub fn new(
        gate: CredentialGate,
        store: Arc<dyn IdeaStore>,
        prompts: PromptSet,
        settings: ModelSettings,
        metrics: Arc<ObservableMetrics>,
    ) -> Self {
        Self {
            state: SessionState::Unauthenticated,
            gate,
            client: None,
            store,
            prompts,
            settings,
            images_per_idea: 1,
            metrics,
        }
    }

    pub fn with_images_per_idea(mut self, count: usize) -> Self {
        self.images_per_idea = count;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }

    /// Feed one user event and run every resulting effect until the queue drains
    pub async fn dispatch(&mut self, event: Event) -> Outcome {
        let kind = event.action_kind();
        let request_id = match kind {
            Some(kind) => Some(self.metrics.start_action(kind).await),
            None => None,
        };
        let span = info_span!(
            "action",
            kind = ?kind,
            request_id = request_id.as_ref().map(|id| id.as_str()).unwrap_or("-")
        );

        self.run(event).instrument(span).await
    }

    async fn run(&mut self, event: Event) -> Outcome {
        let mut outcome = Outcome::default();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (next, effects) = handle(event, state);
            self.state = next;

            for effect in effects {
                if let Some(feedback) = self.execute(effect, &mut outcome).await {
                    queue.push_back(feedback);
                }
            }
        }

        outcome
    }

    async fn execute(&mut self, effect: Effect, outcome: &mut Outcome) -> Option<Event> {
        match effect {
            Effect::Notify(notice) => {
                outcome.notices.push(notice);
                None
            }
            Effect::ShowImages(images) => {
                outcome.images.extend(images);
                None
            }
            Effect::ValidateCredential(credential) => Some(self.validate(credential).await),
            Effect::GenerateIdeas { topic } => {
                let result = match self.client() {
                    Ok(client) => client.generate_ideas(&topic).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(ideas) => {
                        self.metrics.record_ideas(ideas.len()).await;
                        Some(Event::IdeasReady { topic, ideas })
                    }
                    Err(e) => Some(self.failed(ActionKind::ShowIdeas, "Nie udało się wygenerować pomysłów", e).await),
                }
            }
            Effect::SaveIdeas { topic, ideas } => match self.store.save(&topic, &ideas).await {
                Ok(()) => Some(Event::IdeasSaved { topic, count: ideas.len() }),
                Err(e) => Some(self.failed(ActionKind::ShowIdeas, "Nie udało się zapisać pomysłów", e).await),
            },
            Effect::LoadSaved { topic } => match self.store.get(&topic).await {
                Ok(ideas) => Some(Event::IdeasRecalled { topic, ideas }),
                Err(e) => Some(
                    self.failed(ActionKind::RecallIdeas, "Nie udało się wczytać zapisanych pomysłów", e)
                        .await,
                ),
            },
            Effect::GenerateImages { idea } => {
                let result = match self.client() {
                    Ok(client) => client.generate_images(&idea, self.images_per_idea).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(urls) => {
                        self.metrics.record_images(urls.len()).await;
                        Some(Event::ColoringReady { idea, urls })
                    }
                    Err(e) => Some(
                        self.failed(ActionKind::GenerateColoring, "Nie udało się wygenerować kolorowanki", e)
                            .await,
                    ),
                }
            }
        }
    }

    async fn validate(&mut self, credential: Credential) -> Event {
        match self.gate.admit(&credential).await {
            Some(backend) => {
                let client = GenerationClient::new(backend, self.prompts.clone(), self.settings.clone())
                    .with_metrics(self.metrics.clone());
                self.client = Some(client);
                info!("Credential accepted");
                Event::CredentialChecked { credential, valid: true }
            }
            None => {
                self.metrics.record_error(&Error::InvalidCredential).await;
                warn!("Credential rejected");
                Event::CredentialChecked { credential, valid: false }
            }
        }
    }

    fn client(&self) -> Result<&GenerationClient> {
        self.client.as_ref().ok_or(Error::NotAuthenticated)
    }

    async fn failed(&self, action: ActionKind, context: &str, e: Error) -> Event {
        self.metrics.record_error(&e).await;
        error!(
            action = ?action,
            category = ErrorCategory::from_error(&e).as_str(),
            error_type = e.error_type(),
            retryable = e.is_retryable(),
            "{}: {}",
            context,
            e
        );
        Event::ActionFailed {
            action,
            message: format!("❌ {}: {}", context, e),
        }
    }
}
