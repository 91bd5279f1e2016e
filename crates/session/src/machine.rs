//! Pure transition function of the interaction loop.
//!
//! `handle` never performs I/O. Anything that talks to the generative
//! service or the idea file is returned as an [`Effect`]; the runner executes
//! it and reports back with one of the feedback events.

use crate::state::{Notice, SessionState, Workspace};
use colorbook_common::{ActionKind, Credential, GeneratedImage};

pub const MSG_LOGGED_IN: &str = "✅ Pomyślnie zalogowano!";
pub const MSG_INVALID_KEY: &str = "❌ Nieprawidłowy klucz API. Spróbuj ponownie.";
pub const MSG_EMPTY_KEY: &str = "🔑 Wprowadź swój klucz OpenAI.";
pub const MSG_ALREADY_LOGGED_IN: &str = "Już zalogowano.";
pub const MSG_LOGIN_FIRST: &str = "🔑 Najpierw zaloguj się kluczem OpenAI.";
pub const MSG_EMPTY_TOPIC: &str = "⚠️ Proszę wpisać temat, np. 'dinozaury', 'zima', 'samochody'...";
pub const MSG_NO_SELECTION: &str = "⚠️ Najpierw wybierz pomysł z listy!";
pub const MSG_NOTHING_SAVED: &str = "⚠️ Brak zapisanych pomysłów dla tematu:";

/// Inputs to the state machine: user actions and effect results
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    SubmitCredential(String),
    CredentialChecked { credential: Credential, valid: bool },
    ShowIdeas { topic: String },
    IdeasReady { topic: String, ideas: Vec<String> },
    IdeasSaved { topic: String, count: usize },
    RecallIdeas { topic: String },
    IdeasRecalled { topic: String, ideas: Option<Vec<String>> },
    SelectIdea(usize),
    GenerateColoring,
    ColoringReady { idea: String, urls: Vec<String> },
    ActionFailed { action: ActionKind, message: String },
}

impl Event {
    /// Action kind for events that come from the user.
    ///
    /// `SelectIdea` travels with every form submit, so it is not counted as
    /// an action of its own.
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self {
            Event::SubmitCredential(_) => Some(ActionKind::Login),
            Event::ShowIdeas { .. } => Some(ActionKind::ShowIdeas),
            Event::RecallIdeas { .. } => Some(ActionKind::RecallIdeas),
            Event::GenerateColoring => Some(ActionKind::GenerateColoring),
            _ => None,
        }
    }
}

/// I/O requested by `handle`
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ValidateCredential(Credential),
    GenerateIdeas { topic: String },
    SaveIdeas { topic: String, ideas: Vec<String> },
    LoadSaved { topic: String },
    GenerateImages { idea: String },
    Notify(Notice),
    ShowImages(Vec<GeneratedImage>),
}

fn notify(notice: Notice) -> Vec<Effect> {
    vec![Effect::Notify(notice)]
}

pub fn handle(event: Event, state: SessionState) -> (SessionState, Vec<Effect>) {
    match state {
        SessionState::Unauthenticated => handle_unauthenticated(event),
        SessionState::Authenticated(workspace) => handle_authenticated(event, workspace),
    }
}

fn handle_unauthenticated(event: Event) -> (SessionState, Vec<Effect>) {
    let state = SessionState::Unauthenticated;
    match event {
        Event::SubmitCredential(raw) => match Credential::parse(&raw) {
            Ok(credential) => (state, vec![Effect::ValidateCredential(credential)]),
            Err(_) if raw.trim().is_empty() => (state, notify(Notice::warning(MSG_EMPTY_KEY))),
            Err(e) => (state, notify(Notice::warning(format!("🔑 {}", e)))),
        },
        Event::CredentialChecked { credential, valid: true } => (
            SessionState::Authenticated(Workspace::new(credential)),
            notify(Notice::success(MSG_LOGGED_IN)),
        ),
        Event::CredentialChecked { valid: false, .. } => (state, notify(Notice::error(MSG_INVALID_KEY))),
        Event::ActionFailed { message, .. } => (state, notify(Notice::error(message))),
        _ => (state, notify(Notice::warning(MSG_LOGIN_FIRST))),
    }
}

fn handle_authenticated(event: Event, mut workspace: Workspace) -> (SessionState, Vec<Effect>) {
    let effects = match event {
        Event::SubmitCredential(_) => notify(Notice::info(MSG_ALREADY_LOGGED_IN)),
        // a late check result never replaces the accepted credential
        Event::CredentialChecked { .. } => Vec::new(),

        Event::ShowIdeas { topic } => {
            if topic.trim().is_empty() {
                notify(Notice::warning(MSG_EMPTY_TOPIC))
            } else {
                workspace.topic = Some(topic.clone());
                vec![Effect::GenerateIdeas { topic }]
            }
        }
        Event::IdeasReady { topic, ideas } => {
            workspace.replace_ideas(topic.clone(), ideas.clone());
            vec![Effect::SaveIdeas { topic, ideas }]
        }
        Event::IdeasSaved { topic, count } => notify(Notice::success(format!(
            "✅ Wygenerowano i zapisano {} pomysłów dla tematu: {}",
            count, topic
        ))),

        Event::RecallIdeas { topic } => {
            if topic.trim().is_empty() {
                notify(Notice::warning(MSG_EMPTY_TOPIC))
            } else {
                workspace.topic = Some(topic.clone());
                vec![Effect::LoadSaved { topic }]
            }
        }
        Event::IdeasRecalled { topic, ideas: Some(ideas) } => {
            let count = ideas.len();
            workspace.replace_ideas(topic.clone(), ideas);
            notify(Notice::info(format!(
                "📂 Wczytano {} zapisanych pomysłów dla tematu: {}",
                count, topic
            )))
        }
        Event::IdeasRecalled { topic, ideas: None } => {
            notify(Notice::warning(format!("{} {}", MSG_NOTHING_SAVED, topic)))
        }

        Event::SelectIdea(index) => {
            workspace.selected = (index < workspace.ideas.len()).then_some(index);
            Vec::new()
        }

        Event::GenerateColoring => match workspace.selected_idea() {
            Some(idea) => vec![
                Effect::Notify(Notice::info(format!("🎨 Generowanie kolorowanki dla: {}", idea))),
                Effect::GenerateImages { idea: idea.to_string() },
            ],
            None => notify(Notice::warning(MSG_NO_SELECTION)),
        },
        Event::ColoringReady { idea, urls } => {
            let images = urls
                .into_iter()
                .map(|url| GeneratedImage { idea: idea.clone(), url })
                .collect();
            vec![Effect::ShowImages(images)]
        }

        Event::ActionFailed { message, .. } => notify(Notice::error(message)),
    };

    (SessionState::Authenticated(workspace), effects)
}
