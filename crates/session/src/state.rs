use colorbook_common::Credential;
use serde::Serialize;

/// Everything the user works with once a credential has been accepted
#[derive(Debug, Clone, PartialEq)]
pub struct Workspace {
    pub credential: Credential,
    pub topic: Option<String>,
    pub ideas: Vec<String>,
    /// Index into `ideas`
    pub selected: Option<usize>,
}

impl Workspace {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            topic: None,
            ideas: Vec::new(),
            selected: None,
        }
    }

    pub fn selected_idea(&self) -> Option<&str> {
        self.selected
            .and_then(|index| self.ideas.get(index))
            .map(String::as_str)
    }

    /// Replace the idea list and select its first entry
    pub fn replace_ideas(&mut self, topic: String, ideas: Vec<String>) {
        self.selected = if ideas.is_empty() { None } else { Some(0) };
        self.topic = Some(topic);
        self.ideas = ideas;
    }
}

/// Session state; lives until the process exits, there is no logout
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(Workspace),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        match self {
            SessionState::Authenticated(workspace) => Some(workspace),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.workspace().map(|workspace| &workspace.credential)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

/// Message shown to the user for a single action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}
