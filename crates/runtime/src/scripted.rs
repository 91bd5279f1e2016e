//! Deterministic backend for tests.
//!
//! Records every call so callers can assert how many upstream requests an
//! action made.

use crate::{BackendConnector, GenerativeBackend};
use async_trait::async_trait;
use colorbook_common::{Credential, Error, ImageRequest, Message, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const DEFAULT_IDEAS_REPLY: &str = "1. Bałwan w czapce i szaliku\n\
2. Pingwin ślizgający się po lodzie\n\
3. Dzieci lepiące igloo\n\
4. Sanki pełne prezentów\n\
5. Płatek śniegu z uśmiechem";

/// A call seen by the scripted backend
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    ListModels,
    Chat { model: String, messages: Vec<Message> },
    Image(ImageRequest),
}

/// Failure the backend should produce for generation calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedFailure {
    Unavailable,
    RateLimited,
    Malformed,
}

impl ScriptedFailure {
    fn to_error(self) -> Error {
        match self {
            ScriptedFailure::Unavailable => Error::ServiceUnavailable("connection refused".into()),
            ScriptedFailure::RateLimited => Error::RateLimitExceeded("quota exceeded".into()),
            ScriptedFailure::Malformed => Error::MalformedResponse("unexpected body".into()),
        }
    }
}

pub struct ScriptedBackend {
    accepts_credential: bool,
    ideas_reply: String,
    failure: Option<ScriptedFailure>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    images_created: AtomicUsize,
}

impl ScriptedBackend {
    /// Accepts the credential and answers with five Polish winter ideas
    pub fn new() -> Self {
        Self {
            accepts_credential: true,
            ideas_reply: DEFAULT_IDEAS_REPLY.to_string(),
            failure: None,
            delay: None,
            calls: Mutex::new(Vec::new()),
            images_created: AtomicUsize::new(0),
        }
    }

    /// Fails the credential check
    pub fn rejecting() -> Self {
        Self {
            accepts_credential: false,
            ..Self::new()
        }
    }

    pub fn with_ideas_reply(mut self, reply: impl Into<String>) -> Self {
        self.ideas_reply = reply.into();
        self
    }

    /// Fail every chat and image call
    pub fn failing(mut self, failure: ScriptedFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Hold every credential check for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    /// Chat and image calls, excluding credential checks
    pub async fn generation_calls(&self) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| !matches!(call, RecordedCall::ListModels))
            .count()
    }

    async fn record(&self, call: RecordedCall) {
        self.calls.lock().await.push(call);
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn list_models(&self) -> Result<Vec<String>> {
        self.record(RecordedCall::ListModels).await;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.accepts_credential {
            Ok(vec!["gpt-4".to_string(), "dall-e-3".to_string()])
        } else {
            Err(Error::InvalidCredential)
        }
    }

    async fn complete_chat(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        self.record(RecordedCall::Chat {
            model: model.to_string(),
            messages,
        })
        .await;
        match self.failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(self.ideas_reply.clone()),
        }
    }

    async fn create_image(&self, request: ImageRequest) -> Result<String> {
        self.record(RecordedCall::Image(request)).await;
        if let Some(failure) = self.failure {
            return Err(failure.to_error());
        }
        let n = self.images_created.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("https://images.example.test/coloring-{}.png", n))
    }
}

/// Hands out the shared scripted backend for one accepted key, and a
/// rejecting backend for anything else
pub struct ScriptedConnector {
    backend: Arc<ScriptedBackend>,
    accepted_key: String,
}

impl ScriptedConnector {
    pub fn new(backend: Arc<ScriptedBackend>, accepted_key: impl Into<String>) -> Self {
        Self {
            backend,
            accepted_key: accepted_key.into(),
        }
    }
}

impl BackendConnector for ScriptedConnector {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn GenerativeBackend>> {
        let backend: Arc<dyn GenerativeBackend> = if credential.expose() == self.accepted_key {
            self.backend.clone()
        } else {
            Arc::new(ScriptedBackend::rejecting())
        };
        Ok(backend)
    }
}
