mod gate;
mod generator;
mod openai_adapter;
pub mod prompt_engine;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;


pub use gate::CredentialGate;
pub use generator::{GenerationClient, ModelSettings};
pub use openai_adapter::{OpenAiAdapter, OpenAiConnector};
pub use prompt_engine::PromptEngine;
#[cfg(any(test, feature = "testing"))]
pub use scripted::{RecordedCall, ScriptedBackend, ScriptedConnector, ScriptedFailure};

use async_trait::async_trait;
use colorbook_common::{Credential, ImageRequest, Message, Result};
use std::sync::Arc;

/// Trait for hosted generative service implementations
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Cheap read-only call, used to check a credential
    async fn list_models(&self) -> Result<Vec<String>>;

    /// One chat completion; returns the assistant text
    async fn complete_chat(&self, model: &str, messages: Vec<Message>) -> Result<String>;

    /// One image generation; returns the remote image URL
    async fn create_image(&self, request: ImageRequest) -> Result<String>;
}

/// Builds a backend bound to a credential
pub trait BackendConnector: Send + Sync {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn GenerativeBackend>>;
}
