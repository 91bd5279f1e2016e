use crate::{GenerativeBackend, PromptEngine};
use colorbook_common::{validate_topic, Error, ImageRequest, ObservableMetrics, Result, UpstreamCall};
use colorbook_config::{OpenAiConfig, PromptSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Fixed model parameters for both generation calls
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    pub image_quality: String,
}

impl From<&OpenAiConfig> for ModelSettings {
    fn from(config: &OpenAiConfig) -> Self {
        Self {
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
            image_quality: config.image_quality.clone(),
        }
    }
}

/// Idea and image generation on top of a connected backend
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerativeBackend>,
    prompts: PromptSet,
    settings: ModelSettings,
    metrics: Option<Arc<ObservableMetrics>>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerativeBackend>, prompts: PromptSet, settings: ModelSettings) -> Self {
        Self {
            backend,
            prompts,
            settings,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<ObservableMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// One completion request; the answer is split into ideas, one per line
    pub async fn generate_ideas(&self, topic: &str) -> Result<Vec<String>> {
        let topic = validate_topic(topic)?;
        let messages = PromptEngine::ideas_messages(&self.prompts, &topic);

        let started = Instant::now();
        let result = self.backend.complete_chat(&self.settings.text_model, messages).await;
        self.observe(UpstreamCall::ChatCompletion, started, result.is_ok()).await;

        let ideas = PromptEngine::parse_ideas(&result?)?;
        info!(topic = %topic, count = ideas.len(), "Generated ideas");
        Ok(ideas)
    }

    /// `count` sequential image requests for the same idea; returns the URLs in order
    pub async fn generate_images(&self, idea: &str, count: usize) -> Result<Vec<String>> {
        if idea.trim().is_empty() {
            return Err(Error::ValidationFailed("Idea cannot be empty".into()));
        }

        let prompt = PromptEngine::image_prompt(&self.prompts, idea);
        let mut urls = Vec::with_capacity(count);

        for attempt in 0..count {
            let request = ImageRequest {
                model: self.settings.image_model.clone(),
                prompt: prompt.clone(),
                size: self.settings.image_size.clone(),
                quality: self.settings.image_quality.clone(),
            };

            let started = Instant::now();
            let result = self.backend.create_image(request).await;
            self.observe(UpstreamCall::ImageGeneration, started, result.is_ok()).await;

            urls.push(result?);
            debug!(attempt = attempt + 1, count, "Image generated");
        }

        info!(idea, count = urls.len(), "Generated coloring images");
        Ok(urls)
    }

    async fn observe(&self, call: UpstreamCall, started: Instant, ok: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_upstream(call, started.elapsed(), ok).await;
        }
    }
}
