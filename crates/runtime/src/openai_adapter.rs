use crate::{BackendConnector, GenerativeBackend};
use async_trait::async_trait;
use colorbook_common::{Credential, Error, ImageRequest, Message, Result};
use colorbook_config::OpenAiConfig;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const MAX_ERROR_BODY_CHARS: usize = 300;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct ImageGenerationRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Adapter for the OpenAI REST API
pub struct OpenAiAdapter {
    client: Client,
    base_url: String,
    credential: Credential,
    timeout_secs: u64,
}

impl OpenAiAdapter {
    pub fn new(config: &OpenAiConfig, credential: Credential) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
            timeout_secs: config.request_timeout_secs,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .bearer_auth(self.credential.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), &body));
        }

        response.json::<T>().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout_secs)
            } else {
                Error::MalformedResponse(e.to_string())
            }
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout_secs)
        } else {
            Error::ServiceUnavailable(e.to_string())
        }
    }
}

/// Map a non-2xx answer to the error taxonomy
fn status_error(status: u16, body: &str) -> Error {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.chars().take(MAX_ERROR_BODY_CHARS).collect());

    match status {
        401 => Error::InvalidCredential,
        429 => Error::RateLimitExceeded(message),
        _ => Error::Upstream { status, message },
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiAdapter {
    async fn list_models(&self) -> Result<Vec<String>> {
        let list: ModelList = self.send(self.client.get(self.url("models"))).await?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    async fn complete_chat(&self, model: &str, messages: Vec<Message>) -> Result<String> {
        debug!(model, messages = messages.len(), "Requesting chat completion");

        let body = ChatCompletionRequest {
            model,
            messages: &messages,
        };
        let response: ChatCompletionResponse = self
            .send(self.client.post(self.url("chat/completions")).json(&body))
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| Error::MalformedResponse("completion has no message content".into()))
    }

    async fn create_image(&self, request: ImageRequest) -> Result<String> {
        debug!(model = %request.model, size = %request.size, "Requesting image");

        let body = ImageGenerationRequest {
            model: &request.model,
            prompt: &request.prompt,
            n: 1,
            size: &request.size,
            quality: &request.quality,
        };
        let response: ImageGenerationResponse = self
            .send(self.client.post(self.url("images/generations")).json(&body))
            .await?;

        response
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .ok_or_else(|| Error::MalformedResponse("image response has no url".into()))
    }
}

/// Connector producing one `OpenAiAdapter` per accepted credential
pub struct OpenAiConnector {
    config: OpenAiConfig,
}

impl OpenAiConnector {
    pub fn new(config: OpenAiConfig) -> Self {
        Self { config }
    }
}

impl BackendConnector for OpenAiConnector {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn GenerativeBackend>> {
        let adapter = OpenAiAdapter::new(&self.config, credential.clone())?;
        Ok(Arc::new(adapter))
    }
}
