use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use crate::error::{Error, Result};

// Constants for validation
const MAX_TOPIC_CHARS: usize = 200;
const MAX_CREDENTIAL_CHARS: usize = 512;

/// Persisted topic -> ideas mapping
pub type IdeaMap = BTreeMap<String, Vec<String>>;

/// Chat message role; only the two the coloring prompts send
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Chat message with role and content
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Secret token for the generative service.
///
/// Never serialized; `Debug` and `Display` are redacted so the value cannot
/// leak through logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Build a credential from user or environment input
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::ValidationFailed("API key cannot be empty".into()));
        }
        if trimmed.chars().count() > MAX_CREDENTIAL_CHARS {
            return Err(Error::ValidationFailed("API key is too long".into()));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(Error::ValidationFailed("API key cannot contain whitespace".into()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Raw secret, only for building the authorization header
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Validate a topic typed by the user and return its trimmed form
pub fn validate_topic(raw: &str) -> Result<String> {
    let topic = raw.trim();
    if topic.is_empty() {
        return Err(Error::ValidationFailed("Topic cannot be empty".into()));
    }
    if topic.chars().count() > MAX_TOPIC_CHARS {
        return Err(Error::ValidationFailed(
            format!("Topic too long (max {} chars)", MAX_TOPIC_CHARS)
        ));
    }
    Ok(topic.to_string())
}

/// Request for one image generation call
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub size: String,
    pub quality: String,
}

/// Image produced for an idea; only the remote URL is kept
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedImage {
    pub idea: String,
    pub url: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub authenticated: bool,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Health status enum
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}
