use thiserror::Error;
use serde::Serialize;

/// Common error type for Colorbook with clear taxonomy
#[derive(Error, Debug)]
pub enum Error {
    /// User input errors (4xx)
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// External service errors (5xx)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),

    #[error("Upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Local errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// IO and serialization errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic anyhow error for flexibility
    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Get HTTP status code for the error
    pub fn status_code(&self) -> u16 {
        match self {
            // 4xx Client Errors
            Error::ValidationFailed(_) => 400,
            Error::InvalidCredential => 401,
            Error::NotAuthenticated => 401,
            Error::RateLimitExceeded(_) => 429,

            // 5xx Upstream Errors
            Error::ServiceUnavailable(_) => 503,
            Error::Timeout(_) => 504,
            Error::Upstream { .. } => 502,
            Error::MalformedResponse(_) => 502,

            // Internal Errors
            Error::Storage(_) => 500,
            Error::ConfigError(_) => 500,
            Error::Internal(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::Anyhow(_) => 500,
        }
    }

    /// Get error type for metrics/logging
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::ValidationFailed(_) => "validation_failed",
            Error::InvalidCredential => "invalid_credential",
            Error::NotAuthenticated => "not_authenticated",
            Error::RateLimitExceeded(_) => "rate_limit",
            Error::ServiceUnavailable(_) => "service_unavailable",
            Error::Timeout(_) => "timeout",
            Error::Upstream { .. } => "upstream_error",
            Error::MalformedResponse(_) => "malformed_response",
            Error::Storage(_) => "storage_error",
            Error::ConfigError(_) => "config_error",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Anyhow(_) => "unknown",
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::InvalidCredential |
            Error::RateLimitExceeded(_) |
            Error::ServiceUnavailable(_) |
            Error::Timeout(_)
        ) || matches!(self, Error::Upstream { status, .. } if *status >= 500)
    }
}

/// Error response for HTTP API
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: u16,
}

impl From<&Error> for ErrorResponse {
    fn from(err: &Error) -> Self {
        ErrorResponse {
            error: ErrorDetail {
                message: err.to_string(),
                r#type: err.error_type().to_string(),
                code: err.status_code(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
