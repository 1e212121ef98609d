//! Completion errors

use std::time::Duration;
use thiserror::Error;

/// Why a completion call failed
///
/// The orchestrator reports every variant to the host as the capability being
/// unavailable; the distinction only matters for retries inside the client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Missing API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("Unknown LLM provider '{0}' (supported: openai)")]
    UnsupportedProvider(String),
}

impl LlmError {
    /// Transient failures the client retries with backoff
    ///
    /// Rate limits are not among them: the provider names its own delay,
    /// which is usually longer than a conversation turn should wait.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::ApiError { status, .. } => matches!(status, 408 | 500 | 502 | 503 | 504),
            LlmError::Network(_) | LlmError::Timeout(_) => true,
            LlmError::RateLimited { .. }
            | LlmError::InvalidResponse(_)
            | LlmError::MissingApiKey(_)
            | LlmError::UnsupportedProvider(_) => false,
        }
    }
}
