//! Generative model transport.
//!
//! A provider takes a prompt plus sampling settings and returns the raw JSON
//! body the service answered with. It never interprets that body; all
//! payloads go through the `StructuredExtractor` in `durian-core`.
//!
//! ## Security
//!
//! Providers hold their key as an [`ApiCredential`]. See [`secrets`].

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;

use crate::config::GenerationSettings;

pub mod secrets;

#[cfg(feature = "gemini")]
mod gemini;

pub use secrets::{
    ApiCredential, CredentialSource, AIFORTHAI_API_KEY_ENV, GEMINI_API_KEY_ENV,
};

#[cfg(feature = "gemini")]
pub use gemini::GeminiProvider;

/// Transport failures. The service was unreachable or said no.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Response body is not JSON: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether retrying the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } | ProviderError::HttpError(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500,
            ProviderError::ParseError(_)
            | ProviderError::Timeout(_)
            | ProviderError::NotConfigured(_) => false,
        }
    }
}

/// One generative call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt_text: String,

    pub temperature: f32,

    pub max_output_tokens: u32,

    pub timeout: Duration,
}

impl GenerationRequest {
    pub fn new(prompt_text: impl Into<String>, settings: &GenerationSettings) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            temperature: settings.temperature,
            max_output_tokens: settings.max_output_tokens,
            timeout: settings.timeout,
        }
    }
}

/// Generative model backend.
///
/// This is the ONLY place generative calls are made. Fusion never calls
/// it; only the judge and campaign adapters do.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Send one request and return the raw response body.
    async fn generate(&self, request: &GenerationRequest) -> Result<JsonValue, ProviderError>;

    /// Whether a credential is configured. Checked before any call.
    fn has_credential(&self) -> bool;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Run `provider.generate` under the request's timeout.
///
/// Expiry is reported as [`ProviderError::Timeout`], i.e. a transport failure.
pub async fn generate_within_timeout(
    provider: &dyn GenerativeProvider,
    request: &GenerationRequest,
) -> Result<JsonValue, ProviderError> {
    match tokio::time::timeout(request.timeout, provider.generate(request)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                provider = provider.name(),
                timeout = ?request.timeout,
                "Generative call timed out"
            );
            Err(ProviderError::Timeout(request.timeout))
        }
    }
}
