//! Gemini `generateContent` provider.
//!
//! Returns the response body untouched. Rate-limited and 5xx responses are
//! retried with exponential backoff up to `max_retries` times.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use super::{
    secrets::{ApiCredential, CredentialSource, GEMINI_API_KEY_ENV},
    GenerationRequest, GenerativeProvider, ProviderError,
};
use crate::config::GeminiSettings;

/// Gemini provider.
///
/// The key is optional at construction time so a missing key surfaces as a
/// configuration error at the adapter, before any request is attempted.
pub struct GeminiProvider {
    credential: Option<ApiCredential>,
    endpoint: String,
    model: String,
    max_retries: usize,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("credential", &self.credential)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GeminiProvider {
    /// Provider with an explicit key and default settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        let credential = ApiCredential::new(api_key, CredentialSource::Programmatic, "Gemini API key");
        Self::with_credential(Some(credential), &GeminiSettings::default())
    }

    /// Provider from settings, taking the key from settings or `GEMINI_API_KEY`.
    ///
    /// A missing key is logged, not an error.
    pub fn from_settings(settings: &GeminiSettings) -> Self {
        let credential = ApiCredential::from_setting_or_env(
            settings.api_key.as_deref(),
            GEMINI_API_KEY_ENV,
            "Gemini API key",
        );
        let credential = match credential {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(error = %e, "Generative features will fall back");
                None
            }
        };
        Self::with_credential(credential, settings)
    }

    fn with_credential(credential: Option<ApiCredential>, settings: &GeminiSettings) -> Self {
        Self {
            credential,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_retries: settings.max_retries,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(8))
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    async fn send_once(
        &self,
        credential: &ApiCredential,
        body: &GenerateContentRequest<'_>,
        timeout: Duration,
    ) -> Result<JsonValue, ProviderError> {
        // Expose the key only here, at the point of use
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", credential.expose())
            .header("content-type", "application/json")
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(timeout)
                } else {
                    ProviderError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))
    }
}

/// Delay before the next attempt: the server's `retry-after` when it sent
/// one, otherwise the backoff's own suggestion. `None` stops retrying.
fn retry_delay(err: &ProviderError, suggested: Option<Duration>) -> Option<Duration> {
    match err {
        ProviderError::RateLimited {
            retry_after: Some(wait),
        } => suggested.map(|_| *wait),
        _ => suggested,
    }
}

/// `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt_text,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<JsonValue, ProviderError> {
        let Some(credential) = self.credential.as_ref() else {
            return Err(ProviderError::NotConfigured(format!(
                "Gemini API key required: set 'api_key' in config or {} env",
                GEMINI_API_KEY_ENV
            )));
        };

        let body = GenerateContentRequest::from_request(request);

        (|| self.send_once(credential, &body, request.timeout))
            .retry(self.backoff())
            .when(ProviderError::is_retryable)
            .adjust(retry_delay)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(error = %err, delay = ?delay, "Retrying Gemini request");
            })
            .await
    }

    fn has_credential(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.is_empty())
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
