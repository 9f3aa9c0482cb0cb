//! Primary classifier collaborators.
//!
//! The pipeline takes a ready [`RawClassification`]; this module only offers
//! a way to obtain one from AI-for-Thai SSense for callers that have no
//! domain tuner of their own.

use async_trait::async_trait;
use durian_core::RawClassification;

use crate::providers::ProviderError;

#[cfg(feature = "ssense")]
pub use ssense_client::SsenseClient;

/// Source of primary classifications.
#[async_trait]
pub trait PrimaryClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<RawClassification, ProviderError>;

    fn name(&self) -> &str;
}

#[cfg(feature = "ssense")]
mod ssense_client {
    use async_trait::async_trait;
    use durian_core::{classification_from_ssense, RawClassification};
    use serde_json::Value as JsonValue;
    use std::time::Duration;

    use super::PrimaryClassifier;
    use crate::config::{ConfigError, SsenseSettings};
    use crate::providers::{ApiCredential, ProviderError, AIFORTHAI_API_KEY_ENV};

    /// AI-for-Thai SSense client. Produces untuned classifications.
    #[derive(Debug)]
    pub struct SsenseClient {
        credential: ApiCredential,
        endpoint: String,
        timeout: Duration,
        client: reqwest::Client,
    }

    impl SsenseClient {
        /// Key from settings or `AIFORTHAI_API_KEY`. Missing key is an error.
        pub fn from_settings(settings: &SsenseSettings) -> Result<Self, ConfigError> {
            let credential = ApiCredential::from_setting_or_env(
                settings.api_key.as_deref(),
                AIFORTHAI_API_KEY_ENV,
                "AI-for-Thai API key",
            )?;
            Ok(Self {
                credential,
                endpoint: settings.endpoint.clone(),
                timeout: settings.timeout,
                client: reqwest::Client::new(),
            })
        }
    }

    #[async_trait]
    impl PrimaryClassifier for SsenseClient {
        async fn classify(&self, text: &str) -> Result<RawClassification, ProviderError> {
            let response = self
                .client
                .get(&self.endpoint)
                .query(&[("text", text)])
                .header("Apikey", self.credential.expose())
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ProviderError::Timeout(self.timeout)
                    } else {
                        ProviderError::HttpError(e.to_string())
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::ApiError {
                    status: status.as_u16(),
                    message: status.canonical_reason().unwrap_or("unknown").to_string(),
                });
            }

            let body: JsonValue = response
                .json()
                .await
                .map_err(|e| ProviderError::ParseError(e.to_string()))?;

            let classification = classification_from_ssense(&body);
            tracing::debug!(
                polarity = %classification.polarity,
                score = classification.score,
                keywords = classification.keywords.len(),
                "SSense classification"
            );
            Ok(classification)
        }

        fn name(&self) -> &str {
            "ssense"
        }
    }

}
