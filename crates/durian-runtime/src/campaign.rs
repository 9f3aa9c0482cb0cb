//! Campaign copy adapter.
//!
//! Reachable-but-malformed replies become the parse-failure fallback here.
//! Transport failures are returned to the caller, which decides whether to
//! show the unavailable fallback ([`CampaignAdapter::generate_or_fallback`]).

use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;

use durian_core::{
    validate_payload, CampaignFallbackPolicy, CampaignResult, PayloadKind, Polarity,
    StructuredExtractor,
};

use crate::config::{ConfigError, GenerationSettings};
use crate::judge::missing_generative_credential;
use crate::prompts::build_campaign_prompt;
use crate::providers::{generate_within_timeout, GenerationRequest, GenerativeProvider, ProviderError};

/// Errors from a campaign call.
#[derive(Error, Debug)]
pub enum CampaignError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Campaign transport failed: {0}")]
    Transport(#[from] ProviderError),
}

/// Generative campaign copywriter.
pub struct CampaignAdapter {
    provider: Arc<dyn GenerativeProvider>,
    settings: GenerationSettings,
    extractor: StructuredExtractor,
}

impl CampaignAdapter {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self::with_settings(provider, GenerationSettings::campaign_defaults())
    }

    pub fn with_settings(provider: Arc<dyn GenerativeProvider>, settings: GenerationSettings) -> Self {
        Self {
            provider,
            settings,
            extractor: StructuredExtractor::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: StructuredExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Write campaign copy for a verdict.
    ///
    /// Only the first ten keywords reach the prompt.
    pub async fn generate(
        &self,
        text: &str,
        polarity: Polarity,
        keywords: &[String],
    ) -> Result<CampaignResult, CampaignError> {
        if !self.provider.has_credential() {
            return Err(missing_generative_credential().into());
        }

        let request = GenerationRequest::new(build_campaign_prompt(polarity, keywords), &self.settings);
        tracing::debug!(
            provider = self.provider.name(),
            polarity = %polarity,
            keywords = keywords.len(),
            text_len = text.len(),
            "Requesting campaign copy"
        );

        let response = generate_within_timeout(self.provider.as_ref(), &request).await?;
        Ok(interpret_campaign_response(&self.extractor, &response))
    }

    /// Like [`generate`](Self::generate), with every error replaced by the
    /// unavailable fallback.
    pub async fn generate_or_fallback(
        &self,
        text: &str,
        polarity: Polarity,
        keywords: &[String],
    ) -> CampaignResult {
        match self.generate(text, polarity, keywords).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Campaign generation unavailable, using fallback");
                CampaignFallbackPolicy::for_unavailable()
            }
        }
    }
}

impl std::fmt::Debug for CampaignAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CampaignAdapter")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Turn a raw campaign reply into copy. Never fails.
pub fn interpret_campaign_response(
    extractor: &StructuredExtractor,
    response: &JsonValue,
) -> CampaignResult {
    let payload = match extractor.extract(response) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Campaign reply unparseable, using fallback");
            return CampaignFallbackPolicy::for_parse_failure();
        }
    };

    if let Err(e) = validate_payload(PayloadKind::Campaign, &payload) {
        tracing::warn!(error = %e, "Campaign reply has the wrong shape, using fallback");
        return CampaignFallbackPolicy::for_parse_failure();
    }

    match serde_json::from_value::<CampaignResult>(payload) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "Campaign reply did not deserialize, using fallback");
            CampaignFallbackPolicy::for_parse_failure()
        }
    }
}
