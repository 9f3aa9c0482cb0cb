//! Sentiment judge adapter.
//!
//! Asks the generative model for an independent verdict on a review. Reply
//! shape problems are absorbed into [`JudgeVerdict::unparseable`]; a reply
//! that is well formed but names a label outside the three polarities is
//! rejected, never coerced.

use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use durian_core::{
    validate_payload, JudgeVerdict, PayloadKind, Polarity, StructuredExtractor, ValidationError,
};

use crate::config::{ConfigError, GenerationSettings};
use crate::prompts::build_judge_prompt;
use crate::providers::{
    generate_within_timeout, GenerationRequest, GenerativeProvider, ProviderError,
    GEMINI_API_KEY_ENV,
};

/// Errors from a judge call.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Judge transport failed: {0}")]
    Transport(#[from] ProviderError),

    #[error("Judge returned an invalid verdict: {0}")]
    Validation(#[from] ValidationError),
}

/// Generative sentiment judge.
pub struct JudgeAdapter {
    provider: Arc<dyn GenerativeProvider>,
    settings: GenerationSettings,
    extractor: StructuredExtractor,
}

impl JudgeAdapter {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self::with_settings(provider, GenerationSettings::judge_defaults())
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

    /// Judge one review.
    ///
    /// # Errors
    /// - [`JudgeError::Config`] when no credential is configured; nothing is sent
    /// - [`JudgeError::Transport`] on non-success status, unreachable host or timeout
    /// - [`JudgeError::Validation`] when the label is not a known polarity
    pub async fn judge(&self, text: &str) -> Result<JudgeVerdict, JudgeError> {
        if !self.provider.has_credential() {
            return Err(missing_generative_credential().into());
        }

        let request = GenerationRequest::new(build_judge_prompt(text), &self.settings);
        tracing::debug!(
            provider = self.provider.name(),
            text_len = text.len(),
            "Requesting judge verdict"
        );

        let response = generate_within_timeout(self.provider.as_ref(), &request).await?;
        let verdict = interpret_judge_response(&self.extractor, &response)?;

        tracing::debug!(
            label = %verdict.label,
            confidence = verdict.confidence,
            reason = %verdict.reason,
            "Judge verdict"
        );
        Ok(verdict)
    }
}

impl std::fmt::Debug for JudgeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JudgeAdapter")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

/// Turn a raw judge reply into a verdict.
///
/// Missing text, unparseable JSON and schema mismatches all give the
/// unparseable verdict. An unknown label is a [`ValidationError`].
pub fn interpret_judge_response(
    extractor: &StructuredExtractor,
    response: &JsonValue,
) -> Result<JudgeVerdict, ValidationError> {
    let payload = match extractor.extract(response) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!(error = %e, "Judge reply unparseable");
            return Ok(JudgeVerdict::unparseable());
        }
    };

    if let Err(e) = validate_payload(PayloadKind::Judge, &payload) {
        tracing::warn!(error = %e, "Judge reply has the wrong shape");
        return Ok(JudgeVerdict::unparseable());
    }

    // Schema guarantees a string label and a numeric confidence
    let label = payload["label"].as_str().unwrap_or_default();
    let label = Polarity::from_str(label)?;

    let confidence = payload["confidence"].as_f64().unwrap_or(0.0).clamp(0.0, 1.0);

    let reason = payload
        .get("reason")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
        .to_string();

    let keywords = payload
        .get("keywords")
        .and_then(JsonValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(JsonValue::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(JudgeVerdict {
        label,
        confidence,
        reason,
        keywords,
    })
}

pub(crate) fn missing_generative_credential() -> ConfigError {
    ConfigError::MissingCredential {
        name: "Gemini API key",
        hint: format!("set 'gemini.api_key' in config or the '{}' environment variable", GEMINI_API_KEY_ENV),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(text: &str) -> JsonValue {
        json!({"candidates": [{"content": {"parts": [{"text": text}]}}]})
    }

    fn interpret(text: &str) -> Result<JudgeVerdict, ValidationError> {
        interpret_judge_response(&StructuredExtractor::new(), &reply(text))
    }

    #[test]
    fn test_fenced_verdict() {
        let verdict = interpret(
            "```json\n{\"label\":\"positive\",\"confidence\":0.92,\"reason\":\"หอมหวาน\",\"keywords\":[\"หอม\",\"หวาน\"]}\n```",
        )
        .unwrap();

        assert_eq!(verdict.label, Polarity::Positive);
        assert_eq!(verdict.confidence, 0.92);
        assert_eq!(verdict.reason, "หอมหวาน");
        assert_eq!(verdict.keywords, vec!["หอม", "หวาน"]);
    }

    #[test]
    fn test_prose_is_unparseable() {
        let verdict = interpret("ขออภัย ไม่สามารถวิเคราะห์ได้").unwrap();
        assert_eq!(verdict, JudgeVerdict::unparseable());
    }

    #[test]
    fn test_empty_response_is_unparseable() {
        let verdict = interpret_judge_response(&StructuredExtractor::new(), &json!({})).unwrap();
        assert_eq!(verdict.reason, JudgeVerdict::UNPARSEABLE_REASON);
        assert_eq!(verdict.label, Polarity::Neutral);
        assert_eq!(verdict.confidence, 0.5);
    }

    #[test]
    fn test_missing_confidence_is_unparseable() {
        let verdict = interpret(r#"{"label":"negative","reason":"เน่า"}"#).unwrap();
        assert_eq!(verdict, JudgeVerdict::unparseable());
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = interpret(r#"{"label":"mixed","confidence":0.9}"#).unwrap_err();
        assert_eq!(err.label, "mixed");
    }

    #[test]
    fn test_label_case_not_coerced() {
        assert!(interpret(r#"{"label":"Positive","confidence":0.9}"#).is_err());
    }

    #[test]
    fn test_confidence_clamped_and_optional_fields_defaulted() {
        let verdict = interpret(r#"{"label":"neutral","confidence":3}"#).unwrap();
        assert_eq!(verdict.confidence, 1.0);
        assert!(verdict.reason.is_empty());
        assert!(verdict.keywords.is_empty());
    }
}
