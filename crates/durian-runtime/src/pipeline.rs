//! Per-request analysis pipeline.
//!
//! Runs strictly in order: judge (optional), fusion, campaign. No step can
//! fail the analysis once the text is accepted. A judge failure means no
//! override, a campaign failure means fallback copy.

use std::sync::Arc;
use thiserror::Error;

use durian_core::{AnalysisRecord, FusionEngine, JudgeVerdict, RawClassification};

use crate::campaign::CampaignAdapter;
use crate::classifier::PrimaryClassifier;
use crate::config::RuntimeConfig;
use crate::judge::{JudgeAdapter, JudgeError};
use crate::providers::{GenerativeProvider, ProviderError};

/// Errors that stop an analysis before it starts.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Nothing to analyze: text is empty")]
    EmptyText,

    #[error("Primary classifier failed: {0}")]
    Classifier(#[source] ProviderError),
}

/// Judge, fuse and write campaign copy for one review at a time.
///
/// Holds no per-request state; concurrent `analyze` calls share nothing
/// mutable.
#[derive(Debug)]
pub struct AnalysisPipeline {
    judge: Option<JudgeAdapter>,
    campaign: CampaignAdapter,
    fusion: FusionEngine,
}

impl AnalysisPipeline {
    pub fn builder(provider: Arc<dyn GenerativeProvider>) -> AnalysisPipelineBuilder {
        AnalysisPipelineBuilder::new(provider)
    }

    /// Pipeline wired from a configuration.
    pub fn from_config(provider: Arc<dyn GenerativeProvider>, config: &RuntimeConfig) -> Self {
        Self::builder(provider).config(config.clone()).build()
    }

    pub fn judge_enabled(&self) -> bool {
        self.judge.is_some()
    }

    pub fn fusion(&self) -> &FusionEngine {
        &self.fusion
    }

    /// Analyze `text` given its primary classification.
    pub async fn analyze(
        &self,
        text: &str,
        primary: RawClassification,
    ) -> Result<AnalysisRecord, PipelineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PipelineError::EmptyText);
        }

        tracing::info!(
            text_len = text.len(),
            primary = %primary.polarity,
            score = primary.score,
            "Analyzing review"
        );

        let verdict = self.consult_judge(text).await;
        let outcome = self.fusion.fuse(primary, verdict.as_ref());

        let keywords = outcome.sentiment.keywords.flatten();
        let campaign = self
            .campaign
            .generate_or_fallback(text, outcome.sentiment.polarity, &keywords)
            .await;

        let record = AnalysisRecord::new(text, outcome, verdict, campaign);
        tracing::info!(
            polarity = %record.sentiment.polarity,
            score = record.sentiment.score,
            fusion = ?record.fusion,
            campaign_fallback = ?record.campaign_fallback(),
            "Analysis complete"
        );
        Ok(record)
    }

    /// Fetch the primary classification from `classifier`, then analyze.
    pub async fn analyze_with_classifier(
        &self,
        text: &str,
        classifier: &dyn PrimaryClassifier,
    ) -> Result<AnalysisRecord, PipelineError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::EmptyText);
        }

        let primary = classifier
            .classify(trimmed)
            .await
            .map_err(PipelineError::Classifier)?;
        tracing::debug!(classifier = classifier.name(), "Primary classification received");

        self.analyze(trimmed, primary).await
    }

    async fn consult_judge(&self, text: &str) -> Option<JudgeVerdict> {
        let judge = self.judge.as_ref()?;

        match judge.judge(text).await {
            Ok(verdict) => Some(verdict),
            Err(JudgeError::Config(e)) => {
                tracing::info!(reason = %e, "Judge skipped");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Judge failed, keeping primary verdict");
                None
            }
        }
    }
}

/// Builder for [`AnalysisPipeline`].
pub struct AnalysisPipelineBuilder {
    provider: Arc<dyn GenerativeProvider>,
    config: RuntimeConfig,
    judge_enabled: Option<bool>,
}

impl AnalysisPipelineBuilder {
    pub fn new(provider: Arc<dyn GenerativeProvider>) -> Self {
        Self {
            provider,
            config: RuntimeConfig::default(),
            judge_enabled: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides `judge_enabled` from the configuration.
    pub fn judge_enabled(mut self, enabled: bool) -> Self {
        self.judge_enabled = Some(enabled);
        self
    }

    pub fn build(self) -> AnalysisPipeline {
        let judge_enabled = self.judge_enabled.unwrap_or(self.config.judge_enabled);

        let judge = judge_enabled
            .then(|| JudgeAdapter::with_settings(self.provider.clone(), self.config.judge.clone()));
        let campaign = CampaignAdapter::with_settings(self.provider, self.config.campaign);

        AnalysisPipeline {
            judge,
            campaign,
            fusion: FusionEngine::with_threshold(self.config.confidence_threshold),
        }
    }
}
