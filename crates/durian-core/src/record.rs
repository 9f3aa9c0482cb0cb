//! The final analysis record handed to display and history collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fallback::{CampaignFallbackPolicy, FallbackReason};
use crate::fusion::{FusionOutcome, FusionState};
use crate::types::{CampaignResult, FusedSentiment, JudgeVerdict};

/// Everything one analysis request produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// The analysed text, trimmed
    pub text: String,

    pub sentiment: FusedSentiment,

    /// Thai label for `sentiment.polarity`
    pub sentiment_label: String,

    /// The judge verdict, when the judge ran and answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judge: Option<JudgeVerdict>,

    pub fusion: FusionState,

    pub campaign: CampaignResult,

    pub analyzed_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn new(
        text: impl Into<String>,
        outcome: FusionOutcome,
        judge: Option<JudgeVerdict>,
        campaign: CampaignResult,
    ) -> Self {
        let sentiment_label = outcome.sentiment.polarity.thai_label().to_string();
        Self {
            text: text.into(),
            sentiment: outcome.sentiment,
            sentiment_label,
            judge,
            fusion: outcome.state,
            campaign,
            analyzed_at: Utc::now(),
        }
    }

    pub fn overridden(&self) -> bool {
        self.fusion == FusionState::Overridden
    }

    /// Which fallback filled the campaign, if any.
    pub fn campaign_fallback(&self) -> Option<FallbackReason> {
        CampaignFallbackPolicy::classify(&self.campaign)
    }
}
