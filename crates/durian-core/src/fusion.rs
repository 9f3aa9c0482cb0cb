//! FusionEngine: reconciles the primary classification with the judge.
//!
//! The override policy is fixed and deterministic:
//! 1. No judge verdict → the primary classification passes through unchanged
//! 2. Judge confidence above the threshold, OR a neutral primary → OVERRIDE
//! 3. Otherwise → the primary classification stands
//!
//! One decision per request. The primary classifier's keyword evidence is
//! never dropped; judge keywords accrete onto it.

use serde::{Deserialize, Serialize};

use crate::types::{clamp_score, FusedSentiment, JudgeVerdict, Polarity, RawClassification};

/// Default confidence the judge must exceed to override a non-neutral primary.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Score assigned whenever the judge overrides to neutral.
pub const NEUTRAL_OVERRIDE_SCORE: f64 = 50.0;

/// Which source decided the final verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionState {
    /// The primary classification stands
    Primary,

    /// The judge overrode the primary classification
    Overridden,
}

/// Result of fusing one request.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    pub sentiment: FusedSentiment,
    pub state: FusionState,
}

impl FusionOutcome {
    pub fn overridden(&self) -> bool {
        self.state == FusionState::Overridden
    }
}

/// Map judge confidence to a display score for a non-neutral override.
///
/// Monotonic from [0, 1] onto [60, 100].
pub fn confidence_to_score(confidence: f64) -> f64 {
    (60.0 + confidence * 40.0).min(100.0)
}

/// Score the judge's label earns when it overrides.
pub fn override_score(verdict: &JudgeVerdict) -> f64 {
    match verdict.label {
        Polarity::Neutral => NEUTRAL_OVERRIDE_SCORE,
        _ => clamp_score(confidence_to_score(verdict.confidence)),
    }
}

/// The fusion engine. Holds only its configured threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionEngine {
    threshold: f64,
}

impl FusionEngine {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Whether `judge` should replace `primary`.
    pub fn should_override(&self, primary: &RawClassification, judge: &JudgeVerdict) -> bool {
        judge.confidence > self.threshold || primary.polarity.is_neutral()
    }

    /// Fuse a primary classification with an optional judge verdict.
    pub fn fuse(&self, primary: RawClassification, judge: Option<&JudgeVerdict>) -> FusionOutcome {
        let Some(judge) = judge else {
            return FusionOutcome {
                sentiment: primary.into(),
                state: FusionState::Primary,
            };
        };

        if !self.should_override(&primary, judge) {
            tracing::debug!(
                primary = %primary.polarity,
                judge = %judge.label,
                confidence = judge.confidence,
                threshold = self.threshold,
                "Judge below threshold, keeping primary verdict"
            );
            return FusionOutcome {
                sentiment: primary.into(),
                state: FusionState::Primary,
            };
        }

        let mut keywords = primary.keywords;
        keywords
            .bucket_mut(judge.label)
            .extend(judge.keywords.iter().cloned());

        let score = override_score(judge);

        tracing::info!(
            from = %primary.polarity,
            to = %judge.label,
            confidence = judge.confidence,
            score,
            reason = %judge.reason,
            "Judge overrode primary verdict"
        );

        FusionOutcome {
            sentiment: FusedSentiment {
                polarity: judge.label,
                score,
                keywords,
            },
            state: FusionState::Overridden,
        }
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}
