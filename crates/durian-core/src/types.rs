//! Core data model for durian-sense.
//!
//! Every value here is created fresh per analysis request and owned by that
//! request. Nothing is shared between requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A judge label (or any polarity string) outside the three-member set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized polarity label: '{label}'")]
pub struct ValidationError {
    /// The offending label, verbatim
    pub label: String,
}

/// Sentiment polarity.
///
/// Only equality and the localized label matter; there is no ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// All three polarities.
    pub const ALL: [Polarity; 3] = [Polarity::Positive, Polarity::Negative, Polarity::Neutral];

    /// Wire name ("positive", "negative", "neutral").
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Positive => "positive",
            Polarity::Negative => "negative",
            Polarity::Neutral => "neutral",
        }
    }

    /// Thai label shown to end users.
    pub fn thai_label(&self) -> &'static str {
        match self {
            Polarity::Positive => "เชิงบวก",
            Polarity::Negative => "เชิงลบ",
            Polarity::Neutral => "เป็นกลาง",
        }
    }

    pub fn is_neutral(&self) -> bool {
        matches!(self, Polarity::Neutral)
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = ValidationError;

    /// Strict parse: exact lowercase wire names only. No coercion.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Polarity::Positive),
            "negative" => Ok(Polarity::Negative),
            "neutral" => Ok(Polarity::Neutral),
            other => Err(ValidationError {
                label: other.to_string(),
            }),
        }
    }
}

/// Three independently ordered keyword evidence lists.
///
/// Insertion order is relevance order. Duplicates are allowed and nothing
/// is capped here; truncation belongs to whoever displays the lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordBuckets {
    /// Positive evidence
    #[serde(default)]
    pub pos: Vec<String>,

    /// Negative evidence
    #[serde(default)]
    pub neg: Vec<String>,

    /// Neutral / topical keywords
    #[serde(default)]
    pub keyword: Vec<String>,
}

impl KeywordBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// The bucket that evidence of the given polarity accretes into.
    pub fn bucket_mut(&mut self, polarity: Polarity) -> &mut Vec<String> {
        match polarity {
            Polarity::Positive => &mut self.pos,
            Polarity::Negative => &mut self.neg,
            Polarity::Neutral => &mut self.keyword,
        }
    }

    /// Read-only view of a bucket.
    pub fn bucket(&self, polarity: Polarity) -> &[String] {
        match polarity {
            Polarity::Positive => &self.pos,
            Polarity::Negative => &self.neg,
            Polarity::Neutral => &self.keyword,
        }
    }

    /// All keywords in `pos`, `neg`, `keyword` order.
    pub fn flatten(&self) -> Vec<String> {
        self.pos
            .iter()
            .chain(self.neg.iter())
            .chain(self.keyword.iter())
            .cloned()
            .collect()
    }

    /// A copy with every bucket cut to at most `limit` entries.
    pub fn truncated(&self, limit: usize) -> Self {
        Self {
            pos: self.pos.iter().take(limit).cloned().collect(),
            neg: self.neg.iter().take(limit).cloned().collect(),
            keyword: self.keyword.iter().take(limit).cloned().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.pos.len() + self.neg.len() + self.keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Output of the upstream tuning collaborator. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClassification {
    pub polarity: Polarity,

    /// Display score in [0, 100]
    pub score: f64,

    #[serde(default)]
    pub keywords: KeywordBuckets,
}

impl RawClassification {
    /// Create a classification, clamping the score into [0, 100].
    pub fn new(polarity: Polarity, score: f64, keywords: KeywordBuckets) -> Self {
        Self {
            polarity,
            score: clamp_score(score),
            keywords,
        }
    }
}

/// The generative judge's independent verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudgeVerdict {
    pub label: Polarity,

    /// Confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Short explanation from the judge
    pub reason: String,

    #[serde(default)]
    pub keywords: Vec<String>,
}

impl JudgeVerdict {
    /// Reason recorded when the judge's reply could not be parsed.
    pub const UNPARSEABLE_REASON: &'static str = "unparseable";

    /// Deterministic verdict used when the judge's output is unusable.
    pub fn unparseable() -> Self {
        Self {
            label: Polarity::Neutral,
            confidence: 0.5,
            reason: Self::UNPARSEABLE_REASON.to_string(),
            keywords: Vec::new(),
        }
    }
}

/// Authoritative sentiment for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedSentiment {
    pub polarity: Polarity,

    /// Always in [0, 100]
    pub score: f64,

    pub keywords: KeywordBuckets,
}

impl From<RawClassification> for FusedSentiment {
    fn from(raw: RawClassification) -> Self {
        Self {
            polarity: raw.polarity,
            score: clamp_score(raw.score),
            keywords: raw.keywords,
        }
    }
}

impl PartialEq<RawClassification> for FusedSentiment {
    fn eq(&self, other: &RawClassification) -> bool {
        self.polarity == other.polarity
            && self.score == other.score
            && self.keywords == other.keywords
    }
}

/// Marketing copy for a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignResult {
    #[serde(default)]
    pub taglines: Vec<String>,

    #[serde(default)]
    pub idea: String,
}

/// Clamp a display score into [0, 100]. NaN becomes the neutral midpoint.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 50.0;
    }
    score.clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_strict_parse() {
        assert_eq!("positive".parse::<Polarity>(), Ok(Polarity::Positive));
        assert_eq!("neutral".parse::<Polarity>(), Ok(Polarity::Neutral));

        let err = "mixed".parse::<Polarity>().unwrap_err();
        assert_eq!(err.label, "mixed");

        // Case matters; no coercion
        assert!("Positive".parse::<Polarity>().is_err());
    }

    #[test]
    fn test_polarity_thai_labels() {
        assert_eq!(Polarity::Positive.thai_label(), "เชิงบวก");
        assert_eq!(Polarity::Negative.thai_label(), "เชิงลบ");
        assert_eq!(Polarity::Neutral.thai_label(), "เป็นกลาง");
    }

    #[test]
    fn test_polarity_serde_lowercase() {
        let json = serde_json::to_string(&Polarity::Negative).unwrap();
        assert_eq!(json, "\"negative\"");

        let back: Polarity = serde_json::from_str("\"neutral\"").unwrap();
        assert_eq!(back, Polarity::Neutral);
    }

    #[test]
    fn test_bucket_selection() {
        let mut buckets = KeywordBuckets::new();
        buckets.bucket_mut(Polarity::Positive).push("หอม".into());
        buckets.bucket_mut(Polarity::Negative).push("เน่า".into());
        buckets.bucket_mut(Polarity::Neutral).push("ทุเรียน".into());

        assert_eq!(buckets.pos, vec!["หอม"]);
        assert_eq!(buckets.neg, vec!["เน่า"]);
        assert_eq!(buckets.keyword, vec!["ทุเรียน"]);
        assert_eq!(buckets.flatten(), vec!["หอม", "เน่า", "ทุเรียน"]);
    }

    #[test]
    fn test_truncated_keeps_order() {
        let buckets = KeywordBuckets {
            pos: vec!["a".into(), "b".into(), "c".into()],
            neg: vec![],
            keyword: vec!["x".into()],
        };
        let cut = buckets.truncated(2);
        assert_eq!(cut.pos, vec!["a", "b"]);
        assert_eq!(cut.keyword, vec!["x"]);
        // Original untouched
        assert_eq!(buckets.pos.len(), 3);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(-5.0), 0.0);
        assert_eq!(clamp_score(150.0), 100.0);
        assert_eq!(clamp_score(f64::NAN), 50.0);
        assert_eq!(clamp_score(72.5), 72.5);
    }

    #[test]
    fn test_unparseable_verdict() {
        let verdict = JudgeVerdict::unparseable();
        assert_eq!(verdict.label, Polarity::Neutral);
        assert_eq!(verdict.confidence, 0.5);
        assert_eq!(verdict.reason, "unparseable");
        assert!(verdict.keywords.is_empty());
    }
}
