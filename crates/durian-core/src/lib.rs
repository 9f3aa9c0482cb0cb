//! # durian-core
//!
//! Deterministic sentiment fusion and structured extraction for Thai
//! durian reviews.
//!
//! This crate answers, for one piece of text:
//! - Which polarity wins when the primary classifier and the judge disagree?
//! - What structured record is hiding in a generative model's reply?
//! - What campaign content do we show when generation fails?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same inputs always produce the same fused verdict
//! 2. **No network calls**: Everything here is a pure function over its input
//! 3. **Never partial**: Extraction yields a complete JSON value or an error
//! 4. **Request-scoped**: No state survives a single analysis
//!
//! ## Example
//!
//! ```rust
//! use durian_core::{fuse, JudgeVerdict, KeywordBuckets, Polarity, RawClassification};
//!
//! let primary = RawClassification::new(Polarity::Neutral, 50.0, KeywordBuckets::default());
//! let judge = JudgeVerdict {
//!     label: Polarity::Positive,
//!     confidence: 0.9,
//!     reason: "หวานมัน".to_string(),
//!     keywords: vec!["หวาน".to_string()],
//! };
//!
//! let outcome = fuse(primary, Some(&judge));
//! assert_eq!(outcome.sentiment.polarity, Polarity::Positive);
//! assert!((outcome.sentiment.score - 96.0).abs() < 1e-9);
//! ```

pub mod extract;
pub mod fallback;
pub mod fusion;
pub mod record;
pub mod schema;
pub mod ssense;
pub mod types;

// Re-export main types at crate root
pub use extract::{clean_payload, parse_payload, ExtractionError, StructuredExtractor, TextProbe};
pub use fallback::{CampaignFallbackPolicy, FallbackReason, FALLBACK_TAGLINES};
pub use fusion::{
    confidence_to_score, FusionEngine, FusionOutcome, FusionState, DEFAULT_CONFIDENCE_THRESHOLD,
};
pub use record::AnalysisRecord;
pub use schema::{validate_payload, PayloadKind, SchemaError};
pub use ssense::classification_from_ssense;
pub use types::{
    CampaignResult, FusedSentiment, JudgeVerdict, KeywordBuckets, Polarity, RawClassification,
    ValidationError,
};

/// Fuse a primary classification with an optional judge verdict using the
/// default confidence threshold.
pub fn fuse(primary: RawClassification, judge: Option<&JudgeVerdict>) -> FusionOutcome {
    FusionEngine::new().fuse(primary, judge)
}
