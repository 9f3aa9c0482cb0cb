//! # durian-runtime
//!
//! Network-facing half of durian-sense: the generative judge, campaign
//! copywriting, the SSense primary classifier and the per-request pipeline
//! that ties them to the deterministic fusion in `durian-core`.
//!
//! ## Failure model
//!
//! No network failure ends an analysis. At worst the caller gets the primary
//! verdict unchanged, paired with fallback campaign copy:
//!
//! | Failure                       | Outcome                          |
//! |-------------------------------|----------------------------------|
//! | Judge unreachable / timeout   | No override                      |
//! | Judge reply unparseable       | Neutral 0.5 verdict              |
//! | Judge label unknown           | Rejected, no override            |
//! | Campaign reply unparseable    | Parse-failure fallback copy      |
//! | Campaign unreachable          | Unavailable fallback copy        |
//! | No credential                 | Fails fast, nothing sent         |
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use durian_core::{KeywordBuckets, Polarity, RawClassification};
//! use durian_runtime::{AnalysisPipeline, GeminiProvider, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_file("durian.yaml")?;
//! let provider = Arc::new(GeminiProvider::from_settings(&config.gemini));
//! let pipeline = AnalysisPipeline::from_config(provider, &config);
//!
//! let primary = RawClassification::new(Polarity::Neutral, 50.0, KeywordBuckets::default());
//! let record = pipeline.analyze("ทุเรียนหมอนทองหวานมัน", primary).await?;
//! println!("{} {}", record.sentiment_label, record.sentiment.score);
//! ```

pub mod campaign;
pub mod classifier;
pub mod config;
pub mod judge;
pub mod pipeline;
pub mod prompts;
pub mod providers;

pub use campaign::{interpret_campaign_response, CampaignAdapter, CampaignError};
pub use classifier::PrimaryClassifier;
pub use config::{ConfigError, GeminiSettings, GenerationSettings, RuntimeConfig, SsenseSettings};
pub use judge::{interpret_judge_response, JudgeAdapter, JudgeError};
pub use pipeline::{AnalysisPipeline, AnalysisPipelineBuilder, PipelineError};
pub use providers::{
    generate_within_timeout, ApiCredential, CredentialSource, GenerationRequest,
    GenerativeProvider, ProviderError,
};

#[cfg(feature = "ssense")]
pub use classifier::SsenseClient;

#[cfg(feature = "gemini")]
pub use providers::GeminiProvider;
