//! Runtime configuration.
//!
//! Everything has a default, so an empty file (or no file) is a valid
//! configuration. Durations are written the human way (`"15s"`, `"1m 30s"`).
//!
//! ```yaml
//! confidence_threshold: 0.7
//! judge_enabled: true
//! judge:
//!   temperature: 0.3
//!   max_output_tokens: 256
//!   timeout: 15s
//! campaign:
//!   temperature: 0.7
//!   max_output_tokens: 2048
//!   timeout: 30s
//! gemini:
//!   model: gemini-2.5-flash
//!   max_retries: 2
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use durian_core::DEFAULT_CONFIDENCE_THRESHOLD;

/// Configuration and credential errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} is not configured: {hint}")]
    MissingCredential { name: &'static str, hint: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Sampling settings for one kind of generative call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub temperature: f32,

    pub max_output_tokens: u32,

    /// Expiry is handled exactly like a transport failure
    #[serde(with = "human_duration")]
    pub timeout: Duration,
}

impl GenerationSettings {
    /// Classification: low temperature, short output.
    pub fn judge_defaults() -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: 256,
            timeout: Duration::from_secs(15),
        }
    }

    /// Copywriting: livelier, longer output.
    pub fn campaign_defaults() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout: Duration::from_secs(30),
        }
    }

    fn validate(&self, section: &str) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "{}.temperature must be within [0, 2], got {}",
                section, self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::Invalid(format!(
                "{}.max_output_tokens must be positive",
                section
            )));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Invalid(format!("{}.timeout must be positive", section)));
        }
        Ok(())
    }
}

/// A `judge:` or `campaign:` section as written; absent fields keep the
/// section's own defaults.
#[derive(Debug, Default, Deserialize)]
struct PartialGenerationSettings {
    temperature: Option<f32>,

    max_output_tokens: Option<u32>,

    #[serde(default, deserialize_with = "human_duration::deserialize_option")]
    timeout: Option<Duration>,
}

impl PartialGenerationSettings {
    fn over(self, base: GenerationSettings) -> GenerationSettings {
        GenerationSettings {
            temperature: self.temperature.unwrap_or(base.temperature),
            max_output_tokens: self.max_output_tokens.unwrap_or(base.max_output_tokens),
            timeout: self.timeout.unwrap_or(base.timeout),
        }
    }
}

fn judge_section<'de, D>(deserializer: D) -> Result<GenerationSettings, D::Error>
where
    D: serde::Deserializer<'de>,
{
    PartialGenerationSettings::deserialize(deserializer)
        .map(|partial| partial.over(GenerationSettings::judge_defaults()))
}

fn campaign_section<'de, D>(deserializer: D) -> Result<GenerationSettings, D::Error>
where
    D: serde::Deserializer<'de>,
{
    PartialGenerationSettings::deserialize(deserializer)
        .map(|partial| partial.over(GenerationSettings::campaign_defaults()))
}

/// Generative model transport settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API base, without the `/models/...` suffix
    pub endpoint: String,

    pub model: String,

    /// Retries for rate-limited and 5xx responses within one call
    pub max_retries: usize,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.5-flash".to_string(),
            max_retries: 2,
            api_key: None,
        }
    }
}

impl fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// AI-for-Thai SSense settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsenseSettings {
    pub endpoint: String,

    #[serde(with = "human_duration")]
    pub timeout: Duration,

    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for SsenseSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.aiforthai.in.th/ssense".to_string(),
            timeout: Duration::from_secs(10),
            api_key: None,
        }
    }
}

impl fmt::Debug for SsenseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsenseSettings")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Judge confidence needed to override a non-neutral primary verdict
    pub confidence_threshold: f64,

    /// Whether the judge is consulted at all
    pub judge_enabled: bool,

    #[serde(deserialize_with = "judge_section")]
    pub judge: GenerationSettings,

    #[serde(deserialize_with = "campaign_section")]
    pub campaign: GenerationSettings,

    pub gemini: GeminiSettings,

    pub ssense: SsenseSettings,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            judge_enabled: true,
            judge: GenerationSettings::judge_defaults(),
            campaign: GenerationSettings::campaign_defaults(),
            gemini: GeminiSettings::default(),
            ssense: SsenseSettings::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        self.judge.validate("judge")?;
        self.campaign.validate("campaign")?;
        validate_endpoint("gemini.endpoint", &self.gemini.endpoint)?;
        validate_endpoint("ssense.endpoint", &self.ssense.endpoint)?;
        if self.ssense.timeout.is_zero() {
            return Err(ConfigError::Invalid("ssense.timeout must be positive".to_string()));
        }
        Ok(())
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn validate_endpoint(field: &str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must start with http:// or https://, got '{}'",
            field, url
        )))
    }
}

mod human_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
