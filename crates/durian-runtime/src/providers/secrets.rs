//! Credential handling for upstream services.
//!
//! Keys for the generative model and the SSense classifier are wrapped as
//! soon as they are read:
//!
//! - **No accidental logging**: `Debug`/`Display` print `[REDACTED]`
//! - **Zeroed on drop**: storage is a `secrecy::SecretString`
//! - **Explicit use**: the value is only reachable through `.expose()`
//!
//! ```ignore
//! let cred = ApiCredential::from_setting_or_env(settings.api_key.as_deref(), GEMINI_API_KEY_ENV, "Gemini API key");
//! request.header("x-goog-api-key", cred?.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use crate::config::ConfigError;

/// Environment variable holding the generative model key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable holding the AI-for-Thai key.
pub const AIFORTHAI_API_KEY_ENV: &str = "AIFORTHAI_API_KEY";

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Configuration file
    Config,
    /// Environment variable
    Environment,
    /// Passed in by the embedding program
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely stored API key.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Read from an environment variable. Unset or blank is an error.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ConfigError> {
        match std::env::var(env_var) {
            Ok(v) if !v.trim().is_empty() => Ok(Self::new(v, CredentialSource::Environment, name)),
            _ => Err(ConfigError::MissingCredential {
                name,
                hint: format!("set the '{}' environment variable", env_var),
            }),
        }
    }

    /// Prefer a configured value, fall back to the environment.
    ///
    /// Blank configured values count as absent.
    pub fn from_setting_or_env(
        setting: Option<&str>,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = setting.filter(|v| !v.trim().is_empty()) {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        Self::from_env(env_var, name).map_err(|_| ConfigError::MissingCredential {
            name,
            hint: format!("set 'api_key' in config or the '{}' environment variable", env_var),
        })
    }

    /// The raw key. Call only where the key is sent; never store the result.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}
