//! Configuration for the remote embedding gateway

use crate::error::{EmbedError, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default REST root of the Gemini API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "gemini-embedding-001";

/// Environment variable holding the API credential.
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration for the Gemini embedding endpoint.
///
/// The credential itself is never part of the configuration; only the name of
/// the environment variable it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct EmbedConfig {
    /// REST root, without a trailing `/models` segment
    #[builder(default = "DEFAULT_BASE_URL.to_string()")]
    pub base_url: String,
    /// Name of the embedding model
    #[builder(default = "DEFAULT_MODEL.to_string()")]
    pub model: String,
    /// Upper bound on a single request, in seconds
    #[builder(default = "30")]
    pub timeout_secs: u64,
    /// Environment variable the API key is read from
    #[builder(default = "DEFAULT_API_KEY_ENV.to_string()")]
    pub api_key_env: String,
}

impl EmbedConfig {
    /// Create a new embedding configuration using the builder
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder::default()
    }

    /// Set the model name (builder style)
    pub fn with_model<S: Into<String>>(self, model: S) -> Self {
        Self {
            model: model.into(),
            ..self
        }
    }

    /// Set the REST root (builder style)
    pub fn with_base_url<S: Into<String>>(self, base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            ..self
        }
    }

    /// Set the request timeout (builder style)
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout_secs: timeout.as_secs().max(1),
            ..self
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full URL of the `embedContent` method for the configured model.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Read the API key from the configured environment variable.
    ///
    /// # Errors
    /// [`EmbedError::InvalidConfig`] when the variable is unset or blank.
    pub fn api_key_from_env(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(EmbedError::invalid_config(format!(
                "{} is not set; export {}=<your_key>",
                self.api_key_env, self.api_key_env
            ))),
        }
    }

    /// Check the configuration is usable before building a client.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(EmbedError::invalid_config("missing embedding model name"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(EmbedError::invalid_config(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(EmbedError::invalid_config("timeout must be at least one second"));
        }
        Ok(())
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}
