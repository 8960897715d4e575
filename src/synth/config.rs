//! Generation backend configuration parsed from environment variables.

use super::BackendError;
use crate::config::env_parse;

pub const DEFAULT_GENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GENAI_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_GENAI_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_GENAI_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for BackendTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_GENAI_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_GENAI_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeouts: BackendTimeouts,
}

impl BackendConfig {
    /// Build typed backend config from environment variables.
    ///
    /// Required:
    /// - `GENAI_API_KEY_ENV` (names the env var containing the key)
    ///
    /// Optional:
    /// - `GENAI_IMAGE_MODEL`: default `gemini-2.5-flash-image`
    /// - `GENAI_BASE_URL`: default public API base URL
    /// - `GENAI_REQUEST_TIMEOUT_SECS`: default 120
    /// - `GENAI_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` when either the indirection variable or the
    /// key it names is unset, and `ConfigParse` for an empty model name.
    pub fn from_env() -> Result<Self, BackendError> {
        let key_var = std::env::var("GENAI_API_KEY_ENV")
            .map_err(|_| BackendError::MissingApiKey { var: "GENAI_API_KEY_ENV".into() })?;
        let api_key = std::env::var(&key_var).map_err(|_| BackendError::MissingApiKey { var: key_var.clone() })?;

        let model = std::env::var("GENAI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_GENAI_IMAGE_MODEL.to_string());
        if model.trim().is_empty() {
            return Err(BackendError::ConfigParse("GENAI_IMAGE_MODEL is empty".into()));
        }
        let base_url = std::env::var("GENAI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let timeouts = BackendTimeouts {
            request_secs: env_parse("GENAI_REQUEST_TIMEOUT_SECS", DEFAULT_GENAI_REQUEST_TIMEOUT_SECS),
            connect_secs: env_parse("GENAI_CONNECT_TIMEOUT_SECS", DEFAULT_GENAI_CONNECT_TIMEOUT_SECS),
        };

        Ok(Self { api_key, model, base_url, timeouts })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
