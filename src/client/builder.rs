//! Client construction.

use crate::client::core::YarnTts;
use crate::client::session::ClientSession;
use crate::retry::RetryConfig;
use crate::transport::HttpTransport;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://yarngpt.ai/api/v1";

/// Environment variable consulted when no API key is passed explicitly.
pub const API_KEY_ENV: &str = "YARNGPT_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for [`YarnTts`] clients.
pub struct YarnTtsBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
    retry: RetryConfig,
}

impl YarnTtsBuilder {
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }

    /// Set the API key. Falls back to `YARNGPT_API_KEY` when unset.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the base URL (primarily for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request transport timeout. Default 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry policy for every call made through this client.
    pub fn retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the client, validating configuration up front.
    pub fn build(self) -> Result<YarnTts> {
        let api_key = self
            .api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty()))
            .ok_or_else(|| {
                Error::authentication(format!(
                    "API key is required; set {} or pass api_key",
                    API_KEY_ENV
                ))
            })?;

        self.retry.validate()?;

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let transport = HttpTransport::new(&base_url, &api_key, self.timeout)
            .map_err(|e| Error::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(YarnTts::from_parts(
            Arc::new(ClientSession::new(transport)),
            self.retry,
        ))
    }
}

impl Default for YarnTtsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_api_key_is_an_authentication_error() {
        // Scoped: the env fallback only applies when the var is set.
        if std::env::var(API_KEY_ENV).is_ok() {
            return;
        }
        let err = YarnTtsBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Authentication { .. }));
    }

    #[test]
    fn invalid_retry_config_fails_at_build_time() {
        let err = YarnTtsBuilder::new()
            .api_key("key")
            .retry_config(RetryConfig::new().backoff_factor(0.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn explicit_key_builds() {
        assert!(YarnTtsBuilder::new().api_key("key").build().is_ok());
    }
}
