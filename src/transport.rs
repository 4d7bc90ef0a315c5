//! Single-attempt HTTP exchange with the TTS API.
//!
//! The transport owns the `reqwest::Client` and with it the connection pool
//! shared by every concurrent operation on a session. It performs exactly one
//! request/response exchange per call; retry policy lives above it.

use crate::types::SpeechRequest;
use bytes::Bytes;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}

/// Raw outcome of one attempt, before classification.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    tts_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, TransportError> {
        // Pool and timeout defaults are production-friendly and
        // env-overridable, so deployments can tune the client without code
        // changes.
        let mut builder = reqwest::Client::builder()
            .timeout(resolve_timeout(timeout))
            .pool_max_idle_per_host(
                env::var("YARNTTS_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("YARNTTS_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("YARNTTS_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder.build().map_err(TransportError::Http)?;

        Ok(Self {
            client,
            tts_url: format!("{}/tts", base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
        })
    }

    /// Perform exactly one POST to the synthesis endpoint.
    ///
    /// Network-level failures (connect, reset, timeout) surface as
    /// `TransportError`; any HTTP response, success or not, comes back as a
    /// `RawResponse` for the classifier.
    pub async fn execute(&self, request: &SpeechRequest) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .post(&self.tts_url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&request.to_payload())
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse { status, body })
    }
}

/// Request timeout, with `YARNTTS_HTTP_TIMEOUT_SECS` taking precedence over
/// the configured value.
fn resolve_timeout(default: Duration) -> Duration {
    env::var("YARNTTS_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_url_without_double_slash() {
        let t = HttpTransport::new(
            "https://yarngpt.ai/api/v1/",
            "key",
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(t.tts_url, "https://yarngpt.ai/api/v1/tts");
    }

    #[test]
    fn timeout_env_var_overrides_the_configured_value() {
        let configured = Duration::from_secs(30);

        env::set_var("YARNTTS_HTTP_TIMEOUT_SECS", "7");
        assert_eq!(resolve_timeout(configured), Duration::from_secs(7));

        // Unparseable values fall back rather than erroring.
        env::set_var("YARNTTS_HTTP_TIMEOUT_SECS", "not-a-number");
        assert_eq!(resolve_timeout(configured), configured);

        env::remove_var("YARNTTS_HTTP_TIMEOUT_SECS");
        assert_eq!(resolve_timeout(configured), configured);
    }
}
