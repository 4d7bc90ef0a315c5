//! Error taxonomy and HTTP outcome classification.
//!
//! Classification is the single source of truth for retry eligibility:
//! [`Error::from_response`] maps a raw HTTP outcome to a domain error, and
//! [`Error::is_retryable`] is the only place that decides whether the retry
//! engine may try again. No other module hard-codes status codes.

use crate::transport::TransportError;
use thiserror::Error;

/// What kind of limit a 429 response reported.
///
/// The API uses the same status for short-lived rate limiting and for the
/// daily usage quota; the error body distinguishes them. Both are retryable —
/// a daily quota surfaced through the retry budget still ends up with the
/// caller, who can decide to wait or upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaScope {
    /// Transient rate limiting; backing off usually clears it.
    RateLimit,
    /// The account's daily usage quota is exhausted.
    DailyQuota,
}

impl std::fmt::Display for QuotaScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaScope::RateLimit => write!(f, "rate limit"),
            QuotaScope::DailyQuota => write!(f, "daily quota"),
        }
    }
}

/// Unified error type for the library.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad request input (empty text, text over the limit, unknown
    /// voice/format). Never retried.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Bad or missing credential (HTTP 401/403). Never retried.
    #[error("Authentication error: {message}")]
    Authentication { message: String },

    /// Billing state blocks the request (HTTP 402). Never retried.
    #[error("Payment required: {message}")]
    PaymentRequired { message: String },

    /// Rate or usage limit (HTTP 429). Retried up to budget, then surfaced.
    #[error("Quota exceeded ({scope}): {message}")]
    QuotaExceeded { scope: QuotaScope, message: String },

    /// Upstream or network failure. `status` is `None` for network-level
    /// failures (connect, reset, timeout), which are retryable; 5xx statuses
    /// are retryable; any other status is terminal.
    #[error("API error{}: {message}", status_suffix(.status))]
    Api { status: Option<u16>, message: String },

    /// The caller cancelled the operation. Never retried.
    #[error("operation cancelled")]
    Cancelled,

    /// Client construction or configuration problem. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Local file I/O failure when writing audio to disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(s) => format!(" (HTTP {})", s),
        None => String::new(),
    }
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Error::Authentication {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration(message.into())
    }

    pub(crate) fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// Classify a non-success HTTP response into a domain error.
    ///
    /// Pure function of the status code and (possibly empty, possibly
    /// non-JSON) response body. The mapping:
    ///
    /// | status | error | retryable |
    /// |--------|-------|-----------|
    /// | 401, 403 | [`Error::Authentication`] | no |
    /// | 402 | [`Error::PaymentRequired`] | no |
    /// | 400, 422 | [`Error::Validation`] | no |
    /// | 429 | [`Error::QuotaExceeded`] | yes |
    /// | 500, 502, 503, 504 | [`Error::Api`] | yes |
    /// | anything else | [`Error::Api`] | no |
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match status {
            401 => Error::authentication(
                body_message(body).unwrap_or_else(|| "Invalid API key".to_string()),
            ),
            403 => Error::authentication(
                body_message(body)
                    .unwrap_or_else(|| "Access forbidden; check API key permissions".to_string()),
            ),
            402 => Error::PaymentRequired {
                message: body_message(body).unwrap_or_else(|| {
                    "Payment required; check your account balance or subscription".to_string()
                }),
            },
            400 | 422 => Error::validation(
                body_message(body).unwrap_or_else(|| "Invalid request parameters".to_string()),
            ),
            429 => {
                let message = body_message(body)
                    .unwrap_or_else(|| "Too many requests; retry after backoff".to_string());
                Error::QuotaExceeded {
                    scope: quota_scope(body, &message),
                    message,
                }
            }
            _ => Error::api(
                Some(status),
                body_message(body).unwrap_or_else(|| {
                    format!(
                        "API request failed with status {}: {}",
                        status,
                        String::from_utf8_lossy(body)
                    )
                }),
            ),
        }
    }

    /// Whether the retry engine may attempt this operation again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::QuotaExceeded { .. } => true,
            // Network-level failures carry no status; transient server
            // errors are the 5xx set the API is known to emit.
            Error::Api { status, .. } => matches!(status, None | Some(500 | 502 | 503 | 504)),
            Error::Validation { .. }
            | Error::Authentication { .. }
            | Error::PaymentRequired { .. }
            | Error::Cancelled
            | Error::Configuration(_)
            | Error::Io(_) => false,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        // Connection refused/reset and timeouts all classify the same way:
        // a retryable API error with no status.
        Error::api(None, err.to_string())
    }
}

/// Pull a human-readable message out of a JSON error body, if there is one.
fn body_message(body: &[u8]) -> Option<String> {
    let json: serde_json::Value = serde_json::from_slice(body).ok()?;
    for key in ["error", "message", "detail"] {
        if let Some(msg) = json.get(key).and_then(|v| v.as_str()) {
            let msg = msg.trim();
            if !msg.is_empty() {
                return Some(msg.to_string());
            }
        }
    }
    None
}

/// Decide whether a 429 body reports the daily quota rather than transient
/// rate limiting. Defaults to rate limit when the body gives no signal.
fn quota_scope(body: &[u8], message: &str) -> QuotaScope {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(body) {
        if let Some(code) = json.get("code").and_then(|v| v.as_str()) {
            if code == "quota_exceeded" || code == "daily_quota_exceeded" {
                return QuotaScope::DailyQuota;
            }
        }
    }
    let lower = message.to_lowercase();
    if lower.contains("quota") || lower.contains("daily limit") {
        QuotaScope::DailyQuota
    } else {
        QuotaScope::RateLimit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_classify_and_never_retry() {
        let cases: Vec<(u16, fn(&Error) -> bool)> = vec![
            (401, |e| matches!(e, Error::Authentication { .. })),
            (403, |e| matches!(e, Error::Authentication { .. })),
            (402, |e| matches!(e, Error::PaymentRequired { .. })),
            (400, |e| matches!(e, Error::Validation { .. })),
            (422, |e| matches!(e, Error::Validation { .. })),
        ];
        for (status, is_kind) in cases {
            let err = Error::from_response(status, b"");
            assert!(is_kind(&err), "status {} classified as {:?}", status, err);
            assert!(!err.is_retryable(), "status {} must be terminal", status);
        }
    }

    #[test]
    fn transient_server_statuses_are_retryable() {
        for status in [500u16, 502, 503, 504] {
            let err = Error::from_response(status, b"upstream exploded");
            assert!(matches!(err, Error::Api { status: Some(s), .. } if s == status));
            assert!(err.is_retryable(), "status {} must be retryable", status);
        }
    }

    #[test]
    fn unlisted_statuses_are_terminal_api_errors() {
        for status in [404u16, 405, 409, 418, 501] {
            let err = Error::from_response(status, b"");
            assert!(matches!(err, Error::Api { status: Some(s), .. } if s == status));
            assert!(!err.is_retryable(), "status {} must be terminal", status);
        }
    }

    #[test]
    fn network_failure_is_retryable_api_error() {
        let err = Error::api(None, "connection reset by peer");
        assert!(err.is_retryable());
    }

    #[test]
    fn rate_limit_defaults_without_body_signal() {
        let err = Error::from_response(429, b"{\"error\": \"slow down\"}");
        match err {
            Error::QuotaExceeded { scope, message } => {
                assert_eq!(scope, QuotaScope::RateLimit);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected QuotaExceeded, got {:?}", other),
        }
    }

    #[test]
    fn daily_quota_detected_from_code_field() {
        let body = br#"{"code": "quota_exceeded", "error": "80 requests/day reached"}"#;
        let err = Error::from_response(429, body);
        assert!(matches!(
            err,
            Error::QuotaExceeded {
                scope: QuotaScope::DailyQuota,
                ..
            }
        ));
        assert!(err.is_retryable());
    }

    #[test]
    fn daily_quota_detected_from_message_text() {
        let body = br#"{"error": "Daily API quota exceeded"}"#;
        let err = Error::from_response(429, body);
        assert!(matches!(
            err,
            Error::QuotaExceeded {
                scope: QuotaScope::DailyQuota,
                ..
            }
        ));
    }

    #[test]
    fn error_message_extracted_from_json_body() {
        let err = Error::from_response(400, br#"{"error": "text is required"}"#);
        assert_eq!(err.to_string(), "Validation error: text is required");
    }

    #[test]
    fn malformed_body_falls_back_to_default_message() {
        let err = Error::from_response(400, b"<html>nope</html>");
        assert!(err.to_string().contains("Invalid request parameters"));
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(!Error::Cancelled.is_retryable());
    }
}
