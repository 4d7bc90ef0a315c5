//! Retry configuration and the backoff engine.
//!
//! The engine wraps one logical operation (one transport call) in a bounded
//! retry loop. It never inspects status codes itself: whether a failure may
//! be retried is decided entirely by [`Error::is_retryable`]. The backoff
//! sleep is a cancellable timer, so a pending wait can be abandoned promptly.

use crate::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Retry behavior for failed requests.
///
/// A plain value: the engine never mutates it, and different batches may run
/// with different configs at the same time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retry attempts beyond the first try. `0` means exactly one attempt.
    pub max_retries: u32,
    /// Multiplicative growth per attempt; the n-th wait ceiling is
    /// `backoff_factor ^ n` seconds.
    pub backoff_factor: f64,
    /// Ceiling on any single wait, in seconds.
    pub max_backoff_secs: f64,
    /// Full jitter: draw each wait uniformly from `[0, ceiling]` to
    /// desynchronize concurrent retriers.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: 2.0,
            max_backoff_secs: 60.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn backoff_factor(mut self, factor: f64) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn max_backoff_secs(mut self, secs: f64) -> Self {
        self.max_backoff_secs = secs;
        self
    }

    pub fn jitter(mut self, enabled: bool) -> Self {
        self.jitter = enabled;
        self
    }

    /// Validate invariants. Called once at client build time.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(Error::configuration("backoff_factor must be >= 1"));
        }
        if !self.max_backoff_secs.is_finite() || self.max_backoff_secs <= 0.0 {
            return Err(Error::configuration("max_backoff_secs must be > 0"));
        }
        Ok(())
    }

    /// Wait ceiling before the retry following `attempt` (0-based):
    /// `min(max_backoff, backoff_factor ^ attempt)` seconds.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let secs = self
            .backoff_factor
            .powi(attempt.min(i32::MAX as u32) as i32)
            .min(self.max_backoff_secs);
        Duration::from_secs_f64(secs)
    }

    /// Concrete wait before the retry following `attempt`; equals the
    /// ceiling when jitter is off, otherwise uniform in `[0, ceiling]`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let ceiling = self.backoff_ceiling(attempt);
        if self.jitter {
            let secs = rand::thread_rng().gen_range(0.0..=ceiling.as_secs_f64());
            Duration::from_secs_f64(secs)
        } else {
            ceiling
        }
    }
}

/// Run `op` under `config`, sleeping between retryable failures.
///
/// Returns the first success, or the last classified error once the failure
/// is terminal or the budget is spent. There is no separate "retries
/// exhausted" error: what the final attempt produced is what the caller sees.
pub async fn execute<T, F, Fut>(config: &RetryConfig, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let never = CancellationToken::new();
    execute_with_attempts(config, &never, op).await.map(|(v, _)| v)
}

/// Like [`execute`], abandoning in-flight attempts and pending backoff
/// sleeps when `cancel` fires. Cancellation surfaces as [`Error::Cancelled`].
pub async fn execute_cancellable<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    execute_with_attempts(config, cancel, op).await.map(|(v, _)| v)
}

/// Core loop; on success also reports how many attempts were made (>= 1).
pub(crate) async fn execute_with_attempts<T, F, Fut>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<(T, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    // Fresh counter per invocation; the config itself is never touched.
    let mut attempt: u32 = 0;
    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            outcome = op() => outcome,
        };

        let err = match outcome {
            Ok(value) => return Ok((value, attempt + 1)),
            Err(err) => err,
        };

        if !err.is_retryable() {
            debug!(attempt, error = %err, "terminal error, not retrying");
            return Err(err);
        }
        if attempt >= config.max_retries {
            warn!(
                attempts = attempt + 1,
                error = %err,
                "retry budget exhausted, surfacing last error"
            );
            return Err(err);
        }

        let delay = config.backoff_delay(attempt);
        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "retrying after backoff"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
    }
}
