//! Cancellation handles and per-call statistics.

use tokio_util::sync::CancellationToken;

/// Handle for cancelling an in-flight call or batch from another task.
///
/// Clones share the same underlying token. Cancelling abandons pending
/// backoff sleeps and in-flight transport calls; batch items that already
/// resolved keep their results.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Facts about one completed call, for application-layer observability.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallStats {
    /// Transport invocations made (always >= 1 on success).
    pub attempts: u32,
    /// Retries performed, i.e. `attempts - 1`.
    pub retry_count: u32,
    /// Wall-clock time across all attempts and backoff waits.
    pub duration_ms: u64,
}
