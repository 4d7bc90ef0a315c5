//! Batch execution: fan a set of independent synthesis jobs out under a
//! concurrency bound and report one outcome per submitted item.
//!
//! A batch never short-circuits. Each item resolves to its own slot, in
//! submission order, no matter which siblings fail; retries happen inside
//! each item's own engine invocation, never at the batch level.

use crate::{Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default permit count for [`BatchMode::Concurrent`]. The transport's
/// connection pool is the hard limiter; this keeps a large batch from
/// stampeding it.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// How a batch schedules its items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// One item at a time, in submission order; each item finishes its whole
    /// retry loop before the next begins.
    Sequential,
    /// Items run as independent tasks against the shared session, at most
    /// `max_concurrency` in flight. Completion order is unconstrained; the
    /// result sequence is still submission order.
    Concurrent { max_concurrency: usize },
}

impl BatchMode {
    /// Concurrent mode with the default permit count.
    pub fn concurrent() -> Self {
        BatchMode::Concurrent {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Default for BatchMode {
    fn default() -> Self {
        BatchMode::concurrent()
    }
}

/// Outcome of one batch entry, paired with its submission index.
#[derive(Debug)]
pub struct BatchItemResult<T> {
    pub index: usize,
    pub outcome: Result<T>,
}

/// Ordered outcomes of a batch: exactly one slot per submitted item.
#[derive(Debug)]
pub struct BatchResult<T> {
    items: Vec<BatchItemResult<T>>,
}

impl<T> BatchResult<T> {
    pub(crate) fn new(items: Vec<BatchItemResult<T>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn all_succeeded(&self) -> bool {
        self.items.iter().all(|item| item.outcome.is_ok())
    }

    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BatchItemResult<T>> {
        self.items.iter()
    }

    /// Outcome of the item submitted at `index`.
    pub fn get(&self, index: usize) -> Option<&Result<T>> {
        self.items.get(index).map(|item| &item.outcome)
    }

    /// Consume the batch, yielding the outcomes in submission order.
    pub fn into_outcomes(self) -> Vec<Result<T>> {
        self.items.into_iter().map(|item| item.outcome).collect()
    }
}

impl<T> IntoIterator for BatchResult<T> {
    type Item = BatchItemResult<T>;
    type IntoIter = std::vec::IntoIter<BatchItemResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Run `op(index)` for every index in `0..count` under `mode`.
///
/// Cancellation marks items that have not finished as [`Error::Cancelled`];
/// outcomes that already resolved are kept and returned.
pub(crate) async fn run_batch<T, F, Fut>(
    count: usize,
    mode: BatchMode,
    cancel: &CancellationToken,
    op: F,
) -> BatchResult<T>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match mode {
        BatchMode::Sequential => {
            debug!(count, "running batch sequentially");
            let mut items = Vec::with_capacity(count);
            for index in 0..count {
                let outcome = if cancel.is_cancelled() {
                    Err(Error::Cancelled)
                } else {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(Error::Cancelled),
                        outcome = op(index) => outcome,
                    }
                };
                items.push(BatchItemResult { index, outcome });
            }
            BatchResult::new(items)
        }
        BatchMode::Concurrent { max_concurrency } => {
            let permits = max_concurrency.max(1);
            debug!(count, permits, "running batch concurrently");
            let semaphore = Arc::new(Semaphore::new(permits));
            let op = &op;
            // join_all dispatches in submission order and re-assembles the
            // outputs in that same order, whatever the completion order.
            let items = futures::future::join_all((0..count).map(|index| {
                let semaphore = semaphore.clone();
                async move {
                    let outcome = async {
                        let _permit = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(Error::Cancelled),
                            permit = semaphore.acquire() => {
                                permit.map_err(|_| Error::Cancelled)?
                            }
                        };
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => Err(Error::Cancelled),
                            outcome = op(index) => outcome,
                        }
                    }
                    .await;
                    BatchItemResult { index, outcome }
                }
            }))
            .await;
            BatchResult::new(items)
        }
    }
}
