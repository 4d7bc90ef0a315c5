//! The client: single calls, batches, files, lifecycle.

use crate::batch::{self, BatchMode, BatchResult};
use crate::client::builder::YarnTtsBuilder;
use crate::client::session::ClientSession;
use crate::client::types::{CallStats, CancelHandle};
use crate::retry::{self, RetryConfig};
use crate::types::{AudioOutput, SpeechRequest};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Async client for the YarnGPT text-to-speech API.
///
/// Cheap to clone; clones share one session (one connection pool, one
/// credential, one retry policy). `close()` on any clone closes them all.
#[derive(Clone)]
pub struct YarnTts {
    session: Arc<ClientSession>,
    retry: RetryConfig,
}

impl std::fmt::Debug for YarnTts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YarnTts").finish_non_exhaustive()
    }
}

impl YarnTts {
    pub fn builder() -> YarnTtsBuilder {
        YarnTtsBuilder::new()
    }

    pub(crate) fn from_parts(session: Arc<ClientSession>, retry: RetryConfig) -> Self {
        Self { session, retry }
    }

    /// The retry policy this client applies to every call.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// A copy of this client with a different retry policy, sharing the same
    /// session. Lets batches with different policies coexist safely.
    pub fn with_retry_config(&self, retry: RetryConfig) -> Result<Self> {
        retry.validate()?;
        Ok(Self {
            session: self.session.clone(),
            retry,
        })
    }

    /// Convert text to speech, retrying per the client's [`RetryConfig`].
    pub async fn synthesize(&self, request: &SpeechRequest) -> Result<AudioOutput> {
        let never = CancellationToken::new();
        let (audio, _stats) = self.synthesize_inner(request, &never).await?;
        Ok(audio)
    }

    /// Like [`synthesize`](Self::synthesize), also reporting attempt counts
    /// and wall-clock duration.
    pub async fn synthesize_with_stats(
        &self,
        request: &SpeechRequest,
    ) -> Result<(AudioOutput, CallStats)> {
        let never = CancellationToken::new();
        self.synthesize_inner(request, &never).await
    }

    /// Like [`synthesize`](Self::synthesize), abandoning in-flight attempts
    /// and pending backoff waits when `cancel` fires.
    pub async fn synthesize_cancellable(
        &self,
        request: &SpeechRequest,
        cancel: &CancelHandle,
    ) -> Result<AudioOutput> {
        let (audio, _stats) = self.synthesize_inner(request, cancel.token()).await?;
        Ok(audio)
    }

    /// Convert text to speech and write the audio to `path`, creating parent
    /// directories as needed.
    pub async fn synthesize_to_file(
        &self,
        request: &SpeechRequest,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let audio = self.synthesize(request).await?;
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(&path, &audio.data).await?;
        Ok(path)
    }

    /// Convert a batch of requests, one outcome per item in submission
    /// order. One item's failure never aborts its siblings.
    pub async fn synthesize_batch(
        &self,
        requests: &[SpeechRequest],
        mode: BatchMode,
    ) -> BatchResult<AudioOutput> {
        let handle = CancelHandle::new();
        self.synthesize_batch_cancellable(requests, mode, &handle)
            .await
    }

    /// Like [`synthesize_batch`](Self::synthesize_batch) with cooperative
    /// cancellation: items that already resolved keep their outcomes, items
    /// still pending resolve to [`Error::Cancelled`].
    pub async fn synthesize_batch_cancellable(
        &self,
        requests: &[SpeechRequest],
        mode: BatchMode,
        cancel: &CancelHandle,
    ) -> BatchResult<AudioOutput> {
        batch::run_batch(requests.len(), mode, cancel.token(), |index| {
            let request = &requests[index];
            async move {
                let (audio, _stats) = self.synthesize_inner(request, cancel.token()).await?;
                Ok(audio)
            }
        })
        .await
    }

    /// Convert a batch of requests and write each result to
    /// `output_dir/{prefix}_{index}.{ext}`. The returned batch pairs each
    /// submission index with the written path or the item's error.
    pub async fn synthesize_batch_to_files(
        &self,
        requests: &[SpeechRequest],
        output_dir: impl AsRef<Path>,
        prefix: &str,
        mode: BatchMode,
    ) -> Result<BatchResult<PathBuf>> {
        let output_dir = output_dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&output_dir).await?;

        let handle = CancelHandle::new();
        let token = handle.token();
        let result = batch::run_batch(requests.len(), mode, token, |index| {
            let request = &requests[index];
            let path = output_dir.join(format!(
                "{}_{}.{}",
                prefix,
                index,
                request.output_format().extension()
            ));
            async move {
                let (audio, _stats) = self.synthesize_inner(request, token).await?;
                tokio::fs::write(&path, &audio.data).await?;
                Ok(path)
            }
        })
        .await;
        Ok(result)
    }

    /// Close the session. Idempotent; later calls through any clone panic
    /// (use-after-close is a programming error).
    pub fn close(&self) {
        self.session.close();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    /// One validated call through the retry engine.
    async fn synthesize_inner(
        &self,
        request: &SpeechRequest,
        cancel: &CancellationToken,
    ) -> Result<(AudioOutput, CallStats)> {
        // Invalid requests never reach the transport, and never retry.
        request.validate()?;

        let start = Instant::now();
        let (audio, attempts) = retry::execute_with_attempts(&self.retry, cancel, || {
            let transport = self.session.transport();
            async move {
                let raw = transport.execute(request).await?;
                if raw.is_success() {
                    Ok(AudioOutput {
                        data: raw.body.to_vec(),
                        format: request.output_format(),
                    })
                } else {
                    Err(Error::from_response(raw.status, &raw.body))
                }
            }
        })
        .await?;

        let stats = CallStats {
            attempts,
            retry_count: attempts.saturating_sub(1),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        debug!(
            attempts = stats.attempts,
            duration_ms = stats.duration_ms,
            bytes = audio.len(),
            "synthesis complete"
        );
        Ok((audio, stats))
    }
}
