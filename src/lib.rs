//! # yarntts
//!
//! Async Rust client for the YarnGPT text-to-speech API.
//!
//! The library submits synthesis jobs over HTTP and hands back audio bytes.
//! Around that single call it layers the things a production client needs:
//! bounded exponential-backoff retries, order-preserving batch execution with
//! a concurrency cap, cooperative cancellation, and an explicit session
//! lifecycle for the underlying connection pool.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use yarntts::{SpeechRequest, Voice, YarnTts};
//!
//! #[tokio::main]
//! async fn main() -> yarntts::Result<()> {
//!     let client = YarnTts::builder()
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let request = SpeechRequest::new("Welcome to Nigeria!").voice(Voice::Idera);
//!     let audio = client.synthesize(&request).await?;
//!     tokio::fs::write("welcome.mp3", &audio.data).await?;
//!
//!     client.close();
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, session lifecycle and cancellation handles |
//! | [`types`] | Voices, audio formats and speech requests |
//! | [`retry`] | Retry configuration and the backoff engine |
//! | [`batch`] | Batch execution modes and per-item results |
//! | [`transport`] | Single-attempt HTTP exchange with the remote API |
//! | [`error`] | Error taxonomy and HTTP status classification |
//!
//! ## Resilience model
//!
//! Every failed attempt is classified exactly once (see [`Error`]); the
//! classification alone decides retry eligibility. Validation,
//! authentication and billing failures are terminal. Rate limits and 5xx /
//! network failures retry up to [`retry::RetryConfig::max_retries`] with
//! full-jitter exponential backoff, then surface the last classified error.
//! Batches never short-circuit: each item resolves to its own slot in the
//! returned [`batch::BatchResult`], in submission order.

pub mod batch;
pub mod client;
pub mod error;
pub mod retry;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use batch::{BatchItemResult, BatchMode, BatchResult};
pub use client::{CallStats, CancelHandle, YarnTts, YarnTtsBuilder};
pub use error::{Error, QuotaScope};
pub use retry::RetryConfig;
pub use types::{AudioFormat, AudioOutput, SpeechRequest, Voice};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;
