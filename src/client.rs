//! Client surface for the YarnGPT TTS API.
//!
//! Keep the public surface small and predictable. Implementation details are
//! split into submodules under `src/client/`.

pub mod builder;
pub mod core;
mod session;
pub mod types;

pub use builder::YarnTtsBuilder;
pub use core::YarnTts;
pub use types::{CallStats, CancelHandle};
