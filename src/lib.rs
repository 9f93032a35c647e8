//! livesub - Live speech-translation subtitles for streamed browser audio
//!
//! A WebSocket backend that turns timestamped audio chunks into translated
//! English subtitle events, powered by Whisper's translate task.

// Enforce error handling discipline in library code
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod engine;
pub mod error;
pub mod models;
pub mod protocol;
pub mod server;
pub mod session;

// Core trait (PCM chunk in → translated segments out)
pub use engine::{EngineSegment, MockTranslator, SpeechTranslator, build_engine};

// Chunk pipeline
pub use engine::{SubtitleSegment, TranslatePool};
pub use session::Session;

// Wire protocol
pub use protocol::{ClientMessage, ServerMessage};

// Error handling
pub use error::{LivesubError, Result};

// Config
pub use config::Config;

// Server surface (embeddable in other binaries and test harnesses)
pub use server::{AppState, router, serve};

/// Build version string with optional git commit hash.
///
/// Returns `"0.2.0+abc1234"` when git hash is available, `"0.2.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
