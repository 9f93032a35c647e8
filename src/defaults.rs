//! Default configuration constants for livesub.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Audio sample rate in Hz fed to the translation engine.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency; every decoded chunk is
/// resampled to this rate.
pub const SAMPLE_RATE: u32 = 16000;

/// Minimum binary frame size, in bytes, worth decoding.
///
/// Anything smaller cannot plausibly contain audio — container headers alone
/// exceed this for every supported format. Undersized frames are skipped
/// without touching the stream clock.
pub const MIN_CHUNK_BYTES: usize = 512;

/// Default chunk duration in seconds, used when a descriptor omits `end`.
///
/// Matches the capture interval the browser extension records at.
pub const DEFAULT_CHUNK_SECONDS: f64 = 5.0;

/// Default MIME type assumed for a binary frame whose descriptor omits it.
///
/// MediaRecorder in Chromium produces WebM containers by default.
pub const DEFAULT_MIME_TYPE: &str = "audio/webm";

/// Placeholder tokens Whisper emits for non-speech audio.
///
/// Segments whose trimmed text equals one of these are dropped and never
/// surface as subtitles.
pub const PLACEHOLDER_DENYLIST: &[&str] = &["[BLANK_AUDIO]", "[Music]", "(Music)"];

/// Default Whisper model name.
///
/// "small" (multilingual) is the smallest model with usable translation
/// quality for Hebrew input. Larger models trade latency for accuracy.
pub const DEFAULT_MODEL: &str = "small";

/// Default source language code for translation.
///
/// The stream is assumed to be Hebrew speech unless configured otherwise;
/// output is always English (Whisper's translate task).
pub const DEFAULT_LANGUAGE: &str = "he";

/// Default translation engine backend.
pub const DEFAULT_BACKEND: &str = "whisper";

/// Default server bind address.
///
/// The browser extension connects to localhost; binding wider than loopback
/// is an explicit configuration choice.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Default number of concurrent decode/translate workers.
///
/// Bounds how many chunks (across all connections) may occupy blocking
/// worker threads at once. Inference itself is additionally serialized by
/// the engine when the backend is not thread-safe.
pub const DEFAULT_WORKERS: usize = 2;

/// Beam width for Whisper's beam-search decoding.
pub const BEAM_SIZE: i32 = 5;

/// Segments with a no-speech probability above this are considered silence.
pub const NO_SPEECH_THRESHOLD: f32 = 0.55;

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}

/// Whether this build can run inference on a GPU at all.
pub fn gpu_available() -> bool {
    cfg!(any(
        feature = "cuda",
        feature = "vulkan",
        feature = "hipblas",
        feature = "openblas"
    ))
}
