//! Speech translation engines.
//!
//! The [`SpeechTranslator`] trait is the boundary between the streaming
//! protocol and the actual model: PCM for one chunk in, translated segments
//! with chunk-local timing out. The real implementation is
//! [`whisper::WhisperEngine`]; [`MockTranslator`] stands in for it in tests.
//! [`pool::TranslatePool`] wraps an engine with decoding, filtering, offset
//! correction and bounded worker dispatch.

pub mod pool;
pub mod whisper;

pub use pool::TranslatePool;
pub use whisper::{WhisperEngine, WhisperEngineConfig};

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::defaults;
use crate::error::{LivesubError, Result};

/// One phrase as produced by the engine, timed from zero within its chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl EngineSegment {
    /// True when the trimmed text is empty or a non-speech placeholder.
    ///
    /// Whisper reports silence and music as pseudo-segments like
    /// `[BLANK_AUDIO]`; those must never surface as subtitles.
    pub fn is_noise(&self) -> bool {
        let trimmed = self.text.trim();
        trimmed.is_empty() || defaults::PLACEHOLDER_DENYLIST.contains(&trimmed)
    }

    /// Shift into global stream time by the chunk's declared start.
    pub fn into_subtitle(self, offset: f64) -> SubtitleSegment {
        SubtitleSegment {
            text: self.text.trim().to_string(),
            start: offset + self.start,
            end: offset + self.end,
        }
    }
}

/// One subtitle phrase in global stream time.
///
/// Serialized as-is (full precision) in the smoke-test response; the
/// WebSocket path wraps it in a `subtitle` event, which rounds on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleSegment {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

/// Trait for speech translation.
///
/// This trait allows swapping implementations (real Whisper vs mock). Calls
/// block for up to several seconds and must only run on worker threads,
/// never on the async runtime — that dispatch is [`pool::TranslatePool`]'s
/// job.
pub trait SpeechTranslator: Send + Sync {
    /// Translate one chunk of audio.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as 16-bit PCM at 16kHz mono
    ///
    /// # Returns
    /// Translated segments in chronological order, timed from the start of
    /// the chunk. No detected speech is an empty list, not an error.
    fn translate(&self, audio: &[i16]) -> Result<Vec<EngineSegment>>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the engine is ready for inference
    fn is_ready(&self) -> bool;
}

/// Implement SpeechTranslator for Arc<T> to allow sharing across connections.
impl<T: SpeechTranslator + ?Sized> SpeechTranslator for Arc<T> {
    fn translate(&self, audio: &[i16]) -> Result<Vec<EngineSegment>> {
        (**self).translate(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Build the configured translation engine.
///
/// `model_path` is the resolved GGML file location (see [`crate::models`]).
/// Unknown backend names are a startup error, not a fallback.
pub fn build_engine(
    config: &EngineConfig,
    model_path: &Path,
) -> Result<Arc<dyn SpeechTranslator>> {
    match config.backend.as_str() {
        "whisper" => {
            let engine = WhisperEngine::new(WhisperEngineConfig {
                model_path: model_path.to_path_buf(),
                model_name: config.model.clone(),
                language: config.language.clone(),
                use_gpu: config.gpu.enabled(),
            })?;
            Ok(Arc::new(engine))
        }
        other => Err(LivesubError::BackendUnknown {
            backend: other.to_string(),
        }),
    }
}

/// Mock translator for testing
#[derive(Debug, Clone)]
pub struct MockTranslator {
    model_name: String,
    segments: Vec<EngineSegment>,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with a single default segment
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            segments: vec![EngineSegment {
                text: "mock translation".to_string(),
                start: 0.0,
                end: 1.0,
            }],
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Configure the mock to return specific segments
    pub fn with_segments(mut self, segments: Vec<EngineSegment>) -> Self {
        self.segments = segments;
        self
    }

    /// Configure the mock to return one specific segment
    pub fn with_segment(self, text: &str, start: f64, end: f64) -> Self {
        self.with_segments(vec![EngineSegment {
            text: text.to_string(),
            start,
            end,
        }])
    }

    /// Configure the mock to fail on translate
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of times translate() has been invoked (shared across clones)
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SpeechTranslator for MockTranslator {
    fn translate(&self, _audio: &[i16]) -> Result<Vec<EngineSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            Err(LivesubError::EngineInference {
                message: "mock translation failure".to_string(),
            })
        } else {
            Ok(self.segments.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
