//! Whisper-based speech translation.
//!
//! Runs whisper.cpp through whisper-rs with the translate task enabled, so
//! whatever the source language is, segments come out in English.
//!
//! # Feature Gate
//!
//! This module requires the `whisper` feature to be enabled and cmake to be
//! installed. To build with Whisper support:
//!
//! ```bash
//! cargo build --features whisper
//! ```

use crate::defaults;
use crate::engine::{EngineSegment, SpeechTranslator};
use crate::error::{LivesubError, Result};
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for the Whisper engine.
#[derive(Debug, Clone)]
pub struct WhisperEngineConfig {
    /// Path to the GGML model file
    pub model_path: PathBuf,
    /// Short model name reported on the health endpoint (e.g. "small")
    pub model_name: String,
    /// Source language code (e.g. "he"), or "auto" for detection
    pub language: String,
    /// Whether to offload inference to the GPU
    pub use_gpu: bool,
}

impl Default for WhisperEngineConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ggml-small.bin"),
            model_name: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            use_gpu: false,
        }
    }
}

/// Whisper implementation of [`SpeechTranslator`].
///
/// whisper.cpp states are not safe to share, so the context sits behind a
/// Mutex and inference runs one chunk at a time. Concurrency above this
/// level comes from [`crate::engine::TranslatePool`], which keeps decode
/// work off the engine lock.
///
/// # Feature Gate
///
/// The real implementation is only available with the `whisper` feature.
#[cfg(feature = "whisper")]
pub struct WhisperEngine {
    context: Mutex<WhisperContext>,
    config: WhisperEngineConfig,
}

#[cfg(feature = "whisper")]
impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("config", &self.config)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

/// Whisper engine placeholder (without the whisper feature).
///
/// A stub that reports not-ready and fails every translate call. Enable the
/// `whisper` feature for real inference.
#[cfg(not(feature = "whisper"))]
#[derive(Debug)]
pub struct WhisperEngine {
    config: WhisperEngineConfig,
}

#[cfg(feature = "whisper")]
impl WhisperEngine {
    /// Load the model and prepare the engine.
    ///
    /// # Errors
    /// Returns `LivesubError::ModelNotFound` if the model file doesn't exist
    /// and `LivesubError::EngineLoad` if whisper.cpp rejects it.
    pub fn new(config: WhisperEngineConfig) -> Result<Self> {
        // Route whisper.cpp's own output through the log hooks (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(LivesubError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(config.use_gpu);
        // Fused attention kernels; also avoids the standalone softmax CUDA
        // kernel that crashes on Blackwell GPUs with older ggml
        context_params.flash_attn(config.use_gpu);

        let context = WhisperContext::new_with_params(
            config
                .model_path
                .to_str()
                .ok_or_else(|| LivesubError::EngineLoad {
                    message: "Invalid UTF-8 in model path".to_string(),
                })?,
            context_params,
        )
        .map_err(|e| LivesubError::EngineLoad {
            message: format!("Failed to load Whisper model: {}", e),
        })?;

        Ok(Self {
            context: Mutex::new(context),
            config,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperEngineConfig {
        &self.config
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
    ///
    /// Whisper expects audio in f32 format normalized to the range
    /// [-1.0, 1.0]. Input is 16-bit PCM where samples range from -32768
    /// to 32767.
    fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

#[cfg(not(feature = "whisper"))]
impl WhisperEngine {
    /// Create a new Whisper engine (stub implementation).
    ///
    /// Checks the model file like the real engine so configuration errors
    /// surface the same way, but every translate call fails.
    pub fn new(config: WhisperEngineConfig) -> Result<Self> {
        if !config.model_path.exists() {
            return Err(LivesubError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        Ok(Self { config })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperEngineConfig {
        &self.config
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
    ///
    /// This function is available even without the whisper feature for
    /// testing.
    pub fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

#[cfg(feature = "whisper")]
impl SpeechTranslator for WhisperEngine {
    fn translate(&self, audio: &[i16]) -> Result<Vec<EngineSegment>> {
        let audio_f32 = Self::convert_audio(audio);

        // One inference at a time; whisper states are not thread-safe
        let context = self
            .context
            .lock()
            .map_err(|e| LivesubError::EngineInference {
                message: format!("Failed to acquire context lock: {}", e),
            })?;

        let mut state = context
            .create_state()
            .map_err(|e| LivesubError::EngineInference {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: defaults::BEAM_SIZE,
            patience: -1.0,
        });

        // Translate to English rather than transcribe in place
        params.set_translate(true);
        if self.config.language == "auto" {
            params.set_language(None);
        } else {
            params.set_language(Some(&self.config.language));
        }
        params.set_temperature(0.0);

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| LivesubError::EngineInference {
                message: format!("Whisper inference failed: {}", e),
            })?;

        // Timestamps are in centiseconds; segments that are probably silence
        // get dropped here rather than surfacing as noise subtitles
        let mut segments = Vec::new();
        for segment in state.as_iter() {
            if segment.no_speech_probability() > defaults::NO_SPEECH_THRESHOLD {
                continue;
            }
            segments.push(EngineSegment {
                text: segment.to_string(),
                start: segment.start_timestamp() as f64 / 100.0,
                end: segment.end_timestamp() as f64 / 100.0,
            });
        }

        Ok(segments)
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }

    fn is_ready(&self) -> bool {
        true
    }
}

#[cfg(not(feature = "whisper"))]
impl SpeechTranslator for WhisperEngine {
    fn translate(&self, _audio: &[i16]) -> Result<Vec<EngineSegment>> {
        Err(LivesubError::EngineInference {
            message: concat!(
                "Whisper feature not enabled. This binary was built without speech translation.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            )
            .to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model_name
    }

    fn is_ready(&self) -> bool {
        false
    }
}
