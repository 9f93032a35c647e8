//! Bounded worker pool for translation jobs.
//!
//! Decoding and inference are CPU-bound; both run on tokio's blocking thread
//! pool, with a semaphore capping how many chunks are in flight at once so a
//! burst of connections cannot pile unbounded work onto the machine.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::audio::decode_chunk;
use crate::defaults::MIN_CHUNK_BYTES;
use crate::engine::{SpeechTranslator, SubtitleSegment};
use crate::error::{LivesubError, Result};

/// Shared handle to the translation workers.
///
/// Cloning is cheap; all clones share the same engine and permit budget, so
/// one pool instance serves every connection.
#[derive(Clone)]
pub struct TranslatePool {
    engine: Arc<dyn SpeechTranslator>,
    permits: Arc<Semaphore>,
}

impl TranslatePool {
    /// Creates a pool running at most `workers` translations concurrently.
    pub fn new(engine: Arc<dyn SpeechTranslator>, workers: usize) -> Self {
        Self {
            engine,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    /// Decode and translate one audio chunk.
    ///
    /// Waits for a free worker slot, then runs decode + inference on the
    /// blocking thread pool. Segment timestamps come back shifted by
    /// `time_offset` so they land on the stream timeline rather than the
    /// chunk's own, and placeholder segments are already filtered out.
    pub async fn process(
        &self,
        audio: Vec<u8>,
        mime_type: &str,
        time_offset: f64,
    ) -> Result<Vec<SubtitleSegment>> {
        if audio.len() < MIN_CHUNK_BYTES {
            return Err(LivesubError::ChunkTooSmall { size: audio.len() });
        }

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| LivesubError::EngineInference {
                message: format!("Worker pool closed: {}", e),
            })?;

        let engine = self.engine.clone();
        let mime_type = mime_type.to_string();

        let segments = tokio::task::spawn_blocking(move || {
            let _permit = permit; // hold the slot until the job finishes

            let pcm = decode_chunk(&audio, &mime_type)?;
            let raw = engine.translate(&pcm)?;
            Ok::<_, LivesubError>(
                raw.into_iter()
                    .filter(|segment| !segment.is_noise())
                    .map(|segment| segment.into_subtitle(time_offset))
                    .collect::<Vec<_>>(),
            )
        })
        .await
        .map_err(|e| LivesubError::EngineInference {
            message: format!("Translation task panicked: {}", e),
        })??;

        Ok(segments)
    }

    /// Name of the model behind the pool.
    pub fn model_name(&self) -> &str {
        self.engine.model_name()
    }

    /// Whether the engine is loaded and ready for work.
    pub fn is_ready(&self) -> bool {
        self.engine.is_ready()
    }
}
