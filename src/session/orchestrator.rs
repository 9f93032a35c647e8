//! Per-connection chunk orchestration.
//!
//! A [`Session`] pairs each metadata frame with the binary frame that
//! follows it, turns the pair into a translation job, and maintains the
//! stream clock that anchors chunk-local timestamps on the shared timeline.
//! It speaks [`ServerMessage`] values; the WebSocket layer owns the wire.

use tracing::{debug, info, warn};

use crate::defaults;
use crate::engine::TranslatePool;
use crate::error::LivesubError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::clock::StreamClock;

/// Parsed metadata waiting for its binary frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDescriptor {
    pub index: i64,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub mime_type: Option<String>,
}

impl Default for ChunkDescriptor {
    fn default() -> Self {
        Self {
            index: -1,
            start: None,
            end: None,
            mime_type: None,
        }
    }
}

impl ChunkDescriptor {
    /// Fill the gaps with stream-clock fallbacks.
    ///
    /// A missing start lands the chunk at the current clock position; a
    /// missing end assumes the capture interval; a missing MIME type assumes
    /// what MediaRecorder sends by default.
    pub fn resolve(self, clock_seconds: f64) -> ResolvedChunk {
        let start = self.start.unwrap_or(clock_seconds);
        let end = self.end.unwrap_or(start + defaults::DEFAULT_CHUNK_SECONDS);
        ResolvedChunk {
            index: self.index,
            start,
            end,
            mime_type: self
                .mime_type
                .unwrap_or_else(|| defaults::DEFAULT_MIME_TYPE.to_string()),
        }
    }
}

/// A chunk with every field settled, ready for the pool.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChunk {
    pub index: i64,
    pub start: f64,
    pub end: f64,
    pub mime_type: String,
}

impl ResolvedChunk {
    /// Declared duration; the stream clock advances by this whether or not
    /// the translation succeeds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// State for one client connection.
pub struct Session {
    pool: TranslatePool,
    clock: StreamClock,
    pending: Option<ChunkDescriptor>,
}

impl Session {
    /// Creates a session drawing workers from the shared pool.
    pub fn new(pool: TranslatePool) -> Self {
        Self {
            pool,
            clock: StreamClock::new(),
            pending: None,
        }
    }

    /// Handle one metadata (text) frame.
    ///
    /// A valid chunk descriptor replaces any pending one and is acknowledged
    /// immediately, before its audio arrives. A malformed frame is reported
    /// and changes nothing: a descriptor already waiting stays in place for
    /// the binary frame it belongs to.
    pub fn on_metadata(&mut self, text: &str) -> ServerMessage {
        match ClientMessage::from_json(text) {
            Ok(ClientMessage::Chunk {
                index,
                start,
                end,
                mime_type,
            }) => {
                self.pending = Some(ChunkDescriptor {
                    index,
                    start,
                    end,
                    mime_type,
                });
                ServerMessage::Ack { index }
            }
            Err(e) => {
                warn!(error = %e, "rejected metadata frame");
                ServerMessage::Error {
                    message: LivesubError::BadMetadata {
                        message: e.to_string(),
                    }
                    .to_string(),
                }
            }
        }
    }

    /// Handle one binary (audio) frame.
    ///
    /// Consumes the pending descriptor (or synthesizes defaults when none is
    /// waiting), runs the chunk through the pool, and advances the stream
    /// clock by the declared duration whether translation succeeded or not.
    /// Frames too small to be a real container are dropped entirely: no
    /// descriptor consumed, no clock movement, no reply.
    pub async fn on_audio(&mut self, audio: Vec<u8>) -> Vec<ServerMessage> {
        if audio.len() < defaults::MIN_CHUNK_BYTES {
            debug!(bytes = audio.len(), "ignoring undersized audio frame");
            return Vec::new();
        }

        let chunk = self
            .pending
            .take()
            .unwrap_or_default()
            .resolve(self.clock.elapsed());
        info!(
            index = chunk.index,
            start = chunk.start,
            end = chunk.end,
            bytes = audio.len(),
            "processing chunk"
        );

        let duration = chunk.duration();
        let replies = match self
            .pool
            .process(audio, &chunk.mime_type, chunk.start)
            .await
        {
            Ok(segments) => segments
                .into_iter()
                .map(|s| ServerMessage::Subtitle {
                    text: s.text,
                    start: s.start,
                    end: s.end,
                })
                .collect(),
            Err(e) => {
                warn!(index = chunk.index, error = %e, "chunk translation failed");
                vec![ServerMessage::Error {
                    message: e.to_string(),
                }]
            }
        };

        self.clock.advance(duration);
        replies
    }

    /// Stream clock position in seconds.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// Whether a descriptor is waiting for its binary frame.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{MockTranslator, TranslatePool};
    use std::io::Cursor;
    use std::sync::Arc;

    fn make_wav_data(samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    fn make_session(mock: &MockTranslator) -> Session {
        Session::new(TranslatePool::new(Arc::new(mock.clone()), 2))
    }

    fn wav_chunk() -> Vec<u8> {
        make_wav_data(&vec![100i16; 16000])
    }

    #[test]
    fn test_metadata_ack_echoes_index() {
        let mock = MockTranslator::new("test-model");
        let mut session = make_session(&mock);

        let reply = session.on_metadata(
            r#"{"event":"chunk","index":3,"start":0.0,"end":5.0,"mimeType":"audio/wav"}"#,
        );
        assert_eq!(reply, ServerMessage::Ack { index: 3 });
        assert!(session.has_pending());
    }

    #[test]
    fn test_metadata_ack_defaults_missing_index() {
        let mock = MockTranslator::new("test-model");
        let mut session = make_session(&mock);

        let reply = session.on_metadata(r#"{"event":"chunk"}"#);
        assert_eq!(reply, ServerMessage::Ack { index: -1 });
    }

    #[test]
    fn test_malformed_metadata_reports_bad_json() {
        let mock = MockTranslator::new("test-model");
        let mut session = make_session(&mock);

        let reply = session.on_metadata("{not json");
        match reply {
            ServerMessage::Error { message } => {
                assert!(message.starts_with("Bad JSON:"), "got: {}", message);
            }
            other => panic!("Expected Error, got {:?}", other),
        }
        assert!(!session.has_pending());
    }

    #[test]
    fn test_non_chunk_event_is_rejected() {
        let mock = MockTranslator::new("test-model");
        let mut session = make_session(&mock);

        for payload in [r#"{"event":"stop"}"#, "{}", "[1,2,3]"] {
            let reply = session.on_metadata(payload);
            assert!(
                matches!(reply, ServerMessage::Error { .. }),
                "payload {} should be rejected",
                payload
            );
        }
    }

    #[tokio::test]
    async fn test_malformed_metadata_leaves_pending_descriptor_in_place() {
        let mock = MockTranslator::new("test-model").with_segment("text", 0.0, 1.0);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":1,"start":40.0,"end":45.0,"mimeType":"audio/wav"}"#,
        );
        let reply = session.on_metadata("garbage");
        assert!(matches!(reply, ServerMessage::Error { .. }));
        assert!(session.has_pending());

        // The audio that follows still belongs to the valid descriptor
        let replies = session.on_audio(wav_chunk()).await;
        match &replies[0] {
            ServerMessage::Subtitle { start, .. } => assert!((start - 40.0).abs() < 1e-9),
            other => panic!("Expected Subtitle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_audio_without_metadata_falls_back_to_clock() {
        let mock = MockTranslator::new("test-model").with_segment("text", 0.0, 1.0);
        let mut session = make_session(&mock);

        // No descriptor at all: chunk lands at clock zero with the default
        // MIME type. The WAV payload still decodes because the container
        // probe goes by content, not by the declared type.
        let replies = session.on_audio(wav_chunk()).await;
        match &replies[0] {
            ServerMessage::Subtitle { start, .. } => assert_eq!(*start, 0.0),
            other => panic!("Expected Subtitle, got {:?}", other),
        }

        // Clock advanced by the default chunk duration
        assert!((session.elapsed() - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_clock_anchors_successive_bare_chunks() {
        let mock = MockTranslator::new("test-model").with_segment("text", 0.5, 1.0);
        let mut session = make_session(&mock);

        // Metadata without timing: start falls back to the clock
        session.on_metadata(r#"{"event":"chunk","index":0,"mimeType":"audio/wav"}"#);
        let first = session.on_audio(wav_chunk()).await;
        session.on_metadata(r#"{"event":"chunk","index":1,"mimeType":"audio/wav"}"#);
        let second = session.on_audio(wav_chunk()).await;

        match (&first[0], &second[0]) {
            (
                ServerMessage::Subtitle { start: s1, .. },
                ServerMessage::Subtitle { start: s2, .. },
            ) => {
                assert!((s1 - 0.5).abs() < 1e-9);
                assert!((s2 - 5.5).abs() < 1e-9, "second chunk at clock 5.0");
            }
            other => panic!("Expected subtitles, got {:?}", other),
        }
        assert!((session.elapsed() - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_declared_times_override_clock() {
        let mock = MockTranslator::new("test-model").with_segment("text", 1.0, 2.0);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":0,"start":30.0,"end":32.5,"mimeType":"audio/wav"}"#,
        );
        let replies = session.on_audio(wav_chunk()).await;

        match &replies[0] {
            ServerMessage::Subtitle { start, end, .. } => {
                assert!((start - 31.0).abs() < 1e-9);
                assert!((end - 32.0).abs() < 1e-9);
            }
            other => panic!("Expected Subtitle, got {:?}", other),
        }
        // Clock advanced by the declared duration, not the default
        assert!((session.elapsed() - 2.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_clock_advances_on_engine_failure() {
        let mock = MockTranslator::new("test-model").with_failure();
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":2,"start":0.0,"end":4.0,"mimeType":"audio/wav"}"#,
        );
        let replies = session.on_audio(wav_chunk()).await;

        assert_eq!(replies.len(), 1);
        match &replies[0] {
            ServerMessage::Error { message } => {
                assert_eq!(message, "Translation failed: mock translation failure");
            }
            other => panic!("Expected Error, got {:?}", other),
        }
        assert!((session.elapsed() - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_decode_failure_reports_error_and_advances_clock() {
        let mock = MockTranslator::new("test-model");
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":0,"start":0.0,"end":5.0,"mimeType":"audio/wav"}"#,
        );
        let garbage: Vec<u8> = (0..600).map(|i| ((i * 19 + 3) % 256) as u8).collect();
        let replies = session.on_audio(garbage).await;

        assert!(matches!(replies[0], ServerMessage::Error { .. }));
        assert_eq!(mock.call_count(), 0);
        assert!((session.elapsed() - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_undersized_audio_is_a_complete_no_op() {
        let mock = MockTranslator::new("test-model").with_segment("text", 0.0, 1.0);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":7,"start":100.0,"end":105.0,"mimeType":"audio/wav"}"#,
        );
        let replies = session.on_audio(vec![0u8; 100]).await;

        assert!(replies.is_empty());
        assert_eq!(session.elapsed(), 0.0);
        assert!(session.has_pending(), "descriptor must survive the runt frame");
        assert_eq!(mock.call_count(), 0);

        // The next real frame still pairs with the waiting descriptor
        let replies = session.on_audio(wav_chunk()).await;
        match &replies[0] {
            ServerMessage::Subtitle { start, .. } => assert!((start - 100.0).abs() < 1e-9),
            other => panic!("Expected Subtitle, got {:?}", other),
        }
        assert!((session.elapsed() - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_descriptor_is_consumed_by_its_audio_frame() {
        let mock = MockTranslator::new("test-model").with_segment("text", 0.0, 1.0);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":0,"start":10.0,"end":11.0,"mimeType":"audio/wav"}"#,
        );
        session.on_audio(wav_chunk()).await;
        assert!(!session.has_pending());
    }

    #[tokio::test]
    async fn test_new_metadata_replaces_pending_descriptor() {
        let mock = MockTranslator::new("test-model").with_segment("text", 0.0, 1.0);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":1,"start":10.0,"end":15.0,"mimeType":"audio/wav"}"#,
        );
        session.on_metadata(
            r#"{"event":"chunk","index":2,"start":20.0,"end":25.0,"mimeType":"audio/wav"}"#,
        );
        let replies = session.on_audio(wav_chunk()).await;

        match &replies[0] {
            ServerMessage::Subtitle { start, .. } => assert!((start - 20.0).abs() < 1e-9),
            other => panic!("Expected Subtitle, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_placeholder_segments_produce_no_replies() {
        let mock = MockTranslator::new("test-model").with_segment("[Music]", 0.0, 1.0);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":0,"start":0.0,"end":5.0,"mimeType":"audio/wav"}"#,
        );
        let replies = session.on_audio(wav_chunk()).await;

        assert!(replies.is_empty());
        assert_eq!(mock.call_count(), 1);
        assert!((session.elapsed() - 5.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_multiple_segments_each_become_a_subtitle() {
        use crate::engine::EngineSegment;

        let mock = MockTranslator::new("test-model").with_segments(vec![
            EngineSegment {
                text: "first".to_string(),
                start: 0.0,
                end: 2.0,
            },
            EngineSegment {
                text: "second".to_string(),
                start: 2.0,
                end: 4.0,
            },
        ]);
        let mut session = make_session(&mock);

        session.on_metadata(
            r#"{"event":"chunk","index":0,"start":50.0,"end":55.0,"mimeType":"audio/wav"}"#,
        );
        let replies = session.on_audio(wav_chunk()).await;

        assert_eq!(replies.len(), 2);
        match (&replies[0], &replies[1]) {
            (
                ServerMessage::Subtitle {
                    text: t1, start: s1, ..
                },
                ServerMessage::Subtitle {
                    text: t2, start: s2, ..
                },
            ) => {
                assert_eq!(t1, "first");
                assert_eq!(t2, "second");
                assert!((s1 - 50.0).abs() < 1e-9);
                assert!((s2 - 52.0).abs() < 1e-9);
            }
            other => panic!("Expected two subtitles, got {:?}", other),
        }
    }

    #[test]
    fn test_descriptor_resolve_fills_defaults() {
        let resolved = ChunkDescriptor::default().resolve(12.5);
        assert_eq!(resolved.index, -1);
        assert!((resolved.start - 12.5).abs() < 1e-9);
        assert!((resolved.end - 17.5).abs() < 1e-9);
        assert_eq!(resolved.mime_type, "audio/webm");
    }

    #[test]
    fn test_descriptor_resolve_keeps_declared_fields() {
        let descriptor = ChunkDescriptor {
            index: 4,
            start: Some(30.0),
            end: Some(31.25),
            mime_type: Some("audio/ogg".to_string()),
        };
        let resolved = descriptor.resolve(99.0);
        assert_eq!(resolved.index, 4);
        assert!((resolved.start - 30.0).abs() < 1e-9);
        assert!((resolved.end - 31.25).abs() < 1e-9);
        assert_eq!(resolved.mime_type, "audio/ogg");
        assert!((resolved.duration() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_descriptor_resolve_derives_end_from_declared_start() {
        let descriptor = ChunkDescriptor {
            index: 0,
            start: Some(20.0),
            end: None,
            mime_type: None,
        };
        let resolved = descriptor.resolve(7.0);
        assert!((resolved.start - 20.0).abs() < 1e-9);
        assert!((resolved.end - 25.0).abs() < 1e-9);
    }
}
