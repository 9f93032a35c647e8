//! Audio decoding for inbound chunks.
//!
//! Browsers send whatever container MediaRecorder picked; everything is
//! normalized here to the mono 16kHz PCM the translation engine expects.

pub mod decode;

pub use decode::decode_chunk;
