//! Per-connection state: the stream clock and chunk orchestration.

pub mod clock;
pub mod orchestrator;

pub use clock::StreamClock;
pub use orchestrator::{ChunkDescriptor, ResolvedChunk, Session};
