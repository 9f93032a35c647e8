//! JSON message protocol for the subtitle WebSocket stream.
//!
//! Inbound traffic alternates between a text frame carrying chunk metadata
//! and a binary frame carrying the audio it describes. Every outbound frame
//! is a single JSON object tagged by `event`.

use serde::{Deserialize, Serialize, Serializer};

fn default_index() -> i64 {
    -1
}

/// Messages sent by the client (browser extension).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Metadata describing the next binary audio frame.
    ///
    /// Every field is optional: `index` defaults to -1, `start`/`end` are
    /// resolved against the connection's stream clock when absent, and
    /// `mime_type` falls back to the recorder's default container.
    Chunk {
        /// Caller-assigned sequence number, echoed in the ack. Never validated.
        #[serde(default = "default_index")]
        index: i64,
        /// Claimed position of this chunk within the recording, in seconds.
        #[serde(default)]
        start: Option<f64>,
        #[serde(default)]
        end: Option<f64>,
        /// Container type of the next binary frame.
        #[serde(rename = "mimeType", default)]
        mime_type: Option<String>,
    },
}

impl ClientMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Messages sent back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Metadata accepted. Echoes the descriptor's index and is always sent
    /// before any processing of the audio frame it describes.
    Ack { index: i64 },
    /// One translated phrase, timed in global stream seconds.
    Subtitle {
        text: String,
        #[serde(serialize_with = "round2")]
        start: f64,
        #[serde(serialize_with = "round2")]
        end: f64,
    },
    /// Protocol, decode, or engine failure. The connection stays open.
    Error { message: String },
}

impl ServerMessage {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Round to 2 decimal places on the wire only.
///
/// Internal timestamps keep full precision so rounding error never compounds
/// across chunks; clients see centisecond resolution, which is finer than
/// subtitle rendering needs.
fn round2<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}
