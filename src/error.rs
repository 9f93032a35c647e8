//! Error types for livesub.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LivesubError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Protocol errors
    //
    // The Display string is sent verbatim to the client in an `error` event,
    // so it deliberately names the payload problem, not an internal module.
    #[error("Bad JSON: {message}")]
    BadMetadata { message: String },

    // Audio decoding errors
    #[error("Audio chunk too small to decode ({size} bytes)")]
    ChunkTooSmall { size: usize },

    #[error("Audio decode failed: {message}")]
    AudioDecode { message: String },

    // Engine errors
    #[error("Translation model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Translation engine failed to load: {message}")]
    EngineLoad { message: String },

    #[error("Translation failed: {message}")]
    EngineInference { message: String },

    #[error("Unknown engine backend '{backend}' (valid: whisper)")]
    BackendUnknown { backend: String },

    // Model management errors
    #[error("Unknown model '{name}' (valid: {valid})")]
    ModelUnknown { name: String, valid: String },

    #[error("Model checksum mismatch for {name}: expected {expected}, got {actual}")]
    ModelChecksum {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Model download failed: {message}")]
    ModelDownload { message: String },

    // Server errors
    #[error("Failed to bind {addr}: {message}")]
    ServerBind { addr: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LivesubError>;
