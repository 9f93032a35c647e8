//! Whisper model metadata catalog.
//!
//! Only multilingual models are listed: the translate task needs them, and
//! the `.en` checkpoints can only transcribe English.

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "tiny", "small", "large-v3")
    pub name: &'static str,
    /// Model size in megabytes
    pub size_mb: u32,
    /// SHA-256 checksum; empty means no pin, download is accepted as-is
    pub sha256: &'static str,
    /// Download URL from HuggingFace
    pub url: &'static str,
}

/// Catalog of available Whisper models.
///
/// Models range from tiny (75 MB, fast, rough) to large-v3 (3095 MB, slow,
/// best quality); large-v3-turbo trades a little accuracy for large-v3 at
/// half the size. "small" is the smallest with usable translation output.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        size_mb: 75,
        sha256: "",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-tiny.bin",
    },
    ModelInfo {
        name: "base",
        size_mb: 142,
        sha256: "",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-base.bin",
    },
    ModelInfo {
        name: "small",
        size_mb: 466,
        sha256: "",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin",
    },
    ModelInfo {
        name: "medium",
        size_mb: 1533,
        sha256: "",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-medium.bin",
    },
    ModelInfo {
        name: "large-v3",
        size_mb: 3095,
        sha256: "",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3.bin",
    },
    ModelInfo {
        name: "large-v3-turbo",
        size_mb: 1620,
        sha256: "",
        url: "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-large-v3-turbo.bin",
    },
];

/// Resolve convenience aliases to canonical catalog names.
///
/// "large" means the current large generation; everything else passes
/// through unchanged.
pub fn resolve_name(name: &str) -> &str {
    match name {
        "large" => "large-v3",
        other => other,
    }
}

/// Find a model by name (aliases resolved).
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    let resolved = resolve_name(name);
    MODELS.iter().find(|m| m.name == resolved)
}

/// Get all available models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}

/// Comma-separated catalog names for error messages.
pub fn valid_names() -> String {
    MODELS
        .iter()
        .map(|m| m.name)
        .collect::<Vec<_>>()
        .join(", ")
}
