//! Server configuration: TOML file, environment, defaults.
//!
//! Precedence is handled by the caller (CLI flags beat environment beats
//! file beats defaults); this module owns the file format and the
//! `LIVESUB_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::defaults;
use crate::error::{LivesubError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
}

/// HTTP and WebSocket listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on, e.g. "127.0.0.1:8000"
    pub bind: String,
}

/// Translation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine backend name; "whisper" is the only one today
    pub backend: String,
    /// Model name from the catalog, e.g. "small"
    pub model: String,
    /// Where model files live; defaults to the user cache dir
    pub model_dir: Option<PathBuf>,
    /// Source language code, or "auto" for detection
    pub language: String,
    /// GPU offload selection
    pub gpu: GpuMode,
    /// Maximum chunks translated concurrently
    pub workers: usize,
}

/// GPU offload selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GpuMode {
    /// Use the GPU when this build has a GPU backend compiled in
    #[default]
    Auto,
    #[serde(alias = "true")]
    On,
    #[serde(alias = "false")]
    Off,
}

impl GpuMode {
    /// Whether inference should run on the GPU under this mode.
    pub fn enabled(self) -> bool {
        match self {
            GpuMode::Auto => defaults::gpu_available(),
            GpuMode::On => true,
            GpuMode::Off => false,
        }
    }
}

impl FromStr for GpuMode {
    type Err = LivesubError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(GpuMode::Auto),
            "on" | "true" | "1" => Ok(GpuMode::On),
            "off" | "false" | "0" => Ok(GpuMode::Off),
            other => Err(LivesubError::ConfigInvalidValue {
                key: "engine.gpu".to_string(),
                message: format!("'{}' is not one of auto, on, off", other),
            }),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::DEFAULT_BIND.to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: defaults::DEFAULT_BACKEND.to_string(),
            model: defaults::DEFAULT_MODEL.to_string(),
            model_dir: None,
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            gpu: GpuMode::Auto,
            workers: defaults::DEFAULT_WORKERS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields use default values.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LivesubError::ConfigFileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if it doesn't exist
    ///
    /// Only a missing file falls back to defaults; invalid TOML is still a
    /// startup error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LIVESUB_BACKEND → engine.backend
    /// - LIVESUB_MODEL → engine.model
    /// - LIVESUB_LANGUAGE → engine.language
    /// - LIVESUB_GPU → engine.gpu (auto/on/off, true/false accepted)
    /// - LIVESUB_BIND → server.bind
    ///
    /// Empty values are ignored. An unparseable LIVESUB_GPU is a startup
    /// error rather than a silent fallback.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(backend) = std::env::var("LIVESUB_BACKEND")
            && !backend.is_empty()
        {
            self.engine.backend = backend;
        }

        if let Ok(model) = std::env::var("LIVESUB_MODEL")
            && !model.is_empty()
        {
            self.engine.model = model;
        }

        if let Ok(language) = std::env::var("LIVESUB_LANGUAGE")
            && !language.is_empty()
        {
            self.engine.language = language;
        }

        if let Ok(gpu) = std::env::var("LIVESUB_GPU")
            && !gpu.is_empty()
        {
            self.engine.gpu = gpu.parse()?;
        }

        if let Ok(bind) = std::env::var("LIVESUB_BIND")
            && !bind.is_empty()
        {
            self.server.bind = bind;
        }

        Ok(self)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/livesub/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("livesub")
            .join("config.toml")
    }
}
