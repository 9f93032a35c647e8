//! Model download and installation management.
//!
//! Handles fetching Whisper models from HuggingFace, verifying integrity
//! when a checksum is pinned, and storing them in the user's cache
//! directory. Downloads land in a `.part` file and are renamed into place
//! only once complete, so a killed download never looks installed.

use crate::config::EngineConfig;
use crate::error::{LivesubError, Result};
use crate::models::catalog::{self, ModelInfo};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Get the directory where models are stored.
///
/// Uses `~/.cache/livesub/models/` on Linux/Unix.
pub fn models_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("livesub")
        .join("models")
}

/// Get the full path for a model file within a directory.
///
/// Always returns a path regardless of whether the model is in the catalog;
/// the file may or may not exist on disk.
pub fn model_path_in(dir: &Path, name: &str) -> PathBuf {
    let resolved = catalog::resolve_name(name);
    dir.join(format!("ggml-{resolved}.bin"))
}

/// Get the full path for a model file in the default models directory.
pub fn model_path(name: &str) -> PathBuf {
    model_path_in(&models_dir(), name)
}

/// Check if a model is installed in the default models directory.
pub fn is_model_installed(name: &str) -> bool {
    model_path(name).exists()
}

/// Make sure the configured model exists on disk, downloading if needed.
///
/// A file already present is used as-is, even for names outside the
/// catalog, so locally produced or quantized models work by just dropping
/// them in. Only a missing file requires a catalog entry to fetch from.
pub async fn ensure_model(config: &EngineConfig) -> Result<PathBuf> {
    let dir = config.model_dir.clone().unwrap_or_else(models_dir);
    let path = model_path_in(&dir, &config.model);

    if path.exists() {
        return Ok(path);
    }

    let info = catalog::get_model(&config.model).ok_or_else(|| LivesubError::ModelUnknown {
        name: config.model.clone(),
        valid: catalog::valid_names(),
    })?;

    download_to_path(info, &path).await?;
    Ok(path)
}

/// Download a catalog model into the default models directory.
///
/// Backs the `models install` subcommand. The server startup path goes
/// through [`ensure_model`] instead so a configured `model_dir` is honored.
pub async fn download_model(name: &str) -> Result<PathBuf> {
    let path = model_path(name);

    if path.exists() {
        info!(model = name, path = %path.display(), "model already installed");
        return Ok(path);
    }

    let info = catalog::get_model(name).ok_or_else(|| LivesubError::ModelUnknown {
        name: name.to_string(),
        valid: catalog::valid_names(),
    })?;

    download_to_path(info, &path).await?;
    Ok(path)
}

/// Format a model's catalog entry for display.
pub fn format_model_info(model: &ModelInfo) -> String {
    let status = if is_model_installed(model.name) {
        "[installed]"
    } else {
        "[not installed]"
    };
    format!("{:12} {:5} MB   {}", model.name, model.size_mb, status)
}

/// Core download: fetch the model URL into `output_path`.
async fn download_to_path(info: &ModelInfo, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    info!(
        model = info.name,
        size_mb = info.size_mb,
        url = info.url,
        "downloading model"
    );

    let response = reqwest::Client::new()
        .get(info.url)
        .send()
        .await
        .map_err(|e| LivesubError::ModelDownload {
            message: format!("Failed to start download: {}", e),
        })?;

    if !response.status().is_success() {
        return Err(LivesubError::ModelDownload {
            message: format!("Download failed with status: {}", response.status()),
        });
    }

    // Stream to a .part file, hashing as we go
    let temp_path = output_path.with_extension("bin.part");
    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();
    let mut file = fs::File::create(&temp_path)?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| LivesubError::ModelDownload {
            message: format!("Failed to read download chunk: {}", e),
        })?;
        file.write_all(&chunk)?;
        hasher.update(&chunk);
    }
    drop(file);

    let calculated = format!("{:x}", hasher.finalize());
    if let Err(e) = check_pinned_hash(info.name, info.sha256, &calculated) {
        if let Err(remove_err) = fs::remove_file(&temp_path) {
            warn!(error = %remove_err, "failed to remove corrupted download");
        }
        return Err(e);
    }

    fs::rename(&temp_path, output_path)?;
    info!(path = %output_path.display(), "model installed");
    Ok(())
}

/// Compare a pinned checksum against what was downloaded.
///
/// An empty pin accepts anything.
fn check_pinned_hash(name: &str, expected: &str, actual: &str) -> Result<()> {
    if !expected.is_empty() && expected != actual {
        return Err(LivesubError::ModelChecksum {
            name: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_dir_is_valid_path() {
        let dir = models_dir();
        assert!(dir.to_string_lossy().contains("livesub"));
        assert!(dir.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_model_path_for_valid_model() {
        let path = model_path("small");
        assert!(path.to_string_lossy().ends_with("ggml-small.bin"));
    }

    #[test]
    fn test_model_path_for_unknown_model() {
        let path = model_path("nonexistent");
        assert!(path.to_string_lossy().ends_with("ggml-nonexistent.bin"));
    }

    #[test]
    fn test_model_path_resolves_alias() {
        let path = model_path("large");
        let path_str = path.to_string_lossy();
        assert!(
            path_str.contains("large-v3"),
            "model_path(\"large\") should resolve to large-v3, got: {}",
            path_str
        );
    }

    #[test]
    fn test_is_model_installed_returns_false_for_invalid_model() {
        assert!(!is_model_installed("nonexistent_model_xyz"));
    }

    #[test]
    fn test_model_path_filename_format() {
        for model in catalog::list_models() {
            let path = model_path(model.name);
            let filename = path.file_name().unwrap().to_string_lossy().to_string();
            assert!(
                filename.starts_with("ggml-"),
                "Model {} filename should start with 'ggml-': {}",
                model.name,
                filename
            );
            assert!(
                filename.ends_with(".bin"),
                "Model {} filename should end with '.bin': {}",
                model.name,
                filename
            );
        }
    }

    #[tokio::test]
    async fn test_ensure_model_uses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let model_file = dir.path().join("ggml-small.bin");
        fs::write(&model_file, b"fake model data").unwrap();

        let config = EngineConfig {
            model: "small".to_string(),
            model_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };

        let path = ensure_model(&config).await.unwrap();
        assert_eq!(path, model_file);
    }

    #[tokio::test]
    async fn test_ensure_model_accepts_non_catalog_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let model_file = dir.path().join("ggml-small-he-q5.bin");
        fs::write(&model_file, b"fake model data").unwrap();

        let config = EngineConfig {
            model: "small-he-q5".to_string(),
            model_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };

        let path = ensure_model(&config).await.unwrap();
        assert_eq!(path, model_file);
    }

    #[tokio::test]
    async fn test_ensure_model_rejects_unknown_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            model: "imaginary-model".to_string(),
            model_dir: Some(dir.path().to_path_buf()),
            ..EngineConfig::default()
        };

        let result = ensure_model(&config).await;
        match result {
            Err(LivesubError::ModelUnknown { name, valid }) => {
                assert_eq!(name, "imaginary-model");
                assert!(valid.contains("small"));
            }
            other => panic!("Expected ModelUnknown, got {:?}", other),
        }
    }

    #[test]
    fn test_check_pinned_hash_empty_pin_accepts_anything() {
        assert!(check_pinned_hash("small", "", "whatever").is_ok());
    }

    #[test]
    fn test_check_pinned_hash_match() {
        let digest = format!("{:x}", Sha256::digest(b"hello"));
        assert!(check_pinned_hash("small", &digest, &digest).is_ok());
    }

    #[test]
    fn test_check_pinned_hash_mismatch() {
        let result = check_pinned_hash("small", "aaaa", "bbbb");
        match result {
            Err(LivesubError::ModelChecksum {
                name,
                expected,
                actual,
            }) => {
                assert_eq!(name, "small");
                assert_eq!(expected, "aaaa");
                assert_eq!(actual, "bbbb");
            }
            other => panic!("Expected ModelChecksum, got {:?}", other),
        }
    }

    #[test]
    fn test_format_model_info_shows_name_and_size() {
        let model = catalog::get_model("small").unwrap();
        let formatted = format_model_info(model);
        assert!(formatted.contains("small"));
        assert!(formatted.contains("MB"));
        assert!(formatted.contains("installed"));
    }

    #[tokio::test]
    async fn test_download_model_rejects_unknown_name() {
        let result = download_model("imaginary-model").await;
        match result {
            Err(LivesubError::ModelUnknown { name, .. }) => {
                assert_eq!(name, "imaginary-model");
            }
            other => panic!("Expected ModelUnknown, got {:?}", other),
        }
    }

    #[test]
    fn test_sha256_hex_format() {
        // The hex format used for checksum comparison is lowercase, unpadded
        let digest = format!("{:x}", Sha256::digest(b"hello"));
        assert_eq!(
            digest,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
