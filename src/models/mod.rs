//! Whisper model management.

pub mod catalog;
pub mod download;

pub use catalog::{ModelInfo, get_model, list_models};
pub use download::{
    download_model, ensure_model, format_model_info, is_model_installed, model_path, models_dir,
};
