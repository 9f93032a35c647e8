//! Command-line interface for livesub
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live speech-translation subtitle server
#[derive(Parser, Debug)]
#[command(
    name = "livesub",
    version,
    about = "Live speech-translation subtitles for streamed browser audio"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress log output below warnings
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: per-chunk detail, -vv: protocol traces)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Address to listen on (default: 127.0.0.1:8000)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Whisper model (default: small). English-only variants cannot translate
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Spoken language of the incoming audio (default: he). Use auto to detect
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// GPU usage: auto, on, off
    #[arg(long, value_name = "MODE")]
    pub gpu: Option<String>,

    /// Maximum chunks translated concurrently across all clients
    #[arg(long, short = 'w', value_name = "N")]
    pub workers: Option<usize>,

    /// Prevent automatic model download if the configured model is missing
    #[arg(long)]
    pub no_download: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage Whisper models
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List available models
    List,
    /// Download and install a model
    Install {
        /// Model name (e.g., small, medium, large-v3)
        name: String,
    },
}
