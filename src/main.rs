use anyhow::Result;
use clap::Parser;
use livesub::cli::{Cli, Commands, ModelsAction};
use livesub::config::Config;
use livesub::engine::build_engine;
use livesub::engine::pool::TranslatePool;
use livesub::models::download::model_path_in;
use livesub::models::{download_model, ensure_model, format_model_info, list_models, models_dir};
use livesub::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    match cli.command {
        None => {
            run_server(&cli).await?;
        }
        Some(Commands::Models { action }) => {
            handle_models_command(action).await?;
        }
    }

    Ok(())
}

/// Route log output through tracing, honoring `RUST_LOG` when set.
fn init_logging(quiet: bool, verbose: u8) {
    let default_level = if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

/// Load configuration and apply overrides.
///
/// Priority order (highest wins):
/// 1. CLI flags (--bind, --model, --language, --gpu, --workers)
/// 2. Environment variables (LIVESUB_*)
/// 3. Config file (--config, or ~/.config/livesub/config.toml)
/// 4. Built-in defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(path) = cli.config.as_deref() {
        // Load from custom path; a missing file here is an error
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    let mut config = config.with_env_overrides()?;

    if let Some(bind) = &cli.bind {
        config.server.bind = bind.clone();
    }
    if let Some(model) = &cli.model {
        config.engine.model = model.clone();
    }
    if let Some(language) = &cli.language {
        config.engine.language = language.clone();
    }
    if let Some(gpu) = &cli.gpu {
        config.engine.gpu = gpu.parse()?;
    }
    if let Some(workers) = cli.workers {
        config.engine.workers = workers;
    }

    Ok(config)
}

/// Resolve the model file, load the engine, and serve until Ctrl+C.
async fn run_server(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;

    let model_path = if cli.no_download {
        let dir = config.engine.model_dir.clone().unwrap_or_else(models_dir);
        let path = model_path_in(&dir, &config.engine.model);
        if !path.exists() {
            eprintln!(
                "Model '{}' is not installed (--no-download)",
                config.engine.model
            );
            eprintln!(
                "Install it with: livesub models install {}",
                config.engine.model
            );
            std::process::exit(1);
        }
        path
    } else {
        ensure_model(&config.engine).await?
    };

    let engine = build_engine(&config.engine, &model_path)?;
    let pool = TranslatePool::new(engine, config.engine.workers);

    server::serve(&config.server.bind, AppState::new(pool)).await?;
    Ok(())
}

/// Handle model management commands.
async fn handle_models_command(action: ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => {
            println!("Available models:");
            for model in list_models() {
                println!("  {}", format_model_info(model));
            }
        }
        ModelsAction::Install { name } => {
            let path = download_model(&name).await?;
            println!("Model '{}' installed successfully", name);
            println!("Location: {}", path.display());
        }
    }
    Ok(())
}
