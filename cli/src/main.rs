//! # omega CLI
//!
//! Command-line interface for Omega - manage the generation parameters of a
//! model, apply task presets, run generations and training passes.
//!
//! ## Usage
//!
//! - `omega params show` - Print the live parameters
//! - `omega params set temperature=0.9 top_k=20` - Update and persist parameters
//! - `omega preset code` - Apply a task preset
//! - `omega generate "prompt"` - Generate text with the live parameters
//! - `omega train --file corpus.txt --epochs 3` - Run a training pass
//! - `omega status` - Show the session status

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{
    generate_command, history_command, params_command, preset_command, presets_command,
    status_command, train_command, ParamsAction,
};
use crate::config::SettingsLoader;

/// omega - generation parameter and session manager
#[derive(Parser)]
#[command(name = "omega")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage generation parameters, presets and training runs for a model")]
#[command(long_about = None)]
struct Cli {
    /// Settings file or directory path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Model artifact path override
    #[arg(long, global = true)]
    model: Option<PathBuf>,

    /// Parameter store directory override
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show, update or reset the live parameters
    Params {
        #[command(subcommand)]
        action: ParamsAction,
    },

    /// List the available task presets
    Presets,

    /// Apply a task preset (creative, factual, code)
    Preset {
        /// Preset name
        name: String,
    },

    /// Generate text for a prompt
    Generate {
        /// Prompt text
        prompt: String,

        /// Per-call parameter override, KEY=VALUE (repeatable, not persisted)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        overrides: Vec<String>,
    },

    /// Train over a corpus file, one item per line
    Train {
        /// Corpus file path
        #[arg(short, long)]
        file: PathBuf,

        /// Number of epochs (defaults to the configured value)
        #[arg(short, long)]
        epochs: Option<usize>,
    },

    /// Show superseded parameter records
    History,

    /// Show session status
    Status,
}

/// Build a settings loader from CLI arguments
fn build_settings_loader(cli: &Cli) -> SettingsLoader {
    let mut loader = SettingsLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(store_dir) = &cli.store_dir {
        loader = loader.with_store_dir_override(store_dir.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = build_settings_loader(&cli).load()?;

    // Initialize tracing
    let filter = if cli.verbose {
        "debug"
    } else {
        settings.log_level.as_str()
    };
    omega_core::init_tracing(filter);

    match cli.command {
        Commands::Params { action } => params_command(&settings, action).await,
        Commands::Presets => presets_command().await,
        Commands::Preset { name } => preset_command(&settings, &name).await,
        Commands::Generate { prompt, overrides } => {
            generate_command(&settings, &prompt, &overrides).await
        }
        Commands::Train { file, epochs } => train_command(&settings, &file, epochs).await,
        Commands::History => history_command(&settings).await,
        Commands::Status => status_command(&settings).await,
    }
}
