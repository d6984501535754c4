//! Godspeed CLI - plugin integration manager
//!
//! Installs, removes and upgrades Godspeed plugins in a project and keeps the
//! generated datasource and eventsource files in step with them.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod theme;

use commands::plugin;

/// Godspeed - plugin integration manager
#[derive(Parser)]
#[command(name = "godspeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage project plugins
    Plugin {
        #[command(subcommand)]
        command: PluginCommands,
    },
}

#[derive(Subcommand)]
enum PluginCommands {
    /// Install plugins and generate their datasource/eventsource files
    Add {
        /// Plugin package name (prompts for a selection when omitted)
        identity: Option<String>,
    },
    /// Remove generated files and uninstall plugins
    Remove {
        /// Plugin package name (prompts for a selection when omitted)
        identity: Option<String>,
    },
    /// Upgrade plugins, regenerating files whose contract changed
    Update {
        /// Plugin package name (prompts for a selection when omitted)
        identity: Option<String>,
    },
    /// List catalog plugins and their installed versions
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let project_root = match cli.project {
        Some(dir) => dir,
        None => std::env::current_dir().context("failed to get current directory")?,
    };

    // Set up logging from config, with --verbose override.
    let loaded = godspeed_config::Config::load(Some(&project_root));
    let log_config = match &loaded {
        Ok(l) => config_bridge::to_log_config(&l.config, cli.verbose),
        Err(_) => config_bridge::fallback_log_config(cli.verbose),
    };
    if let Err(e) = godspeed_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let loaded = loaded.context("failed to load configuration")?;
    for file in &loaded.loaded_files {
        tracing::debug!(path = %file, "using config file");
    }

    match cli.command {
        Commands::Plugin { command } => {
            handle_plugin(command, &loaded.config, &project_root).await?;
        },
    }

    Ok(())
}

async fn handle_plugin(
    command: PluginCommands,
    cfg: &godspeed_config::Config,
    project_root: &std::path::Path,
) -> Result<()> {
    let manager = plugin::build_manager(cfg, project_root)?;
    match command {
        PluginCommands::Add { identity } => {
            plugin::add_plugins(&manager, identity.as_deref()).await
        },
        PluginCommands::Remove { identity } => {
            plugin::remove_plugins(&manager, identity.as_deref()).await
        },
        PluginCommands::Update { identity } => {
            plugin::update_plugins(&manager, identity.as_deref()).await
        },
        PluginCommands::List => plugin::list_plugins(&manager),
    }
}
