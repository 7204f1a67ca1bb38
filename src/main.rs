//! CLI entry point for qbremote.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use qbremote_core::{
    OrchestratorOptions, RequestOrchestrator, ServerId, ServerRegistry, load_servers_file,
    resolve_default_config_path,
};
use tracing::debug;

mod cli;
mod commands;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries command output only.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let config_path = match args.config {
        Some(path) => path,
        None => resolve_default_config_path()
            .context("cannot locate the server file: set XDG_CONFIG_HOME or HOME, or pass --config")?,
    };
    let servers = load_servers_file(&config_path)
        .with_context(|| format!("failed to load servers from {}", config_path.display()))?;
    let registry = Arc::new(
        ServerRegistry::from_configs(servers).context("invalid server configuration")?,
    );
    let orchestrator = RequestOrchestrator::attach(&registry, OrchestratorOptions::default());

    match args.command {
        Command::Servers => commands::run_servers_command(&registry),
        Command::Login { server } => {
            commands::run_login_command(&orchestrator, ServerId::new(server)).await?;
        }
        Command::Version(version_args) => match version_args.server {
            Some(server) if !version_args.all => {
                commands::run_version_command(&orchestrator, ServerId::new(server)).await?;
            }
            _ => commands::run_version_all_command(&orchestrator, &registry).await?,
        },
        Command::Get {
            server,
            path,
            params,
        } => {
            commands::run_get_command(&orchestrator, ServerId::new(server), &path, &params).await?;
        }
        Command::Post {
            server,
            path,
            fields,
        } => {
            commands::run_post_command(&orchestrator, ServerId::new(server), &path, &fields)
                .await?;
        }
    }

    Ok(())
}
