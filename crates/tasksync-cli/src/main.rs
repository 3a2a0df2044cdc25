//! tasksync CLI - pull and push tasks between a local and a hosted store
//!
//! Storage contexts come from `cli-config.json`; sync bookkeeping lives in
//! `sync-state.json` and `sync-conflicts.json` next to it.

mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::Parser;
use tasksync_core::SyncDirection;

use crate::cli::{Cli, Commands};
use crate::commands::common::CommandContext;
use crate::commands::completions::run_completions;
use crate::commands::conflicts::run_conflicts;
use crate::commands::reset::run_reset;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tasksync=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Completions { shell, output } = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let context = CommandContext::load(
        cli.config.as_deref(),
        cli.state_dir.as_deref(),
        cli.local.as_deref(),
        cli.remote.as_deref(),
    )?;

    match cli.command {
        Commands::Pull(args) => run_sync(&context, SyncDirection::Pull, args).await?,
        Commands::Push(args) => run_sync(&context, SyncDirection::Push, args).await?,
        Commands::Status { json } => run_status(&context, json)?,
        Commands::Reset {
            source,
            target,
            direction,
        } => run_reset(&context, &source, &target, direction.into())?,
        Commands::Conflicts { limit, json } => run_conflicts(&context, limit, json)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}
