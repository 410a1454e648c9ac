//! Tap Logger CLI - one-tap habit logging from the terminal
//!
//! Taps are saved locally at once and synced to Supabase in the background.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::Workspace;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::export::run_export;
use crate::commands::interactive::run_interactive;
use crate::commands::list::run_list;
use crate::commands::note::run_note;
use crate::commands::sync::run_sync;
use crate::commands::tap::run_tap;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "taplog=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Some(Commands::Completions { shell, output }) => run_completions(shell, output.as_deref()),
        Some(Commands::Config { command }) => run_config(command, profile),
        Some(Commands::Auth { command }) => run_auth(command, profile, cli.cache_path).await,
        command => {
            let workspace = Workspace::open(profile, cli.cache_path).await?;
            run_log_command(command, workspace).await
        }
    }
}

async fn run_log_command(command: Option<Commands>, workspace: Workspace) -> Result<(), CliError> {
    match command {
        Some(Commands::Tap { category, note }) => {
            run_tap(category, note.as_deref(), workspace).await
        }
        Some(Commands::Note { text }) => run_note(&text, workspace).await,
        Some(Commands::List { limit, json }) => run_list(limit, json, workspace).await,
        Some(Commands::Delete { id }) => run_delete(&id, workspace).await,
        Some(Commands::Sync) => run_sync(workspace).await,
        Some(Commands::Export { output }) => run_export(output.as_deref(), workspace).await,
        Some(Commands::Interactive) | None => run_interactive(workspace).await,
        Some(Commands::Completions { .. } | Commands::Config { .. } | Commands::Auth { .. }) => {
            workspace.finish().await;
            Ok(())
        }
    }
}
