//! rayext CLI
//!
//! Installs, updates and removes extensions straight from their source
//! repositories.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use std::io::IsTerminal;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // a subscriber may already be installed when embedded
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let cwd = std::env::current_dir()?;
    let settings = context::load_settings(&cwd, &cli.global, std::io::stdin().is_terminal())?;
    let manager = context::build_manager(settings, cli.global.api_base.as_deref())?;

    match cli.command.unwrap_or(Commands::List) {
        Commands::List => commands::run_list(&manager),
        Commands::View { extensions } => commands::run_view(&manager, &extensions).await,
        Commands::Install { extensions, branch } => {
            commands::run_install(&manager, &extensions, branch.as_deref()).await
        }
        Commands::Uninstall { extensions } => {
            commands::run_uninstall(&manager, &extensions).await
        }
        Commands::Update { extensions } => commands::run_update(&manager, &extensions).await,
    }
}
