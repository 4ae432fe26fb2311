//! Stash CLI - keep an offline mirror of saved posts

mod cli;
mod commands;
mod config;
mod credentials;
mod error;


use clap::Parser;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::auth::run_auth;
use crate::commands::common::resolve_db_path;
use crate::commands::config::run_config;
use crate::commands::list::run_list;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::commands::thread::run_thread;
use crate::config::CliConfig;
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

    let directive = "stash=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync { target } => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let db_path = resolve_db_path(cli.db_path, &config)?;
            run_sync(target, &config, &db_path).await
        }
        Commands::List {
            platform,
            limit,
            page,
            json,
        } => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let db_path = resolve_db_path(cli.db_path, &config)?;
            run_list(platform.into(), limit, page, json, &db_path).await
        }
        Commands::Thread {
            platform,
            conversation_id,
            json,
        } => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let db_path = resolve_db_path(cli.db_path, &config)?;
            run_thread(platform.into(), &conversation_id, json, &db_path).await
        }
        Commands::Auth { command } => run_auth(command),
        Commands::Config { command } => run_config(command),
        Commands::Status { runs, json } => {
            let config = CliConfig::load().map_err(CliError::Config)?;
            let db_path = resolve_db_path(cli.db_path, &config)?;
            run_status(runs, json, &db_path).await
        }
    }
}
