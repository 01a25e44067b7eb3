//! # Fast Community CLI
//!
//! Terminal client for the bulletin board: browse posts, read and write
//! comments, and manage the signed-in account.

use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod config;
mod error;
mod state;
mod telemetry;

use cli::Cli;
use config::AppConfig;
use error::CliResult;
use state::AppState;
use telemetry::TelemetryConfig;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    telemetry::init_telemetry(&TelemetryConfig::from_env());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "Command failed");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = AppConfig::from_env()?;
    let state = AppState::new(config).await?;

    commands::run(cli.command, &state).await
}
